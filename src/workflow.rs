use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::encoding::normalize;
use crate::error::{DualSubError, Result};
use crate::language::{language_name, parse_lang_code};
use crate::merge::{merge, MergeOptions, MergeResult};
use crate::source::{
    rank_candidates, Candidate, ContentQuery, LocalFileSource, OpenSubtitlesSource, SourceEntry,
    SubtitleSource,
};
use crate::store::{MemoryStore, MergeKey, ResultStore};

/// A request for bilingual subtitles of one title
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub query: ContentQuery,
    /// Source language code of the main text, e.g. `eng`
    pub primary_language: String,
    /// Source language code of the italic translation line
    pub secondary_language: String,
    /// Overrides `merge.max_outputs` when set
    pub max_outputs: Option<usize>,
}

impl FetchRequest {
    /// Build a request from language selectors such as `"English [eng]"` or plain codes
    pub fn new(query: ContentQuery, primary: &str, secondary: &str) -> Self {
        Self {
            query,
            primary_language: parse_lang_code(primary),
            secondary_language: parse_lang_code(secondary),
            max_outputs: None,
        }
    }

    pub fn merge_key(&self, version: usize) -> MergeKey {
        MergeKey::new(&self.query, &self.primary_language, &self.secondary_language, version)
    }
}

pub struct Workflow {
    config: Config,
    source: Box<dyn SubtitleSource>,
    store: MemoryStore,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let source = OpenSubtitlesSource::new(config.source.clone())?;
        Self::with_source(config, Box::new(source))
    }

    /// Use a custom subtitle source instead of the OpenSubtitles API
    pub fn with_source(config: Config, source: Box<dyn SubtitleSource>) -> Result<Self> {
        config.validate()?;
        let store = MemoryStore::new(Duration::from_secs(config.store.ttl_secs));

        Ok(Self {
            config,
            source,
            store,
        })
    }

    fn merge_options(&self, max_outputs: Option<usize>) -> MergeOptions {
        MergeOptions {
            threshold_ms: self.config.merge.threshold_ms,
            max_outputs: max_outputs.unwrap_or(self.config.merge.max_outputs),
        }
    }

    /// Look up a title, merge the best files and keep the results in the store
    pub async fn fetch_merged(&self, request: &FetchRequest) -> Result<Vec<MergeResult>> {
        if request.primary_language == request.secondary_language {
            return Err(DualSubError::SameLanguage(request.primary_language.clone()));
        }

        info!(
            "Fetching {} + {} subtitles for tt{}",
            language_name(&request.primary_language),
            language_name(&request.secondary_language),
            request.query.content_id
        );

        let Some(entries) = self.source.list_candidates(&request.query).await else {
            warn!("No subtitles listed for tt{}", request.query.content_id);
            return Ok(Vec::new());
        };

        let primary = rank_candidates(&entries, &request.primary_language);
        let secondary = rank_candidates(&entries, &request.secondary_language);
        info!(
            "{} {} and {} {} candidates",
            primary.len(),
            request.primary_language,
            secondary.len(),
            request.secondary_language
        );
        if primary.is_empty() || secondary.is_empty() {
            return Ok(Vec::new());
        }

        let options = self.merge_options(request.max_outputs);
        let results = merge(&primary, &secondary, self.source.as_ref(), &options).await;

        for result in &results {
            let key = request.merge_key(result.version);
            self.store.put(&key.to_string(), result.srt.clone());
        }

        info!("Produced {} merged version(s)", results.len());
        Ok(results)
    }

    /// Merge one specific pair of listed files, identified by source id.
    ///
    /// An id that is not in the listing falls back to the best ranked file
    /// in that language. The result is not stored.
    pub async fn regenerate(
        &self,
        request: &FetchRequest,
        primary_id: &str,
        secondary_id: &str,
    ) -> Result<Option<MergeResult>> {
        if request.primary_language == request.secondary_language {
            return Err(DualSubError::SameLanguage(request.primary_language.clone()));
        }

        let Some(entries) = self.source.list_candidates(&request.query).await else {
            warn!("No subtitles listed for tt{}", request.query.content_id);
            return Ok(None);
        };

        let primary = pick_candidate(&entries, primary_id, &request.primary_language);
        let secondary = pick_candidate(&entries, secondary_id, &request.secondary_language);
        let (Some(primary), Some(secondary)) = (primary, secondary) else {
            warn!("No {} + {} pair available", request.primary_language, request.secondary_language);
            return Ok(None);
        };

        info!("Regenerating {} with {}", primary.source_id, secondary.source_id);
        let result = merge(&[primary], &[secondary], self.source.as_ref(), &self.merge_options(Some(1)))
            .await
            .into_iter()
            .next();
        Ok(result)
    }

    /// Write each result as `{merge key}.srt` into `output_dir`
    pub async fn write_results<P: AsRef<Path>>(
        &self,
        results: &[MergeResult],
        request: &FetchRequest,
        output_dir: P,
    ) -> Result<Vec<PathBuf>> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir).await?;

        let mut paths = Vec::with_capacity(results.len());
        for result in results {
            let path = output_dir.join(format!("{}.srt", request.merge_key(result.version)));
            fs::write(&path, &result.srt).await?;
            info!("Saved {} to {}", result.id, path.display());
            paths.push(path);
        }

        Ok(paths)
    }

    /// Merge two subtitle files from disk into `output`
    pub async fn merge_files<P: AsRef<Path>>(
        &self,
        primary_path: P,
        secondary_path: P,
        primary_language: &str,
        secondary_language: &str,
        output: P,
    ) -> Result<MergeResult> {
        let primary_path = primary_path.as_ref();
        let secondary_path = secondary_path.as_ref();
        let output = output.as_ref();

        for path in [primary_path, secondary_path] {
            if !path.exists() {
                return Err(DualSubError::FileNotFound(path.display().to_string()));
            }
        }

        info!(
            "Merging {} with {}",
            primary_path.display(),
            secondary_path.display()
        );

        let source = LocalFileSource::new(self.config.source.max_response_bytes);
        let primary = [LocalFileSource::candidate(primary_path, &parse_lang_code(primary_language))];
        let secondary = [LocalFileSource::candidate(secondary_path, &parse_lang_code(secondary_language))];

        let result = merge(&primary, &secondary, &source, &self.merge_options(Some(1)))
            .await
            .into_iter()
            .next()
            .ok_or_else(|| {
                DualSubError::NoResult(format!(
                    "{} and {} did not yield any cues",
                    primary_path.display(),
                    secondary_path.display()
                ))
            })?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(output, &result.srt).await?;
        info!("Merged subtitles written to {}", output.display());

        Ok(result)
    }

    /// Re-encode a subtitle file of unknown encoding as UTF-8
    pub async fn decode_file<P: AsRef<Path>>(
        &self,
        input: P,
        language_hint: Option<&str>,
        output: P,
    ) -> Result<()> {
        let input = input.as_ref();
        let output = output.as_ref();

        if !input.exists() {
            return Err(DualSubError::FileNotFound(input.display().to_string()));
        }

        let bytes = fs::read(input).await?;
        let hint = language_hint.map(parse_lang_code);
        let text = normalize(&bytes, hint.as_deref());
        fs::write(output, text).await?;

        info!("Decoded {} to {}", input.display(), output.display());
        Ok(())
    }

    /// Previously merged SRT text for a rendered merge key
    pub fn cached(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }
}

/// The listed entry with `id`, else the best ranked one in `language`
fn pick_candidate(entries: &[SourceEntry], id: &str, language: &str) -> Option<Candidate> {
    if let Some(entry) = entries.iter().find(|entry| entry.id == id) {
        return Some(Candidate::from(entry));
    }
    warn!("Subtitle {} is not listed, using the best {} file", id, language);
    rank_candidates(entries, language).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ContentKind, MockSubtitleSource};
    use assert_fs::prelude::*;
    use std::collections::HashMap;

    const HELLO: &str = "1\n00:00:01,000 --> 00:00:03,000\nHello\n";
    const MERHABA: &str = "1\n00:00:01,200 --> 00:00:03,100\nMerhaba\n";
    const SELAM: &str = "1\n00:00:00,900 --> 00:00:02,800\nSelam\n";

    fn entry(id: &str, lang: &str, downloads: u64) -> SourceEntry {
        SourceEntry {
            id: id.to_string(),
            url: format!("https://subs.test/{}.srt", id),
            lang: lang.to_string(),
            downloads: Some(downloads),
        }
    }

    fn mock_source(entries: Option<Vec<SourceEntry>>, bodies: &[(&str, &str)]) -> MockSubtitleSource {
        let bodies: HashMap<String, Vec<u8>> = bodies
            .iter()
            .map(|(id, body)| (format!("https://subs.test/{}.srt", id), body.as_bytes().to_vec()))
            .collect();

        let mut source = MockSubtitleSource::new();
        source
            .expect_list_candidates()
            .returning(move |_| entries.clone());
        source
            .expect_fetch_raw()
            .returning(move |url| bodies.get(url).cloned());
        source
    }

    fn request() -> FetchRequest {
        let query = ContentQuery::parse_id("tt0111161", ContentKind::Movie, None, None).unwrap();
        FetchRequest::new(query, "English [eng]", "Turkish [tur]")
    }

    #[tokio::test]
    async fn test_same_language_is_rejected() {
        let workflow = Workflow::with_source(Config::default(), Box::new(MockSubtitleSource::new())).unwrap();
        let query = ContentQuery::parse_id("tt1", ContentKind::Movie, None, None).unwrap();
        let request = FetchRequest::new(query, "English [eng]", "eng");

        let err = workflow.fetch_merged(&request).await.unwrap_err();
        assert!(matches!(err, DualSubError::SameLanguage(code) if code == "eng"));
    }

    #[tokio::test]
    async fn test_fetch_merged_stores_results() {
        let source = mock_source(
            Some(vec![entry("en", "eng", 10), entry("tr", "tur", 5)]),
            &[("en", HELLO), ("tr", MERHABA)],
        );
        let workflow = Workflow::with_source(Config::default(), Box::new(source)).unwrap();

        let results = workflow.fetch_merged(&request()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "dual-en-tr-v1");
        assert_eq!(results[0].cues[0].text, "Hello\n<i>Merhaba</i>");

        let cached = workflow.cached("0111161___eng_tur_v1");
        assert_eq!(cached.as_deref(), Some(results[0].srt.as_str()));
    }

    #[tokio::test]
    async fn test_request_cap_overrides_config() {
        let source = mock_source(
            Some(vec![
                entry("en", "eng", 10),
                entry("tr1", "tur", 5),
                entry("tr2", "tur", 4),
            ]),
            &[("en", HELLO), ("tr1", MERHABA), ("tr2", MERHABA)],
        );
        let workflow = Workflow::with_source(Config::default(), Box::new(source)).unwrap();

        let mut request = request();
        request.max_outputs = Some(1);
        let results = workflow.fetch_merged(&request).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(workflow.cached("0111161___eng_tur_v2"), None);
    }

    fn listing_with_two_translations() -> MockSubtitleSource {
        mock_source(
            Some(vec![
                entry("en", "eng", 10),
                entry("tr1", "tur", 5),
                entry("tr2", "tur", 4),
            ]),
            &[("en", HELLO), ("tr1", MERHABA), ("tr2", SELAM)],
        )
    }

    #[tokio::test]
    async fn test_regenerate_uses_requested_ids() {
        let workflow = Workflow::with_source(Config::default(), Box::new(listing_with_two_translations())).unwrap();

        let result = workflow.regenerate(&request(), "en", "tr2").await.unwrap().unwrap();
        assert_eq!(result.id, "dual-en-tr2-v1");
        assert_eq!(result.cues[0].text, "Hello\n<i>Selam</i>");
        assert_eq!(workflow.cached("0111161___eng_tur_v1"), None);
    }

    #[tokio::test]
    async fn test_regenerate_falls_back_to_best_ranked() {
        let workflow = Workflow::with_source(Config::default(), Box::new(listing_with_two_translations())).unwrap();

        let result = workflow.regenerate(&request(), "gone", "tr9").await.unwrap().unwrap();
        assert_eq!(result.id, "dual-en-tr1-v1");
        assert_eq!(result.cues[0].text, "Hello\n<i>Merhaba</i>");

        let mixed = workflow.regenerate(&request(), "en", "tr9").await.unwrap().unwrap();
        assert_eq!(mixed.id, "dual-en-tr1-v1");
    }

    #[tokio::test]
    async fn test_regenerate_without_listing() {
        let workflow = Workflow::with_source(Config::default(), Box::new(mock_source(None, &[]))).unwrap();
        assert_eq!(workflow.regenerate(&request(), "en", "tr").await.unwrap(), None);

        let query = ContentQuery::parse_id("tt1", ContentKind::Movie, None, None).unwrap();
        let same = FetchRequest::new(query, "tur", "Turkish [tur]");
        let err = workflow.regenerate(&same, "a", "b").await.unwrap_err();
        assert!(matches!(err, DualSubError::SameLanguage(_)));
    }

    #[tokio::test]
    async fn test_nothing_listed_gives_empty() {
        let source = mock_source(None, &[]);
        let workflow = Workflow::with_source(Config::default(), Box::new(source)).unwrap();
        assert!(workflow.fetch_merged(&request()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_secondary_language_gives_empty() {
        let source = mock_source(Some(vec![entry("en", "eng", 10)]), &[("en", HELLO)]);
        let workflow = Workflow::with_source(Config::default(), Box::new(source)).unwrap();
        assert!(workflow.fetch_merged(&request()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_results_names_files_by_key() {
        let source = mock_source(
            Some(vec![entry("en", "eng", 10), entry("tr", "tur", 5)]),
            &[("en", HELLO), ("tr", MERHABA)],
        );
        let workflow = Workflow::with_source(Config::default(), Box::new(source)).unwrap();
        let temp = assert_fs::TempDir::new().unwrap();

        let request = request();
        let results = workflow.fetch_merged(&request).await.unwrap();
        let paths = workflow.write_results(&results, &request, temp.path()).await.unwrap();

        assert_eq!(paths, vec![temp.path().join("0111161___eng_tur_v1.srt")]);
        let written = std::fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(written, results[0].srt);
    }

    #[tokio::test]
    async fn test_merge_local_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        let primary = temp.child("movie.en.srt");
        let secondary = temp.child("movie.tr.srt");
        primary.write_str(HELLO).unwrap();
        secondary.write_str(MERHABA).unwrap();
        let output = temp.child("out/movie.dual.srt");

        let workflow = Workflow::with_source(Config::default(), Box::new(MockSubtitleSource::new())).unwrap();
        let result = workflow
            .merge_files(primary.path(), secondary.path(), "eng", "Turkish [tur]", output.path())
            .await
            .unwrap();

        assert_eq!(result.id, "dual-movie.en-movie.tr-v1");
        let written = std::fs::read_to_string(output.path()).unwrap();
        assert_eq!(written, "1\n00:00:01,000 --> 00:00:03,000\nHello\n<i>Merhaba</i>\n");
    }

    #[tokio::test]
    async fn test_merge_missing_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let secondary = temp.child("movie.tr.srt");
        secondary.write_str(MERHABA).unwrap();

        let workflow = Workflow::with_source(Config::default(), Box::new(MockSubtitleSource::new())).unwrap();
        let missing = temp.path().join("missing.srt");
        let output = temp.path().join("out.srt");
        let err = workflow
            .merge_files(missing.as_path(), secondary.path(), "eng", "tur", output.as_path())
            .await
            .unwrap_err();

        assert!(matches!(err, DualSubError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_merge_unparsable_primary() {
        let temp = assert_fs::TempDir::new().unwrap();
        let primary = temp.child("notes.txt");
        let secondary = temp.child("movie.tr.srt");
        primary.write_str("just some notes\n").unwrap();
        secondary.write_str(MERHABA).unwrap();
        let output = temp.child("out.srt");

        let workflow = Workflow::with_source(Config::default(), Box::new(MockSubtitleSource::new())).unwrap();
        let err = workflow
            .merge_files(primary.path(), secondary.path(), "eng", "tur", output.path())
            .await
            .unwrap_err();

        assert!(matches!(err, DualSubError::NoResult(_)));
        assert!(!output.path().exists());
    }

    #[tokio::test]
    async fn test_decode_utf16_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("utf16.srt");
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "1\n00:00:01,000 --> 00:00:02,000\nHi\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        input.write_binary(&bytes).unwrap();
        let output = temp.child("utf8.srt");

        let workflow = Workflow::with_source(Config::default(), Box::new(MockSubtitleSource::new())).unwrap();
        workflow.decode_file(input.path(), Some("eng"), output.path()).await.unwrap();

        let written = std::fs::read_to_string(output.path()).unwrap();
        assert_eq!(written, "1\n00:00:01,000 --> 00:00:02,000\nHi\n");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.merge.threshold_ms = 0;
        assert!(Workflow::with_source(config, Box::new(MockSubtitleSource::new())).is_err());
    }

    #[test]
    fn test_new_builds_default_source() {
        assert!(Workflow::new(Config::default()).is_ok());
    }
}
