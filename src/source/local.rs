use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, warn};

use super::{decompress_if_gzip, Candidate, ContentQuery, SourceEntry, SubtitleSource};

/// Subtitle files read from the local filesystem.
///
/// There is nothing to list; candidates are built directly from paths with
/// [`LocalFileSource::candidate`].
pub struct LocalFileSource {
    max_bytes: usize,
}

impl LocalFileSource {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn candidate(path: &Path, language_code: &str) -> Candidate {
        let source_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("local")
            .to_string();

        Candidate {
            source_id,
            url: path.to_string_lossy().into_owned(),
            language_code: language_code.to_string(),
            download_count: 0,
        }
    }
}

#[async_trait]
impl SubtitleSource for LocalFileSource {
    async fn list_candidates(&self, _query: &ContentQuery) -> Option<Vec<SourceEntry>> {
        None
    }

    async fn fetch_raw(&self, url: &str) -> Option<Vec<u8>> {
        let path = Path::new(url);
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.len() > self.max_bytes as u64 => {
                warn!("Subtitle file {} exceeds {} bytes", url, self.max_bytes);
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Cannot read subtitle file {}: {}", url, e);
                return None;
            }
        }

        debug!("Reading subtitle file: {}", url);
        match tokio::fs::read(path).await {
            Ok(bytes) => decompress_if_gzip(bytes, url, self.max_bytes),
            Err(e) => {
                warn!("Cannot read subtitle file {}: {}", url, e);
                None
            }
        }
    }
}
