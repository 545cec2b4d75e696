use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::align::{align, DEFAULT_THRESHOLD_MS};
use crate::encoding::normalize;
use crate::source::{Candidate, ContentFetcher};
use crate::subtitle::{self, clean_text, Cue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    pub threshold_ms: u64,
    /// Upper bound on merged versions
    pub max_outputs: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            threshold_ms: DEFAULT_THRESHOLD_MS,
            max_outputs: 3,
        }
    }
}

/// One bilingual track built from a primary and a secondary file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub id: String,
    /// 1-based, in the order results were produced
    pub version: usize,
    pub primary_source_id: String,
    pub secondary_source_id: String,
    pub cues: Vec<Cue>,
    /// `cues` rendered as SRT
    pub srt: String,
}

/// Merge the best usable primary file with up to `max_outputs` secondaries.
///
/// Candidates are tried in the order given. Any failure (fetch, decode,
/// parse, empty merge) skips that candidate; without a usable primary the
/// result is empty.
pub async fn merge<F>(
    primary_candidates: &[Candidate],
    secondary_candidates: &[Candidate],
    fetcher: &F,
    options: &MergeOptions,
) -> Vec<MergeResult>
where
    F: ContentFetcher + ?Sized,
{
    let mut primary = None;
    for candidate in primary_candidates {
        if let Some(cues) = load(fetcher, candidate).await {
            info!(
                "Using primary subtitle {} ({} cues)",
                candidate.source_id,
                cues.len()
            );
            primary = Some((candidate, cues));
            break;
        }
        debug!("Primary candidate {} unusable, trying next", candidate.source_id);
    }

    let Some((primary_candidate, primary_cues)) = primary else {
        warn!("No usable primary subtitle among {} candidates", primary_candidates.len());
        return Vec::new();
    };

    let mut used_urls: HashSet<&str> = HashSet::new();
    used_urls.insert(primary_candidate.url.as_str());

    let mut results = Vec::new();
    for candidate in secondary_candidates {
        if results.len() >= options.max_outputs {
            break;
        }
        if !used_urls.insert(candidate.url.as_str()) {
            debug!("Skipping already used subtitle {}", candidate.url);
            continue;
        }

        let Some(secondary_cues) = load(fetcher, candidate).await else {
            debug!("Secondary candidate {} unusable, skipping", candidate.source_id);
            continue;
        };

        let pairs = align(&primary_cues, &secondary_cues, options.threshold_ms);
        let cues = compose(&primary_cues, &secondary_cues, &pairs);
        if cues.is_empty() {
            debug!("Merge with {} produced no cues, skipping", candidate.source_id);
            continue;
        }

        let version = results.len() + 1;
        let matched = pairs.iter().filter(|p| p.is_some()).count();
        info!(
            "Merged version {} with {} ({}/{} cues matched)",
            version,
            candidate.source_id,
            matched,
            primary_cues.len()
        );

        let srt = subtitle::format(&cues);
        results.push(MergeResult {
            id: format!(
                "dual-{}-{}-v{}",
                primary_candidate.source_id, candidate.source_id, version
            ),
            version,
            primary_source_id: primary_candidate.source_id.clone(),
            secondary_source_id: candidate.source_id.clone(),
            cues,
            srt,
        });
    }

    results
}

/// Build bilingual cues from an alignment.
///
/// Each output cue keeps the primary timing; the secondary text follows in
/// italics on its own line when there is any left after cleanup. Cues whose
/// primary text cleans to nothing are dropped.
pub fn compose(primary: &[Cue], secondary: &[Cue], pairs: &[Option<usize>]) -> Vec<Cue> {
    primary
        .iter()
        .zip(pairs)
        .filter_map(|(cue, pair)| {
            let main = clean_text(&cue.text);
            if main.is_empty() {
                return None;
            }

            let translated = pair
                .and_then(|i| secondary.get(i))
                .map(|s| clean_text(&s.text))
                .filter(|t| !t.is_empty());

            Some(match translated {
                Some(t) => cue.with_text(format!("{}\n<i>{}</i>", main, t)),
                None => cue.with_text(main),
            })
        })
        .enumerate()
        .map(|(i, mut cue)| {
            cue.index = i + 1;
            cue
        })
        .collect()
}

/// Fetch, decode and parse one candidate
async fn load<F>(fetcher: &F, candidate: &Candidate) -> Option<Vec<Cue>>
where
    F: ContentFetcher + ?Sized,
{
    let bytes = fetcher.fetch(candidate).await?;
    let text = normalize(&bytes, Some(candidate.language_code.as_str()));
    subtitle::parse(&text)
}
