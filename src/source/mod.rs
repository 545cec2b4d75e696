// Subtitle sources
//
// The merge pipeline never talks to the network itself; it consumes:
// - SubtitleSource: lists candidates for a title and fetches raw files
// - ContentFetcher: fetches the bytes behind one candidate
//
// Implementations:
// - OpenSubtitles: the public OpenSubtitles v3 addon API over HTTP
// - Local: files on disk, for offline merges

pub mod local;
pub mod opensubtitles;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use tracing::warn;

pub use local::LocalFileSource;
pub use opensubtitles::OpenSubtitlesSource;

use crate::error::{DualSubError, Result};
use crate::language::language_aliases;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Main trait for subtitle providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubtitleSource: Send + Sync {
    /// Every subtitle file the provider knows for a title, or `None`
    async fn list_candidates(&self, query: &ContentQuery) -> Option<Vec<SourceEntry>>;

    /// Raw (decompressed) bytes behind a URL, or `None` on any failure
    async fn fetch_raw(&self, url: &str) -> Option<Vec<u8>>;
}

/// Fetches the content of one candidate
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, candidate: &Candidate) -> Option<Vec<u8>>;
}

#[async_trait]
impl<T: SubtitleSource + ?Sized> ContentFetcher for T {
    async fn fetch(&self, candidate: &Candidate) -> Option<Vec<u8>> {
        self.fetch_raw(&candidate.url).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Series,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Movie => write!(f, "movie"),
            ContentKind::Series => write!(f, "series"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = DualSubError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "movie" => Ok(ContentKind::Movie),
            "series" => Ok(ContentKind::Series),
            _ => Err(DualSubError::Config(format!(
                "Invalid content type '{}'. Valid types: movie, series",
                s
            ))),
        }
    }
}

/// What to search subtitles for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentQuery {
    /// IMDb id without the `tt` prefix
    pub content_id: String,
    pub kind: Option<ContentKind>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Optional matching hints passed through to the provider
    pub filename: Option<String>,
    pub video_size: Option<u64>,
    pub video_hash: Option<String>,
}

impl ContentQuery {
    /// Build a query from an id such as `tt0903747` or `tt0903747:1:2`.
    ///
    /// Season and episode embedded in the id fill in whatever the explicit
    /// arguments leave unset.
    pub fn parse_id(
        id: &str,
        kind: ContentKind,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<Self> {
        let mut parts = id.trim().split(':');
        let content_id = parts.next().unwrap_or_default().replace("tt", "");
        if content_id.is_empty() {
            return Err(DualSubError::Source(format!("No valid IMDb id in '{}'", id)));
        }

        let embedded_season = parts.next().and_then(|s| s.parse().ok());
        let embedded_episode = parts.next().and_then(|e| e.parse().ok());

        Ok(Self {
            content_id,
            kind: Some(kind),
            season: season.or(embedded_season),
            episode: episode.or(embedded_episode),
            ..Default::default()
        })
    }

    pub fn kind(&self) -> ContentKind {
        self.kind.unwrap_or(ContentKind::Movie)
    }
}

/// One subtitle file as listed by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub url: String,
    pub lang: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub downloads: Option<u64>,
}

/// A ranked, not yet fetched subtitle file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub source_id: String,
    pub url: String,
    pub language_code: String,
    pub download_count: u64,
}

impl From<&SourceEntry> for Candidate {
    fn from(entry: &SourceEntry) -> Self {
        Self {
            source_id: entry.id.clone(),
            url: entry.url.clone(),
            language_code: entry.lang.clone(),
            download_count: entry.downloads.unwrap_or(0),
        }
    }
}

/// Keep the entries in `language_code` (or an alias), most downloaded first.
///
/// The sort is stable, so equally popular files keep the provider's order.
/// Entries without a count are ranked as 0 and reported with a count
/// derived from their final position.
pub fn rank_candidates(entries: &[SourceEntry], language_code: &str) -> Vec<Candidate> {
    let aliases = language_aliases(language_code);
    let mut matching: Vec<&SourceEntry> = entries
        .iter()
        .filter(|entry| aliases.iter().any(|alias| *alias == entry.lang))
        .collect();

    matching.sort_by_key(|entry| std::cmp::Reverse(entry.downloads.unwrap_or(0)));

    let total = matching.len();
    matching
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| Candidate {
            source_id: entry.id.clone(),
            url: entry.url.clone(),
            language_code: entry.lang.clone(),
            download_count: entry.downloads.unwrap_or((total - idx) as u64),
        })
        .collect()
}

/// Inflate gzip payloads (by URL suffix or magic bytes), capped at `limit`.
///
/// Plain payloads are returned unchanged; corrupt or oversized gzip data
/// yields `None`.
pub fn decompress_if_gzip(bytes: Vec<u8>, url: &str, limit: usize) -> Option<Vec<u8>> {
    if !url.ends_with(".gz") && !bytes.starts_with(&GZIP_MAGIC) {
        return Some(bytes);
    }

    let mut inflated = Vec::new();
    let decoder = GzDecoder::new(bytes.as_slice());
    match decoder.take(limit as u64 + 1).read_to_end(&mut inflated) {
        Ok(_) if inflated.len() <= limit => Some(inflated),
        Ok(_) => {
            warn!("Decompressed subtitle from {} exceeds {} bytes", url, limit);
            None
        }
        Err(e) => {
            warn!("Error decompressing gzip from {}: {}", url, e);
            None
        }
    }
}

fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
