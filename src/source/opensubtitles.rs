use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{decompress_if_gzip, ContentKind, ContentQuery, SourceEntry, SubtitleSource};
use crate::config::SourceConfig;
use crate::error::{DualSubError, Result};

/// Listing response of the OpenSubtitles v3 addon API
#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    subtitles: Vec<SourceEntry>,
}

/// Subtitle source backed by the OpenSubtitles v3 addon API
pub struct OpenSubtitlesSource {
    client: Client,
    config: SourceConfig,
}

impl OpenSubtitlesSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(DualSubError::Http)?;

        Ok(Self { client, config })
    }

    /// Listing URL for a query.
    ///
    /// Episodes are addressed as `:season:episode`; everything else by the
    /// video hash, with `0` asking for the unfiltered list.
    pub fn listing_url(&self, query: &ContentQuery) -> String {
        let mut listing = format!(
            "{}/subtitles/{}/tt{}",
            self.config.endpoint.trim_end_matches('/'),
            query.kind(),
            query.content_id
        );

        match (query.kind(), query.season, query.episode) {
            (ContentKind::Series, Some(season), Some(episode)) => {
                listing.push_str(&format!(":{}:{}", season, episode));
            }
            _ => {
                listing.push(':');
                listing.push_str(query.video_hash.as_deref().unwrap_or("0"));
            }
        }

        let mut params = Vec::new();
        if let Some(filename) = &query.filename {
            let encoded: String = url::form_urlencoded::byte_serialize(filename.as_bytes()).collect();
            params.push(format!("filename={}", encoded));
        }
        if let Some(size) = query.video_size {
            params.push(format!("videoSize={}", size));
        }
        if let Some(hash) = &query.video_hash {
            params.push(format!("videoHash={}", hash));
        }
        if !params.is_empty() {
            listing.push('/');
            listing.push_str(&params.join("&"));
        }

        listing.push_str(".json");
        listing
    }

    /// GET with exponential backoff on 429/503/504
    async fn get_with_retry(&self, url: &str) -> Option<Response> {
        let mut backoff = self.config.retry_backoff();
        let mut attempt = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Some(response),
                Ok(response) => {
                    let status = response.status();
                    if attempt < self.config.max_retries && is_retryable(status) {
                        attempt += 1;
                        warn!(
                            "HTTP {} from {} - retrying in {:?} (attempt {}/{})",
                            status, url, backoff, attempt, self.config.max_retries
                        );
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                        continue;
                    }
                    warn!("Request to {} failed with HTTP {}", url, status);
                    return None;
                }
                Err(e) => {
                    warn!("Request to {} failed: {}", url, e);
                    return None;
                }
            }
        }
    }

    /// Read a body without ever holding more than the configured ceiling
    async fn read_limited(&self, mut response: Response, url: &str) -> Option<Vec<u8>> {
        let limit = self.config.max_response_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            warn!("Response from {} exceeds {} bytes", url, limit);
            return None;
        }

        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if body.len() + chunk.len() > limit {
                        warn!("Response from {} exceeds {} bytes", url, limit);
                        return None;
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => return Some(body),
                Err(e) => {
                    warn!("Error reading response from {}: {}", url, e);
                    return None;
                }
            }
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

#[async_trait]
impl SubtitleSource for OpenSubtitlesSource {
    async fn list_candidates(&self, query: &ContentQuery) -> Option<Vec<SourceEntry>> {
        let url = self.listing_url(query);
        debug!("Listing subtitles: {}", url);

        let response = self.get_with_retry(&url).await?;
        let body = self.read_limited(response, &url).await?;

        let listing: ListingResponse = match serde_json::from_slice(&body) {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Error parsing subtitle listing: {}", e);
                return None;
            }
        };

        if listing.subtitles.is_empty() {
            return None;
        }

        info!("Found {} subtitles for tt{}", listing.subtitles.len(), query.content_id);
        Some(listing.subtitles)
    }

    async fn fetch_raw(&self, url: &str) -> Option<Vec<u8>> {
        debug!("Fetching subtitle: {}", url);
        let response = self.get_with_retry(url).await?;
        let body = self.read_limited(response, url).await?;
        decompress_if_gzip(body, url, self.config.max_response_bytes)
    }
}
