use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use crate::error::{Result, DualSubError};

// Default values for optional configuration keys
fn default_user_agent() -> String {
    format!("dualsub/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub merge: MergeConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the subtitle search API
    pub endpoint: String,
    /// Request timeout in seconds, applied to listing and downloads
    pub timeout_secs: u64,
    /// Largest accepted response body (also caps gzip output)
    pub max_response_bytes: usize,
    /// Retries for HTTP 429/503/504 before a fetch is treated as failed
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff delay, doubled on every retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Close-start window used by the alignment engine
    pub threshold_ms: u64,
    /// Maximum number of merged versions produced per request
    pub max_outputs: usize,
    /// Language selector used when none is given, e.g. "English [eng]"
    pub primary_language: String,
    /// Language selector used when none is given, e.g. "Turkish [tur]"
    pub secondary_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Lifetime of a merged result in the result store
    pub ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig {
                endpoint: "https://opensubtitles-v3.strem.io".to_string(),
                timeout_secs: 15,
                max_response_bytes: 5 * 1024 * 1024,
                max_retries: default_max_retries(),
                retry_backoff_ms: default_retry_backoff_ms(),
                user_agent: default_user_agent(),
            },
            merge: MergeConfig {
                threshold_ms: 500,
                max_outputs: 3,
                primary_language: "English [eng]".to_string(),
                secondary_language: "Turkish [tur]".to_string(),
            },
            store: StoreConfig {
                ttl_secs: 6 * 60 * 60,
            },
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DualSubError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| DualSubError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DualSubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DualSubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.merge.threshold_ms == 0 {
            return Err(DualSubError::Config("merge.threshold_ms must be greater than 0".to_string()));
        }
        if self.merge.max_outputs == 0 {
            return Err(DualSubError::Config("merge.max_outputs must be at least 1".to_string()));
        }
        if self.source.timeout_secs == 0 {
            return Err(DualSubError::Config("source.timeout_secs must be greater than 0".to_string()));
        }
        if self.source.max_response_bytes == 0 {
            return Err(DualSubError::Config("source.max_response_bytes must be greater than 0".to_string()));
        }
        if self.source.endpoint.trim().is_empty() {
            return Err(DualSubError::Config("source.endpoint must not be empty".to_string()));
        }
        Ok(())
    }
}
