use thiserror::Error;

#[derive(Error, Debug)]
pub enum DualSubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Subtitle source error: {0}")]
    Source(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Primary and secondary language are both '{0}'")]
    SameLanguage(String),

    #[error("No merged subtitles could be produced: {0}")]
    NoResult(String),
}

pub type Result<T> = std::result::Result<T, DualSubError>;
