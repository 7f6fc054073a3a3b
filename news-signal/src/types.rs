use chrono::{DateTime, Utc};
use interfaces::StateError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "News-Signal-Bot/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 2,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,
    pub http_status: u16,
    pub content: String,
    pub fetch_time: DateTime<Utc>,
    pub response_time_ms: u64,
}

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

/// Feed entry as it appears in the document, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub title: String,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl ParsedEntry {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            published_at: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("API key not set (expected environment variable {0})")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("authentication rejected by classifier API")]
    Authentication,

    #[error("rate limited by classifier API")]
    RateLimited,

    #[error("classifier API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Feed fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Feed size {size_bytes} bytes exceeds limit of {limit_mb}MB")]
    FeedTooLarge { size_bytes: u64, limit_mb: usize },

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Seen-headline store error: {0}")]
    State(#[from] StateError),

    #[error("Signal log error: {0}")]
    SignalLog(#[from] csv::Error),

    #[error("Invalid signal log record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
