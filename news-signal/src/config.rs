use crate::llm_adapter::LlmConfig;
use crate::types::{BotError, FetchConfig, Result};
use interfaces::decision::DEFAULT_CONFIDENCE_THRESHOLD;
use interfaces::defs::default_rules;
use interfaces::{DecisionEngine, SignalRule};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

impl FeedConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Bot configuration, read from an optional TOML file.
///
/// Every field has a default, so an empty file (or none at all) runs the
/// Reuters politics feed with the stock rule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub confidence_threshold: i64,
    /// Processed in the order listed
    pub feeds: Vec<FeedConfig>,
    pub max_entries_per_feed: usize,
    pub polite_delay_ms: u64,
    pub log_file: PathBuf,
    pub seen_file: PathBuf,
    /// Flush the seen set after every logged headline instead of only at the end of the run
    pub persist_each_headline: bool,
    pub rules: Vec<SignalRule>,
    pub llm: LlmConfig,
    pub fetch: FetchConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            feeds: vec![FeedConfig::new(
                "Reuters Politics",
                "https://www.reuters.com/rssFeed/politicsNews",
            )],
            max_entries_per_feed: 5,
            polite_delay_ms: 2000,
            log_file: PathBuf::from("signals_log.csv"),
            seen_file: PathBuf::from("seen_headlines.txt"),
            persist_each_headline: false,
            rules: default_rules(),
            llm: LlmConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl BotConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=100).contains(&self.confidence_threshold) {
            return Err(BotError::Config(format!(
                "confidence_threshold must be within 0..=100, got {}",
                self.confidence_threshold
            )));
        }

        if self.feeds.is_empty() {
            return Err(BotError::Config("at least one feed is required".into()));
        }

        for feed in &self.feeds {
            if feed.name.trim().is_empty() {
                return Err(BotError::Config(format!("feed {} has an empty name", feed.url)));
            }
            if !is_valid_feed_url(&feed.url) {
                return Err(BotError::Config(format!(
                    "feed {} has an invalid URL: {}",
                    feed.name, feed.url
                )));
            }
        }

        if self.max_entries_per_feed == 0 {
            return Err(BotError::Config("max_entries_per_feed must be positive".into()));
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.category.trim().is_empty()
                || rule.sentiment.trim().is_empty()
                || rule.action.trim().is_empty()
            {
                return Err(BotError::Config(format!(
                    "rule #{} needs a category, sentiment and action",
                    index + 1
                )));
            }
        }

        Ok(())
    }

    pub fn decision_engine(&self) -> DecisionEngine {
        DecisionEngine::new(self.confidence_threshold, self.rules.clone())
    }

    pub fn polite_delay(&self) -> Duration {
        Duration::from_millis(self.polite_delay_ms)
    }
}

/// Loads `KEY=value` pairs (e.g. `OPENAI_API_KEY`) into the process
/// environment. Variables that are already set are left alone.
///
/// With no explicit path, a `.env` in the working directory or one of its
/// parents is used if present. An explicit path must exist.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenv::from_path(path).map_err(|e| {
                BotError::Config(format!("failed to load env file {}: {}", path.display(), e))
            })?;
            info!("Loaded environment from {}", path.display());
            Ok(Some(path.to_path_buf()))
        }
        None => {
            let loaded = dotenv::dotenv().ok();
            if let Some(found) = &loaded {
                info!("Loaded environment from {}", found.display());
            }
            Ok(loaded)
        }
    }
}

fn is_valid_feed_url(url_str: &str) -> bool {
    match Url::parse(url_str) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}
