use crate::types::{ParsedEntry, Result};
use async_trait::async_trait;

/// Source of feed entries (RSS feeds, fixtures in tests, etc.)
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    /// Human-readable name for this source, e.g. "Reuters Politics"
    fn source_name(&self) -> String;

    /// Fetch the current entries, most recent first as the source lists them
    async fn pull(&mut self) -> Result<Vec<ParsedEntry>>;
}
