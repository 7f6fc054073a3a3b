use crate::traits::HeadlineSource;
use crate::types::{ParsedEntry, Result};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Named RSS/Atom feed fetched over HTTP
pub struct RssFeedSource {
    pub name: String,
    pub url: String,
    pub title: Option<String>,
    fetcher: Arc<Fetcher>,
    parser: FeedParser,
    last_fetch: Option<DateTime<Utc>>,
}

impl RssFeedSource {
    pub fn new(name: String, url: String, fetcher: Arc<Fetcher>) -> Self {
        Self {
            name,
            url,
            title: None,
            fetcher,
            parser: FeedParser::new(),
            last_fetch: None,
        }
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }
}

#[async_trait]
impl HeadlineSource for RssFeedSource {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    async fn pull(&mut self) -> Result<Vec<ParsedEntry>> {
        info!("Pulling RSS feed {}: {}", self.name, self.url);

        let fetch_result = self.fetcher.fetch_feed(&self.url).await?;
        self.last_fetch = Some(fetch_result.fetch_time);

        let parsed_feed = self.parser.parse_feed(&fetch_result.content)?;
        if self.title.is_none() {
            self.title = parsed_feed.title;
        }

        info!(
            "Pulled {} entries from {} in {}ms",
            parsed_feed.entries.len(),
            self.name,
            fetch_result.response_time_ms
        );
        Ok(parsed_feed.entries)
    }
}
