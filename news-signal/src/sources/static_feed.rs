use crate::traits::HeadlineSource;
use crate::types::{ParsedEntry, Result};
use async_trait::async_trait;

/// Fixed list of entries, returned on every pull
pub struct StaticFeedSource {
    name: String,
    entries: Vec<ParsedEntry>,
    pulls: usize,
}

impl StaticFeedSource {
    pub fn new<I, S>(name: impl Into<String>, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            entries: titles.into_iter().map(ParsedEntry::with_title).collect(),
            pulls: 0,
        }
    }

    pub fn pulls(&self) -> usize {
        self.pulls
    }
}

#[async_trait]
impl HeadlineSource for StaticFeedSource {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    async fn pull(&mut self) -> Result<Vec<ParsedEntry>> {
        self.pulls += 1;
        Ok(self.entries.clone())
    }
}
