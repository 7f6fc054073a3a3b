use crate::types::{BotError, ParsedEntry, ParsedFeed, Result};
use chrono::Utc;
use feed_rs::parser;
use tracing::{debug, info};

/// RSS/Atom document parser. Entries keep document order and titles are
/// trimmed. Untitled entries stay in place with an empty title so they still
/// occupy their slot in the per-feed window.
#[derive(Debug, Default)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_feed(&self, content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| BotError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content.trim().to_string());

        let entries: Vec<ParsedEntry> = feed
            .entries
            .into_iter()
            .map(|entry| self.parse_entry(entry))
            .collect();

        info!("Parsed feed with {} entries", entries.len());

        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(&self, entry: feed_rs::model::Entry) -> ParsedEntry {
        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .unwrap_or_default();
        if title.is_empty() {
            debug!("Entry {} has no title", entry.id);
        }

        let url = entry.links.first().map(|link| link.href.clone());
        let published_at = entry.published.map(|dt| dt.with_timezone(&Utc));

        ParsedEntry {
            title,
            url,
            published_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Politics</title>
    <link>https://example.com</link>
    <description>Political news</description>
    <item>
      <title>  Fed cuts rates amid recession fears </title>
      <link>https://example.com/a</link>
    </item>
    <item>
      <title></title>
      <link>https://example.com/b</link>
    </item>
    <item>
      <title>Senate passes spending bill</title>
      <link>https://example.com/c</link>
    </item>
    <item>
      <title>Fed cuts rates amid recession fears</title>
      <link>https://example.com/d</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn keeps_document_order_duplicates_and_blank_slots() {
        let parsed = FeedParser::new().parse_feed(SAMPLE_RSS).unwrap();
        let titles: Vec<_> = parsed.entries.iter().map(|e| e.title.as_str()).collect();

        assert_eq!(parsed.title.as_deref(), Some("Politics"));
        assert_eq!(
            titles,
            vec![
                "Fed cuts rates amid recession fears",
                "",
                "Senate passes spending bill",
                "Fed cuts rates amid recession fears",
            ]
        );
        assert_eq!(parsed.entries[0].url.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn rejects_non_feed_content() {
        let result = FeedParser::new().parse_feed("<html><body>nope</body></html>");
        assert!(matches!(result, Err(BotError::Parse(_))));
    }
}
