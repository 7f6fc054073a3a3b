use crate::types::{BotError, FetchConfig, FetchResult, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::Utc;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn max_feed_bytes(&self) -> u64 {
        self.config.max_feed_size_mb as u64 * 1024 * 1024
    }

    fn too_large(&self, size_bytes: u64) -> BotError {
        BotError::FeedTooLarge {
            size_bytes,
            limit_mb: self.config.max_feed_size_mb,
        }
    }

    /// Downloads a feed document, retrying transport errors and non-2xx
    /// statuses with exponential backoff.
    pub async fn fetch_feed(&self, url: &str) -> Result<FetchResult> {
        let start_time = Instant::now();
        let fetch_time = Utc::now();
        let parsed_url = Url::parse(url)?;

        debug!("Fetching feed: {}", parsed_url);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.client.get(parsed_url.clone()).send().await {
                Ok(mut response) => {
                    let status = response.status();

                    if !status.is_success() {
                        last_error = Some(format!(
                            "HTTP {}: {}",
                            status,
                            status.canonical_reason().unwrap_or("Unknown")
                        ));
                    } else {
                        let max_bytes = self.max_feed_bytes();
                        if let Some(content_length) = response.content_length() {
                            if content_length > max_bytes {
                                return Err(self.too_large(content_length));
                            }
                        }

                        // Chunked bodies carry no Content-Length
                        let mut body = Vec::new();
                        while let Some(chunk) = response.chunk().await? {
                            body.extend_from_slice(&chunk);
                            if body.len() as u64 > max_bytes {
                                return Err(self.too_large(body.len() as u64));
                            }
                        }

                        let content = String::from_utf8_lossy(&body).into_owned();
                        info!("Fetched feed: {} ({} bytes)", url, content.len());
                        return Ok(FetchResult {
                            url: url.to_string(),
                            http_status: status.as_u16(),
                            content,
                            fetch_time,
                            response_time_ms: start_time.elapsed().as_millis() as u64,
                        });
                    }
                }
                Err(e) => {
                    last_error = Some(e.to_string());
                }
            }

            if attempt < self.config.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
            break;
        }

        let reason = last_error.unwrap_or_else(|| "Unknown error".to_string());
        error!(
            "Failed to fetch feed after {} attempts: {}",
            self.config.max_retries + 1,
            url
        );

        Err(BotError::Fetch {
            url: url.to_string(),
            reason,
        })
    }
}
