pub mod config;
pub mod fetcher;
pub mod llm_adapter;
pub mod parser;
pub mod pipeline;
pub mod signal_log;
pub mod sources;
pub mod traits;
pub mod types;

pub use config::{BotConfig, FeedConfig};
pub use fetcher::Fetcher;
pub use llm_adapter::{LlmAdapter, LlmConfig, MockLlmAdapter, OpenAiAdapter};
pub use parser::FeedParser;
pub use pipeline::{HeadlineOutcome, PipelineBuilder, PipelineSettings, RunSummary, SignalPipeline};
pub use signal_log::{SignalLog, SignalRecord};
pub use sources::{RssFeedSource, StaticFeedSource};
pub use traits::HeadlineSource;
pub use types::*;
