use crate::config::BotConfig;
use crate::llm_adapter::LlmAdapter;
use crate::signal_log::{SignalLog, SignalRecord};
use crate::sources::RssFeedSource;
use crate::traits::HeadlineSource;
use crate::types::Result;
use crate::Fetcher;
use interfaces::{parse_response, Action, DecisionEngine, Headline, SeenStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_entries_per_feed: usize,
    pub polite_delay: Duration,
    pub persist_each_headline: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_entries_per_feed: 5,
            polite_delay: Duration::from_secs(2),
            persist_each_headline: false,
        }
    }
}

impl From<&BotConfig> for PipelineSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            max_entries_per_feed: config.max_entries_per_feed,
            polite_delay: config.polite_delay(),
            persist_each_headline: config.persist_each_headline,
        }
    }
}

/// What happened to a single headline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlineOutcome {
    AlreadySeen,
    ClassifierFailed,
    Logged(Action),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub feeds_polled: usize,
    pub feeds_failed: usize,
    pub entries_considered: usize,
    pub already_seen: usize,
    pub classified: usize,
    pub classifier_failures: usize,
    /// Logged rows per action label
    pub actions: BTreeMap<String, usize>,
}

impl RunSummary {
    fn record(&mut self, outcome: &HeadlineOutcome) {
        match outcome {
            HeadlineOutcome::AlreadySeen => self.already_seen += 1,
            HeadlineOutcome::ClassifierFailed => self.classifier_failures += 1,
            HeadlineOutcome::Logged(action) => {
                self.classified += 1;
                *self.actions.entry(action.to_string()).or_insert(0) += 1;
            }
        }
    }

    pub fn new_headlines(&self) -> usize {
        self.classified + self.classifier_failures
    }
}

/// Sequential headline-to-signal pipeline: feeds in order, entries in feed
/// order, one classifier call at a time.
pub struct SignalPipeline {
    sources: Vec<Box<dyn HeadlineSource>>,
    adapter: Arc<dyn LlmAdapter>,
    engine: DecisionEngine,
    signal_log: SignalLog,
    settings: PipelineSettings,
}

impl SignalPipeline {
    pub fn new(
        adapter: Arc<dyn LlmAdapter>,
        engine: DecisionEngine,
        signal_log: SignalLog,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            sources: Vec::new(),
            adapter,
            engine,
            signal_log,
            settings,
        }
    }

    /// Builds the RSS sources, decision engine and signal log described by `config`
    pub fn from_config(config: &BotConfig, adapter: Arc<dyn LlmAdapter>) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);
        let mut pipeline = Self::new(
            adapter,
            config.decision_engine(),
            SignalLog::new(&config.log_file),
            PipelineSettings::from(config),
        );

        for feed in &config.feeds {
            pipeline.add_source(Box::new(RssFeedSource::new(
                feed.name.clone(),
                feed.url.clone(),
                fetcher.clone(),
            )));
        }

        Ok(pipeline)
    }

    pub fn add_source(&mut self, source: Box<dyn HeadlineSource>) {
        info!("Adding source to pipeline: {}", source.source_name());
        self.sources.push(source);
    }

    pub fn signal_log(&self) -> &SignalLog {
        &self.signal_log
    }

    /// Runs every source once, then flushes the seen set.
    ///
    /// A failing feed is skipped. A failing signal log or seen-set write ends
    /// the run with an error.
    pub async fn run(&mut self, store: &mut SeenStore) -> Result<RunSummary> {
        info!(
            "Starting run with {} sources using {}",
            self.sources.len(),
            self.adapter.adapter_name()
        );
        let mut summary = RunSummary::default();

        for index in 0..self.sources.len() {
            let (source_name, pulled) = {
                let source = &mut self.sources[index];
                (source.source_name(), source.pull().await)
            };

            let entries = match pulled {
                Ok(entries) => entries,
                Err(e) => {
                    error!("Failed to pull from source {}: {}", source_name, e);
                    summary.feeds_failed += 1;
                    continue;
                }
            };
            summary.feeds_polled += 1;

            for entry in entries.into_iter().take(self.settings.max_entries_per_feed) {
                let Some(headline) = Headline::new(&entry.title) else {
                    continue;
                };
                summary.entries_considered += 1;

                let outcome = self.process_headline(&source_name, headline, store).await?;
                summary.record(&outcome);
            }
        }

        store.persist()?;

        info!(
            "Run complete: {} feeds polled ({} failed), {} entries, {} new, {} classified, {} classifier failures",
            summary.feeds_polled,
            summary.feeds_failed,
            summary.entries_considered,
            summary.new_headlines(),
            summary.classified,
            summary.classifier_failures
        );
        for (action, count) in &summary.actions {
            info!("  {}: {}", action, count);
        }

        Ok(summary)
    }

    /// Dedup, classify, decide and log one headline.
    ///
    /// The headline is marked seen before the classifier is called, so a
    /// failed classification is not retried.
    pub async fn process_headline(
        &self,
        source_name: &str,
        headline: Headline,
        store: &mut SeenStore,
    ) -> Result<HeadlineOutcome> {
        if store.contains(headline.as_str()) {
            debug!("Skipping already seen headline: {}", headline);
            return Ok(HeadlineOutcome::AlreadySeen);
        }
        store.add(headline.as_str());

        println!("\nNEW HEADLINE ({}):", source_name);
        println!("{}", headline);

        let outcome = match self.adapter.classify_headline(&headline).await {
            Ok(reply) => {
                let classification = parse_response(&reply);
                let action = self.engine.decide(&classification);

                println!("\nAI ANALYSIS:");
                for (key, value) in classification.iter() {
                    println!("{}: {}", key, value);
                }
                println!("\nFINAL DECISION: {}", action);

                self.signal_log
                    .append(&SignalRecord::now(&headline, &classification, &action))?;
                if self.settings.persist_each_headline {
                    store.persist()?;
                }

                HeadlineOutcome::Logged(action)
            }
            Err(e) => {
                warn!("Classification failed, skipping headline {:?}: {}", headline.as_str(), e);
                HeadlineOutcome::ClassifierFailed
            }
        };

        if !self.settings.polite_delay.is_zero() {
            tokio::time::sleep(self.settings.polite_delay).await;
        }

        Ok(outcome)
    }
}

/// Pipeline builder for easier configuration
pub struct PipelineBuilder {
    pipeline: SignalPipeline,
}

impl PipelineBuilder {
    pub fn new(adapter: Arc<dyn LlmAdapter>, signal_log: SignalLog) -> Self {
        Self {
            pipeline: SignalPipeline::new(
                adapter,
                DecisionEngine::default(),
                signal_log,
                PipelineSettings::default(),
            ),
        }
    }

    pub fn add_source(mut self, source: Box<dyn HeadlineSource>) -> Self {
        self.pipeline.add_source(source);
        self
    }

    pub fn engine(mut self, engine: DecisionEngine) -> Self {
        self.pipeline.engine = engine;
        self
    }

    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.pipeline.settings = settings;
        self
    }

    pub fn build(self) -> SignalPipeline {
        self.pipeline
    }
}
