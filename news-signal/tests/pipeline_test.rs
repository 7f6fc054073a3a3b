use async_trait::async_trait;
use interfaces::SeenStore;
use news_signal::{
    types::*, BotConfig, HeadlineSource, MockLlmAdapter, PipelineBuilder, PipelineSettings,
    SignalLog, StaticFeedSource,
};
use std::fs;
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing::info;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

const FED_HEADLINE: &str = "Fed cuts rates amid recession fears";

const SELL_BONDS_REPLY: &str = "MarketRelevant: Yes\n\
Category: MonetaryPolicy\n\
Sentiment: Negative\n\
Confidence: 88\n\
Explanation: Emergency cuts point to a weakening economy.";

fn settings() -> PipelineSettings {
    PipelineSettings {
        max_entries_per_feed: 5,
        polite_delay: Duration::ZERO,
        persist_each_headline: false,
    }
}

struct FailingSource;

#[async_trait]
impl HeadlineSource for FailingSource {
    fn source_name(&self) -> String {
        "Broken Feed".to_string()
    }

    async fn pull(&mut self) -> Result<Vec<ParsedEntry>> {
        Err(BotError::Fetch {
            url: "https://example.invalid/rss".to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

#[tokio::test]
async fn test_duplicate_headline_in_one_feed_is_classified_once() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let log = SignalLog::new(dir.path().join("signals_log.csv"));
    let adapter = Arc::new(
        MockLlmAdapter::new("e2e".to_string()).with_reply(FED_HEADLINE, SELL_BONDS_REPLY),
    );

    let mut pipeline = PipelineBuilder::new(adapter.clone(), log.clone())
        .add_source(Box::new(StaticFeedSource::new(
            "Reuters Politics",
            [FED_HEADLINE, FED_HEADLINE],
        )))
        .settings(settings())
        .build();
    let mut store = SeenStore::load(dir.path().join("seen.txt"))?;

    let summary = pipeline.run(&mut store).await?;
    info!("Summary: {:?}", summary);

    assert_eq!(adapter.call_count(), 1);
    assert_eq!(summary.classified, 1);
    assert_eq!(summary.already_seen, 1);

    let records = log.load_records()?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].headline, FED_HEADLINE);
    assert_eq!(records[0].action, "SELL BONDS (Paper Trade)");
    assert_eq!(records[0].confidence.as_deref(), Some("88"));
    assert_eq!(
        records[0].explanation.as_deref(),
        Some("Emergency cuts point to a weakening economy.")
    );
    Ok(())
}

#[tokio::test]
async fn test_seen_set_survives_across_runs() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let seen_path = dir.path().join("seen.txt");
    let log = SignalLog::new(dir.path().join("signals_log.csv"));
    let titles = ["Senate passes stimulus package", "Border talks collapse"];

    for run in 0..2 {
        let adapter = Arc::new(MockLlmAdapter::new(format!("run-{run}")));
        let mut pipeline = PipelineBuilder::new(adapter.clone(), log.clone())
            .add_source(Box::new(StaticFeedSource::new("Fixture", titles)))
            .settings(settings())
            .build();
        let mut store = SeenStore::load(&seen_path)?;

        let summary = pipeline.run(&mut store).await?;

        if run == 0 {
            assert_eq!(adapter.call_count(), 2);
            assert_eq!(summary.classified, 2);
        } else {
            assert_eq!(adapter.call_count(), 0);
            assert_eq!(summary.already_seen, 2);
        }
    }

    assert_eq!(log.load_records()?.len(), 2);
    assert_eq!(
        fs::read_to_string(&seen_path)?,
        "Border talks collapse\nSenate passes stimulus package\n"
    );

    let header_lines = fs::read_to_string(log.path())?
        .lines()
        .filter(|line| line.starts_with("Time,"))
        .count();
    assert_eq!(header_lines, 1);
    Ok(())
}

#[tokio::test]
async fn test_classifier_failure_skips_row_but_remembers_headline() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let log = SignalLog::new(dir.path().join("signals_log.csv"));
    let adapter = Arc::new(
        MockLlmAdapter::new("flaky".to_string())
            .with_failure("Timeout story")
            .with_reply(FED_HEADLINE, SELL_BONDS_REPLY),
    );

    let mut pipeline = PipelineBuilder::new(adapter.clone(), log.clone())
        .add_source(Box::new(StaticFeedSource::new(
            "Fixture",
            ["Timeout story", FED_HEADLINE, "Timeout story"],
        )))
        .settings(settings())
        .build();
    let mut store = SeenStore::empty(dir.path().join("seen.txt"));

    let summary = pipeline.run(&mut store).await?;

    assert_eq!(summary.classifier_failures, 1);
    assert_eq!(summary.classified, 1);
    assert_eq!(summary.already_seen, 1);
    assert_eq!(adapter.calls(), vec!["Timeout story", FED_HEADLINE]);
    assert!(store.contains("Timeout story"));

    let records = log.load_records()?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].headline, FED_HEADLINE);
    Ok(())
}

#[tokio::test]
async fn test_failing_feed_does_not_stop_the_run() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let log = SignalLog::new(dir.path().join("signals_log.csv"));
    let adapter = Arc::new(MockLlmAdapter::new("test".to_string()));

    let mut pipeline = PipelineBuilder::new(adapter.clone(), log.clone())
        .add_source(Box::new(FailingSource))
        .add_source(Box::new(StaticFeedSource::new("Healthy", ["Trade deal signed"])))
        .settings(settings())
        .build();
    let mut store = SeenStore::empty(dir.path().join("seen.txt"));

    let summary = pipeline.run(&mut store).await?;

    assert_eq!(summary.feeds_failed, 1);
    assert_eq!(summary.feeds_polled, 1);
    assert_eq!(adapter.calls(), vec!["Trade deal signed"]);
    assert_eq!(
        log.load_records()?[0].action,
        "NO ACTION (Not market relevant)"
    );
    Ok(())
}

#[tokio::test]
async fn test_unwritable_log_fails_the_run() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let log = SignalLog::new(dir.path().join("missing").join("signals_log.csv"));
    let adapter = Arc::new(MockLlmAdapter::new("test".to_string()));

    let mut pipeline = PipelineBuilder::new(adapter, log)
        .add_source(Box::new(StaticFeedSource::new("Fixture", ["Anything"])))
        .settings(settings())
        .build();
    let mut store = SeenStore::empty(dir.path().join("seen.txt"));

    assert!(pipeline.run(&mut store).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_incremental_persistence_flushes_after_each_row() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let seen_path = dir.path().join("seen.txt");
    let log = SignalLog::new(dir.path().join("signals_log.csv"));
    let adapter = Arc::new(MockLlmAdapter::new("test".to_string()));

    let pipeline = PipelineBuilder::new(adapter, log)
        .settings(PipelineSettings {
            persist_each_headline: true,
            ..settings()
        })
        .build();
    let mut store = SeenStore::empty(&seen_path);

    let headline = interfaces::Headline::new("Parliament dissolved").unwrap();
    pipeline.process_headline("Fixture", headline, &mut store).await?;

    assert_eq!(fs::read_to_string(&seen_path)?, "Parliament dissolved\n");
    Ok(())
}

#[tokio::test]
async fn test_config_rules_and_threshold_drive_decisions() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let log = SignalLog::new(dir.path().join("signals_log.csv"));
    let config = BotConfig::from_toml_str(
        r#"
        confidence_threshold = 60

        [[rules]]
        category = "Regulation"
        sentiment = "Negative"
        action = "REDUCE BANKS (Paper Trade)"
        "#,
    )?;

    let adapter = Arc::new(
        MockLlmAdapter::new("rules".to_string())
            .with_reply(
                "Capital rules tightened",
                "MarketRelevant: Yes\nCategory: Regulation\nSentiment: Negative\nConfidence: 65",
            )
            .with_reply(
                "War escalates",
                "MarketRelevant: Yes\nCategory: Geopolitics\nSentiment: Negative\nConfidence: 95",
            ),
    );

    let mut pipeline = PipelineBuilder::new(adapter, log.clone())
        .add_source(Box::new(StaticFeedSource::new(
            "Fixture",
            ["Capital rules tightened", "War escalates"],
        )))
        .engine(config.decision_engine())
        .settings(settings())
        .build();
    let mut store = SeenStore::empty(dir.path().join("seen.txt"));

    let summary = pipeline.run(&mut store).await?;

    let actions: Vec<_> = log.load_records()?.into_iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec!["REDUCE BANKS (Paper Trade)", "NO ACTION (Rule mismatch)"]
    );
    assert_eq!(summary.actions.get("REDUCE BANKS (Paper Trade)"), Some(&1));
    Ok(())
}
