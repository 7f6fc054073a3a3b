use anyhow::{Context, Result};
use clap::Parser;
use interfaces::SeenStore;
use news_signal::config::load_env_file;
use news_signal::{BotConfig, LlmAdapter, MockLlmAdapter, OpenAiAdapter, SignalPipeline};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Poll news feeds, classify new headlines with an LLM and log paper-trade signals
#[derive(Parser, Debug)]
#[command(name = "news-signal", version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Env file with credentials (defaults to a `.env` found from the working directory)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Signal log CSV (overrides the config file)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Seen-headlines file (overrides the config file)
    #[arg(long)]
    seen_file: Option<PathBuf>,

    /// Minimum confidence required to act (overrides the config file)
    #[arg(long)]
    threshold: Option<i64>,

    /// Use a canned "not relevant" reply instead of calling the LLM
    #[arg(long)]
    dry_run: bool,

    /// Debug logging unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    load_env_file(cli.env_file.as_deref()).context("Failed to load environment file")?;

    let mut config = match &cli.config {
        Some(path) => BotConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => BotConfig::default(),
    };
    if let Some(log_file) = cli.log_file {
        config.log_file = log_file;
    }
    if let Some(seen_file) = cli.seen_file {
        config.seen_file = seen_file;
    }
    if let Some(threshold) = cli.threshold {
        config.confidence_threshold = threshold;
    }
    config.validate().context("Invalid configuration")?;

    println!("Starting Political News AI Bot...");
    println!("Checking for new headlines...\n");

    let adapter: Arc<dyn LlmAdapter> = if cli.dry_run {
        info!("Dry run: classifier calls are replaced by a canned reply");
        Arc::new(MockLlmAdapter::new("dry-run".to_string()))
    } else {
        Arc::new(
            OpenAiAdapter::from_env(config.llm.clone())
                .context("Failed to set up the classifier")?,
        )
    };

    let mut store = SeenStore::load(&config.seen_file).context("Failed to load seen headlines")?;
    let mut pipeline = SignalPipeline::from_config(&config, adapter)?;

    let summary = pipeline.run(&mut store).await?;
    info!(
        "Logged {} signals to {}, {} headlines remembered",
        summary.classified,
        pipeline.signal_log().path().display(),
        store.len()
    );

    println!("\nRun complete.\n");
    Ok(())
}
