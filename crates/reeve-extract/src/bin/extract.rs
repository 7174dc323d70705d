//! Reference-data extraction binary.
//!
//! Walks the reference calculator site one page at a time and upserts the
//! parsed cost tables and game constants into a SQLite store. Safe to re-run;
//! extraction is idempotent.

use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use reeve_extract::{fetch::HttpFetcher, pipeline::Pipeline};
use reeve_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Extract reference game data into the mechanics store")]
struct Cli {
  /// SQLite database to write into.
  #[arg(short, long, default_value = "reeve.db")]
  store: PathBuf,

  /// Base URL of the reference calculator site.
  #[arg(long, default_value = "http://travian.kirilloid.ru")]
  base_url: String,

  /// Delay before each page request, in milliseconds.
  #[arg(long, default_value_t = 500)]
  delay_ms: u64,

  /// Per-request timeout, in seconds.
  #[arg(long, default_value_t = 30)]
  timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let store = SqliteStore::open(&cli.store)
    .await
    .with_context(|| format!("failed to open store at {:?}", cli.store))?;

  let fetcher = HttpFetcher::new(Duration::from_secs(cli.timeout_secs))
    .context("failed to build HTTP client")?;

  let pipeline = Pipeline::new(fetcher, store, cli.base_url)
    .with_delay(Duration::from_millis(cli.delay_ms));

  let report = pipeline.run().await.context("extraction run failed")?;

  for failure in &report.failures {
    tracing::warn!(
      speed = failure.speed,
      entity = %failure.entity,
      error = %failure.error,
      "entity gave up after retries"
    );
  }
  tracing::info!(
    references = report.references_written,
    mechanics = report.mechanics_written,
    failed_entities = report.failures.len(),
    "extraction finished"
  );

  Ok(())
}
