//! Direct backfill for one known asset id — skips the search/selection pass.
//!
//! ASSET_ID is required; EVENT_TITLE and QUESTION label the persisted rows.
//! The span and database settings come from the shared Config env vars.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use polymarket_history::client::MarketDataClient;
use polymarket_history::config::Config;
use polymarket_history::db::HistoryStore;
use polymarket_history::error::{AppError, Result};
use polymarket_history::history::{fetch_history_chunked, ChunkConfig};
use polymarket_history::types::MarketDataset;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let asset_id = std::env::var("ASSET_ID")
        .map_err(|_| AppError::Config("ASSET_ID must be set for a backfill".to_string()))?;
    let event_title = std::env::var("EVENT_TITLE").unwrap_or_else(|_| asset_id.clone());
    let question = std::env::var("QUESTION").unwrap_or_default();

    let store = HistoryStore::connect(&cfg.db_path).await?;
    store.ensure_schema(&cfg.table_name).await?;

    let client = MarketDataClient::new(&cfg.gamma_api_url, &cfg.clob_api_url)?;

    info!(
        asset_id = %asset_id,
        span_start = cfg.span_start,
        span_end = cfg.span_end,
        "backfilling trade history",
    );
    let samples = fetch_history_chunked(
        &client,
        &asset_id,
        cfg.span_start,
        cfg.span_end,
        &ChunkConfig::default(),
    )
    .await?;

    let dataset = MarketDataset {
        event_title,
        question,
        asset_id,
        samples,
    };
    let inserted = store.append(&cfg.table_name, &dataset).await?;
    info!(rows = inserted, table = %cfg.table_name, "backfill persisted");
    Ok(())
}
