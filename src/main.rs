use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use polymarket_history::client::{MarketDataClient, SearchOptions};
use polymarket_history::config::Config;
use polymarket_history::db::HistoryStore;
use polymarket_history::error::{AppError, Result};
use polymarket_history::history::{fetch_history_chunked, ChunkConfig};
use polymarket_history::selection::{best_market, sample_events, SelectionConfig};
use polymarket_history::types::{Event, MarketDataset};

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
    let store = HistoryStore::connect(&cfg.db_path).await?;
    store.ensure_schema(&cfg.table_name).await?;
    info!("Database ready at {}", cfg.db_path);

    let client = MarketDataClient::new(&cfg.gamma_api_url, &cfg.clob_api_url)?;

    let events = client
        .search(&cfg.search_query, cfg.search_pages, &SearchOptions::default())
        .await?;
    info!(
        total = events.len(),
        query = %cfg.search_query,
        pages = cfg.search_pages,
        "search complete",
    );

    let selection = SelectionConfig::from(&cfg);
    let mut rng = StdRng::from_entropy();
    let selected = sample_events(events, cfg.sample_size, &selection, &mut rng);
    info!(
        selected = selected.len(),
        requested = cfg.sample_size,
        "eligible events sampled (min_vol=${:.0})",
        selection.min_volume,
    );

    let chunk_cfg = ChunkConfig::default();
    for event in &selected {
        // One bad event shouldn't sink the whole extraction run.
        if let Err(e) = extract_event(&client, &store, &cfg, &chunk_cfg, event).await {
            warn!(event = %event.title, error = %e, "extraction failed, skipping event");
        }
    }

    let total = store.count_rows(&cfg.table_name).await?;
    info!(rows = total, table = %cfg.table_name, "extraction complete");
    Ok(())
}

async fn extract_event(
    client: &MarketDataClient,
    store: &HistoryStore,
    cfg: &Config,
    chunk_cfg: &ChunkConfig,
    event: &Event,
) -> Result<()> {
    let market = best_market(event).ok_or_else(|| AppError::NoMarkets(event.title.clone()))?;
    let asset_id = market
        .token_ids
        .first()
        .ok_or_else(|| AppError::NoAssets(market.question.clone()))?;

    info!(event = %event.title, question = %market.question, "fetching history");
    let samples =
        fetch_history_chunked(client, asset_id, cfg.span_start, cfg.span_end, chunk_cfg).await?;

    let dataset = MarketDataset {
        event_title: event.title.clone(),
        question: market.question.clone(),
        asset_id: asset_id.clone(),
        samples,
    };
    let inserted = store.append(&cfg.table_name, &dataset).await?;
    info!(event = %event.title, rows = inserted, "dataset persisted");
    Ok(())
}
