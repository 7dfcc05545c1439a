//! Chunked, rate-aware trade-history fetching.
//!
//! A long span is split into outer windows (one pacing delay each, processed
//! strictly in time order) and each outer window into inner windows fetched
//! as one concurrent batch. Results are reassembled in issue order, so the
//! output stays chronologically ordered by window no matter which request
//! completes first.

use std::future::Future;
use std::time::Duration;

use futures_util::future::try_join_all;
use tracing::{debug, warn};

use crate::client::{HistoryRequest, MarketDataClient};
use crate::config::{
    DEFAULT_FIDELITY_MINUTES, DEFAULT_INNER_WINDOW_SECS, DEFAULT_OUTER_WINDOW_SECS,
    DEFAULT_PACING_MS,
};
use crate::error::Result;
use crate::types::TradeSample;

/// How the end timestamp of each inner request is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InnerEndRule {
    /// `end = start + inner_window_secs` — every inner request covers exactly
    /// one inner window. Canonical.
    FixedWidth,
    /// `end = start + offset_from_outer_start`. The first request of every
    /// outer window is zero-width and later requests stretch past their
    /// window. This is the arithmetic the earliest datasets were collected
    /// with; kept selectable for reproducing them bit-for-bit.
    OffsetFromOuterStart,
}

/// What to do when one outer window's fan-out fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFailurePolicy {
    /// Fail the whole fetch. Default — a silent gap poisons downstream
    /// analysis more than a retryable failure does.
    Abort,
    /// Log the gap and continue with the next outer window. Useful for long
    /// backfills against a flaky upstream.
    SkipWindow,
}

#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub outer_window_secs: i64,
    pub inner_window_secs: i64,
    pub fidelity_minutes: u32,
    /// Applied once before each outer window; suspends the whole pipeline,
    /// not just the concurrent fan-out.
    pub pacing: Duration,
    pub inner_end: InnerEndRule,
    pub on_window_failure: WindowFailurePolicy,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            outer_window_secs: DEFAULT_OUTER_WINDOW_SECS,
            inner_window_secs: DEFAULT_INNER_WINDOW_SECS,
            fidelity_minutes: DEFAULT_FIDELITY_MINUTES,
            pacing: Duration::from_millis(DEFAULT_PACING_MS),
            inner_end: InnerEndRule::FixedWidth,
            on_window_failure: WindowFailurePolicy::Abort,
        }
    }
}

/// Start timestamps of every outer window covering `[span_start, span_end)`.
/// The final window is included even when shorter than `outer_window_secs`.
pub fn outer_window_starts(span_start: i64, span_end: i64, outer_window_secs: i64) -> Vec<i64> {
    let mut starts = Vec::new();
    let mut dl = span_start;
    while dl < span_end {
        starts.push(dl);
        dl += outer_window_secs;
    }
    starts
}

/// The concurrent request batch for the outer window starting at `dl`.
/// Inner offsets step by `inner_window_secs` through the full outer window —
/// a final partial outer window is not clipped, its requests may extend past
/// the requested span end.
pub fn inner_requests(asset_id: &str, dl: i64, cfg: &ChunkConfig) -> Vec<HistoryRequest> {
    let mut requests = Vec::new();
    let mut hl = 0;
    while hl < cfg.outer_window_secs {
        let ts = dl + hl;
        let end_ts = match cfg.inner_end {
            InnerEndRule::FixedWidth => ts + cfg.inner_window_secs,
            InnerEndRule::OffsetFromOuterStart => ts + hl,
        };
        requests.push(HistoryRequest {
            asset_id: asset_id.to_string(),
            start_ts: Some(ts),
            end_ts: Some(end_ts),
            fidelity_minutes: Some(cfg.fidelity_minutes),
            interval: None,
        });
        hl += cfg.inner_window_secs;
    }
    requests
}

/// Fetch the full trade history for `asset_id` over `[span_start, span_end)`
/// against the live CLOB endpoint.
pub async fn fetch_history_chunked(
    client: &MarketDataClient,
    asset_id: &str,
    span_start: i64,
    span_end: i64,
    cfg: &ChunkConfig,
) -> Result<Vec<TradeSample>> {
    fetch_chunked_with(asset_id, span_start, span_end, cfg, |req| async move {
        client.prices_history(&req).await
    })
    .await
}

/// The chunking engine, generic over the per-request fetch so tests can
/// inject mock responses with arbitrary completion order.
///
/// Outer windows run one at a time with a pacing delay before each; the
/// inner requests of one outer window run concurrently and fail fast
/// together. Dropping the returned future cancels whatever inner requests
/// are in flight.
pub async fn fetch_chunked_with<F, Fut>(
    asset_id: &str,
    span_start: i64,
    span_end: i64,
    cfg: &ChunkConfig,
    fetch: F,
) -> Result<Vec<TradeSample>>
where
    F: Fn(HistoryRequest) -> Fut,
    Fut: Future<Output = Result<Vec<TradeSample>>>,
{
    let mut samples = Vec::new();

    for dl in outer_window_starts(span_start, span_end, cfg.outer_window_secs) {
        tokio::time::sleep(cfg.pacing).await;

        let batch = inner_requests(asset_id, dl, cfg);
        let call_count = batch.len();

        // try_join_all keeps results in input order, so inner windows land in
        // offset order regardless of which response arrives first.
        match try_join_all(batch.into_iter().map(&fetch)).await {
            Ok(results) => {
                let added: usize = results.iter().map(|r| r.len()).sum();
                debug!(outer_start = dl, calls = call_count, samples = added, "outer window complete");
                for chunk in results {
                    samples.extend(chunk);
                }
            }
            Err(e) => match cfg.on_window_failure {
                WindowFailurePolicy::Abort => return Err(e),
                WindowFailurePolicy::SkipWindow => {
                    warn!(outer_start = dl, error = %e, "outer window failed, leaving a gap");
                }
            },
        }
    }

    Ok(samples)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
