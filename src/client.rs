use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::Result;
use crate::types::{Event, TradeSample};

/// Optional query parameters for `search`. Absent values are omitted from
/// the request entirely, never sent as null or empty strings.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub event_status: Option<String>,
    pub sort: Option<String>,
    pub ascending: Option<bool>,
}

/// One `/prices-history` call. `interval` and the `(start_ts, end_ts)` pair
/// are mutually exclusive per the API contract; the client passes through
/// whatever is set and leaves enforcement to the caller.
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub asset_id: String,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub fidelity_minutes: Option<u32>,
    pub interval: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    /// Absent or empty means the page contributes zero events — not an error.
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<TradeSample>,
}

/// Read-only client for the Gamma search and CLOB price-history endpoints.
/// Built once per batch of calls and dropped afterwards; every request
/// carries the builder-level timeout.
pub struct MarketDataClient {
    http: reqwest::Client,
    gamma_url: String,
    clob_url: String,
}

impl MarketDataClient {
    pub fn new(gamma_url: &str, clob_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            gamma_url: gamma_url.trim_end_matches('/').to_string(),
            clob_url: clob_url.trim_end_matches('/').to_string(),
        })
    }

    /// Walk pages 1..=`page_count` of the Gamma public search sequentially and
    /// concatenate their events in page order. A page with no `events` field
    /// logs a diagnostic and contributes nothing; any non-2xx response aborts
    /// the whole search.
    pub async fn search(
        &self,
        query: &str,
        page_count: u32,
        opts: &SearchOptions,
    ) -> Result<Vec<Event>> {
        let url = format!("{}/public-search", self.gamma_url);
        let mut events = Vec::new();

        for page in 1..=page_count {
            let params = search_params(query, page, opts);
            let body: SearchPage = self
                .http
                .get(&url)
                .query(&params)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            if body.events.is_empty() {
                debug!(page, query, "search page returned no events");
                continue;
            }
            events.extend(body.events);
        }

        Ok(events)
    }

    /// Fetch time-bucketed price samples for one asset. A missing `history`
    /// field is an empty result; a non-2xx response is an error for this call
    /// only — the caller decides whether that fails a batch.
    pub async fn prices_history(&self, req: &HistoryRequest) -> Result<Vec<TradeSample>> {
        let url = format!("{}/prices-history", self.clob_url);
        let params = history_params(req);
        let body: HistoryResponse = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.history)
    }
}

fn search_params(query: &str, page: u32, opts: &SearchOptions) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", query.to_string()), ("page", page.to_string())];
    if let Some(status) = &opts.event_status {
        params.push(("event_status", status.clone()));
    }
    if let Some(sort) = &opts.sort {
        params.push(("sort", sort.clone()));
    }
    if let Some(ascending) = opts.ascending {
        params.push(("ascending", ascending.to_string()));
    }
    params
}

fn history_params(req: &HistoryRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![("market", req.asset_id.clone())];
    if let Some(interval) = &req.interval {
        params.push(("interval", interval.clone()));
    }
    if let Some(ts) = req.start_ts {
        params.push(("startTs", ts.to_string()));
    }
    if let Some(ts) = req.end_ts {
        params.push(("endTs", ts.to_string()));
    }
    if let Some(fidelity) = req.fidelity_minutes {
        params.push(("fidelity", fidelity.to_string()));
    }
    params
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
