use crate::error::{AppError, Result};

pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";
pub const CLOB_API_URL: &str = "https://clob.polymarket.com";

/// HTTP timeout for every Gamma/CLOB call (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Outer chunk of the requested span — one pacing delay is paid per outer window.
pub const DEFAULT_OUTER_WINDOW_SECS: i64 = 86_400;

/// Inner chunk fetched as one concurrent request (3 per outer window at defaults).
pub const DEFAULT_INNER_WINDOW_SECS: i64 = 28_800;

/// Resolution of returned price samples, in minutes.
pub const DEFAULT_FIDELITY_MINUTES: u32 = 5;

/// Delay before each outer window so a long span doesn't hammer the CLOB API.
pub const DEFAULT_PACING_MS: u64 = 100;

/// Events below this lifetime volume (USD) are never extracted.
pub const MIN_EVENT_VOLUME: f64 = 1_000_000.0;

/// Eligible event start dates: 2023-01-01T00:00:00Z .. 2025-07-01T00:00:00Z.
pub const EVENT_START_MIN: i64 = 1_672_531_200;
pub const EVENT_START_MAX: i64 = 1_751_328_000;

/// Default extraction span: 2025-01-01 .. 2025-04-01 (the span the original
/// datasets were collected over).
pub const DEFAULT_SPAN_START: i64 = 1_735_686_000;
pub const DEFAULT_SPAN_END: i64 = 1_743_458_400;

#[derive(Debug, Clone)]
pub struct Config {
    pub gamma_api_url: String,
    pub clob_api_url: String,
    pub log_level: String,
    pub db_path: String,
    pub table_name: String,
    /// Keyword sent to the Gamma public search (SEARCH_QUERY).
    pub search_query: String,
    /// Number of search pages to walk, 1-based (SEARCH_PAGES).
    pub search_pages: u32,
    /// How many eligible events to draw at random (SAMPLE_SIZE).
    pub sample_size: usize,
    /// History span in Unix seconds, half-open (SPAN_START / SPAN_END).
    pub span_start: i64,
    pub span_end: i64,
    /// Minimum lifetime volume in USD (MIN_EVENT_VOLUME).
    pub min_event_volume: f64,
    /// Inclusive event start-date window (EVENT_START_MIN / EVENT_START_MAX).
    pub event_start_min: i64,
    pub event_start_max: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            gamma_api_url: std::env::var("GAMMA_API_URL")
                .unwrap_or_else(|_| GAMMA_API_URL.to_string()),
            clob_api_url: std::env::var("CLOB_API_URL")
                .unwrap_or_else(|_| CLOB_API_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "polymarket.db".to_string()),
            table_name: std::env::var("TABLE_NAME").unwrap_or_else(|_| "market_data".to_string()),
            search_query: std::env::var("SEARCH_QUERY")
                .unwrap_or_else(|_| "US Politics".to_string()),
            search_pages: parse_env("SEARCH_PAGES", 100)?,
            sample_size: parse_env("SAMPLE_SIZE", 1)?,
            span_start: parse_env("SPAN_START", DEFAULT_SPAN_START)?,
            span_end: parse_env("SPAN_END", DEFAULT_SPAN_END)?,
            min_event_volume: parse_env("MIN_EVENT_VOLUME", MIN_EVENT_VOLUME)?,
            event_start_min: parse_env("EVENT_START_MIN", EVENT_START_MIN)?,
            event_start_max: parse_env("EVENT_START_MAX", EVENT_START_MAX)?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} must be a valid number (got '{raw}')"))),
        Err(_) => Ok(default),
    }
}
