use serde::{Deserialize, Deserializer};

// ---------------------------------------------------------------------------
// Event / Market
// ---------------------------------------------------------------------------

/// One discovered prediction-market event with its nested markets.
/// Deserialized straight off the Gamma search wire format; required fields
/// (`title`, `startDate`, `volume`) fail the whole page if absent.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub title: String,
    /// `startDate`, converted from ISO 8601 to Unix seconds at the boundary.
    #[serde(rename = "startDate", deserialize_with = "de_unix_ts")]
    pub start_ts: i64,
    /// `endDate` (or `closedTime` on older payloads); unparseable values
    /// collapse to None rather than failing the event.
    #[serde(
        rename = "endDate",
        alias = "closedTime",
        default,
        deserialize_with = "de_opt_unix_ts"
    )]
    pub end_ts: Option<i64>,
    /// Lifetime volume in USD. Gamma sends this as a number or a string.
    #[serde(deserialize_with = "de_flexible_f64")]
    pub volume: f64,
    #[serde(default)]
    pub markets: Vec<Market>,
}

/// One tradable market inside an event.
#[derive(Debug, Clone, Deserialize)]
pub struct Market {
    pub question: String,
    #[serde(default, deserialize_with = "de_flexible_f64")]
    pub volume: f64,
    /// CLOB token ids. The wire format is a JSON array encoded inside a JSON
    /// string; the ids themselves exceed u64 so they stay as decimal strings
    /// and are passed to the API verbatim.
    #[serde(rename = "clobTokenIds", default, deserialize_with = "de_stringified_list")]
    pub token_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Trade history
// ---------------------------------------------------------------------------

/// One price sample from the CLOB `/prices-history` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TradeSample {
    /// Unix seconds.
    #[serde(rename = "t")]
    pub timestamp: i64,
    /// Price in [0, 1].
    #[serde(rename = "p")]
    pub price: f64,
}

/// The unit handed to persistence: one asset's full fetched history.
/// `samples` is in chronological window-concatenation order — the fetcher
/// never sorts, it preserves issue order.
#[derive(Debug, Clone)]
pub struct MarketDataset {
    pub event_title: String,
    pub question: String,
    pub asset_id: String,
    pub samples: Vec<TradeSample>,
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

fn de_flexible_f64<'de, D>(d: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }
    match NumOrStr::deserialize(d)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn de_unix_ts<'de, D>(d: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    parse_iso_to_unix_secs(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'")))
}

fn de_opt_unix_ts<'de, D>(d: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.and_then(|s| parse_iso_to_unix_secs(&s)))
}

fn de_stringified_list<'de, D>(d: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrStr {
        List(Vec<String>),
        Str(String),
    }
    match ListOrStr::deserialize(d)? {
        ListOrStr::List(v) => Ok(v),
        ListOrStr::Str(s) => serde_json::from_str(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse an RFC 3339 / ISO 8601 UTC timestamp string to Unix seconds.
pub fn parse_iso_to_unix_secs(s: &str) -> Option<i64> {
    let s = s.trim();
    let s = s.strip_suffix('Z').unwrap_or(s);
    let s = if let Some(dot) = s.find('.') { &s[..dot] } else { s };
    let s = if s.len() > 19 {
        let b = s.as_bytes()[19];
        if b == b'+' || b == b'-' { &s[..19] } else { s }
    } else {
        s
    };
    let (year, month, day, hour, minute, second): (i64, i64, i64, i64, i64, i64) =
        if s.len() == 10 {
            (s[0..4].parse().ok()?, s[5..7].parse().ok()?, s[8..10].parse().ok()?, 0, 0, 0)
        } else if s.len() >= 19 {
            (s[0..4].parse().ok()?, s[5..7].parse().ok()?, s[8..10].parse().ok()?,
             s[11..13].parse().ok()?, s[14..16].parse().ok()?, s[17..19].parse().ok()?)
        } else {
            return None;
        };

    let a = (14 - month) / 12;
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    let jdn = day + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045;
    let unix_days = jdn - 2_440_588;
    Some(unix_days * 86400 + hour * 3600 + minute * 60 + second)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_parse_full_timestamp() {
        assert_eq!(parse_iso_to_unix_secs("1970-01-01T00:00:00Z"), Some(0));
        assert_eq!(parse_iso_to_unix_secs("2025-01-01T00:00:00Z"), Some(1_735_689_600));
        assert_eq!(
            parse_iso_to_unix_secs("2025-01-01T00:00:00.123Z"),
            Some(1_735_689_600)
        );
    }

    #[test]
    fn iso_parse_date_only() {
        assert_eq!(parse_iso_to_unix_secs("2023-01-01"), Some(1_672_531_200));
    }

    #[test]
    fn iso_parse_rejects_garbage() {
        assert_eq!(parse_iso_to_unix_secs("not a date"), None);
        assert_eq!(parse_iso_to_unix_secs(""), None);
    }

    #[test]
    fn event_deserializes_with_string_volume_and_nested_markets() {
        let json = r#"{
            "title": "What price will Bitcoin hit in 2025?",
            "startDate": "2025-01-01T00:00:00Z",
            "endDate": "2025-12-31T00:00:00Z",
            "volume": "1234567.89",
            "markets": [
                {
                    "question": "Will Bitcoin reach $70,000?",
                    "volume": 1000.5,
                    "clobTokenIds": "[\"950476701649583402771\", \"123\"]"
                }
            ]
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.title, "What price will Bitcoin hit in 2025?");
        assert_eq!(event.start_ts, 1_735_689_600);
        assert!(event.end_ts.is_some());
        assert!((event.volume - 1_234_567.89).abs() < 1e-6);
        assert_eq!(event.markets.len(), 1);
        let market = &event.markets[0];
        assert_eq!(market.token_ids, vec!["950476701649583402771", "123"]);
        assert!((market.volume - 1000.5).abs() < 1e-9);
    }

    #[test]
    fn event_without_title_fails_fast() {
        let json = r#"{"startDate": "2025-01-01T00:00:00Z", "volume": 10}"#;
        assert!(serde_json::from_str::<Event>(json).is_err());
    }

    #[test]
    fn event_closed_time_alias_and_missing_markets() {
        let json = r#"{
            "title": "X",
            "startDate": "2025-01-01T00:00:00Z",
            "closedTime": "2025-02-01T00:00:00Z",
            "volume": 5
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.end_ts, parse_iso_to_unix_secs("2025-02-01T00:00:00Z"));
        assert!(event.markets.is_empty());
    }

    #[test]
    fn market_without_token_ids_defaults_to_empty() {
        let json = r#"{"question": "Q?"}"#;
        let market: Market = serde_json::from_str(json).unwrap();
        assert!(market.token_ids.is_empty());
        assert_eq!(market.volume, 0.0);
    }

    #[test]
    fn trade_sample_wire_format() {
        let sample: TradeSample = serde_json::from_str(r#"{"t": 1735689600, "p": 0.42}"#).unwrap();
        assert_eq!(sample.timestamp, 1_735_689_600);
        assert!((sample.price - 0.42).abs() < 1e-9);
    }
}
