use rand::seq::index;
use rand::Rng;

use crate::config::{Config, EVENT_START_MAX, EVENT_START_MIN, MIN_EVENT_VOLUME};
use crate::types::{Event, Market};

/// Thresholds for the eligibility predicate. Defaults mirror the config
/// constants; the pipeline builds one from `Config`.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    pub min_volume: f64,
    /// Inclusive Unix-second window the event's start date must fall in.
    pub event_start_min: i64,
    pub event_start_max: i64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_volume: MIN_EVENT_VOLUME,
            event_start_min: EVENT_START_MIN,
            event_start_max: EVENT_START_MAX,
        }
    }
}

impl From<&Config> for SelectionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            min_volume: cfg.min_event_volume,
            event_start_min: cfg.event_start_min,
            event_start_max: cfg.event_start_max,
        }
    }
}

/// True iff the event cleared the volume floor and started inside the window.
pub fn is_eligible(event: &Event, cfg: &SelectionConfig) -> bool {
    event.volume >= cfg.min_volume
        && event.start_ts >= cfg.event_start_min
        && event.start_ts <= cfg.event_start_max
}

/// Draw `min(n, |eligible|)` events uniformly at random without replacement
/// from the eligible subset. The order of the returned draw is whatever the
/// RNG yields — callers must not rely on it.
pub fn sample_events<R: Rng + ?Sized>(
    events: Vec<Event>,
    n: usize,
    cfg: &SelectionConfig,
    rng: &mut R,
) -> Vec<Event> {
    let mut eligible: Vec<Event> = events
        .into_iter()
        .filter(|e| is_eligible(e, cfg))
        .collect();

    let count = n.min(eligible.len());
    let mut picked: Vec<usize> = index::sample(rng, eligible.len(), count).into_vec();
    // Remove from the back so earlier indices stay valid.
    picked.sort_unstable_by(|a, b| b.cmp(a));

    let mut drawn = Vec::with_capacity(count);
    for i in picked {
        drawn.push(eligible.swap_remove(i));
    }
    drawn
}

/// The market with the strictly greatest volume; ties resolve to the first
/// encountered. `None` when the event has no markets.
pub fn best_market(event: &Event) -> Option<&Market> {
    let mut best: Option<&Market> = None;
    for market in &event.markets {
        match best {
            Some(b) if market.volume > b.volume => best = Some(market),
            None => best = Some(market),
            _ => {}
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn event(title: &str, volume: f64, start_ts: i64) -> Event {
        Event {
            title: title.to_string(),
            start_ts,
            end_ts: None,
            volume,
            markets: Vec::new(),
        }
    }

    fn market(question: &str, volume: f64) -> Market {
        Market {
            question: question.to_string(),
            volume,
            token_ids: vec!["1".to_string()],
        }
    }

    const IN_WINDOW: i64 = 1_700_000_000;

    #[test]
    fn volume_boundary_is_inclusive() {
        let cfg = SelectionConfig::default();
        assert!(!is_eligible(&event("low", 999_999.0, IN_WINDOW), &cfg));
        assert!(is_eligible(&event("exact", 1_000_000.0, IN_WINDOW), &cfg));
    }

    #[test]
    fn start_date_outside_window_excludes_regardless_of_volume() {
        let cfg = SelectionConfig::default();
        assert!(!is_eligible(&event("early", 5_000_000.0, cfg.event_start_min - 1), &cfg));
        assert!(!is_eligible(&event("late", 5_000_000.0, cfg.event_start_max + 1), &cfg));
        assert!(is_eligible(&event("min edge", 5_000_000.0, cfg.event_start_min), &cfg));
        assert!(is_eligible(&event("max edge", 5_000_000.0, cfg.event_start_max), &cfg));
    }

    #[test]
    fn sample_returns_all_when_n_exceeds_eligible() {
        let cfg = SelectionConfig::default();
        let events = vec![
            event("a", 2_000_000.0, IN_WINDOW),
            event("b", 2_000_000.0, IN_WINDOW),
            event("ineligible", 10.0, IN_WINDOW),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let drawn = sample_events(events, 10, &cfg, &mut rng);
        assert_eq!(drawn.len(), 2);
    }

    #[test]
    fn sample_draws_n_distinct_events() {
        let cfg = SelectionConfig::default();
        let events: Vec<Event> = (0..8)
            .map(|i| event(&format!("e{i}"), 2_000_000.0, IN_WINDOW))
            .collect();
        let mut rng = StdRng::seed_from_u64(42);
        let drawn = sample_events(events, 3, &cfg, &mut rng);
        assert_eq!(drawn.len(), 3);
        let titles: HashSet<&str> = drawn.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles.len(), 3, "draw must be without replacement");
    }

    #[test]
    fn sample_is_deterministic_under_a_seeded_rng() {
        let cfg = SelectionConfig::default();
        let make = || -> Vec<Event> {
            (0..8)
                .map(|i| event(&format!("e{i}"), 2_000_000.0, IN_WINDOW))
                .collect()
        };
        let a: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(99);
            sample_events(make(), 4, &cfg, &mut rng)
                .into_iter()
                .map(|e| e.title)
                .collect()
        };
        let b: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(99);
            sample_events(make(), 4, &cfg, &mut rng)
                .into_iter()
                .map(|e| e.title)
                .collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn sample_with_no_eligible_events_is_empty() {
        let cfg = SelectionConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let drawn = sample_events(vec![event("tiny", 1.0, IN_WINDOW)], 3, &cfg, &mut rng);
        assert!(drawn.is_empty());
    }

    #[test]
    fn best_market_picks_highest_volume() {
        let mut e = event("e", 2_000_000.0, IN_WINDOW);
        e.markets = vec![market("q1", 10.0), market("q2", 500.0), market("q3", 50.0)];
        assert_eq!(best_market(&e).unwrap().question, "q2");
    }

    #[test]
    fn best_market_tie_goes_to_first() {
        let mut e = event("e", 2_000_000.0, IN_WINDOW);
        e.markets = vec![market("first", 100.0), market("second", 100.0)];
        assert_eq!(best_market(&e).unwrap().question, "first");
    }

    #[test]
    fn best_market_none_for_empty_event() {
        assert!(best_market(&event("empty", 2_000_000.0, IN_WINDOW)).is_none());
    }
}
