//! Cached fiat exchange rates
//!
//! Bit2Me prices BTC in USD; other fiat prices are derived through a
//! currency-rate table. The table is owned by the client instance and
//! refreshed on a short TTL.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// How long a fetched rate table stays valid
pub const RATE_TTL_SECS: i64 = 300;

/// Fiat-rate table with timestamp-based invalidation.
///
/// Maps upper-case fiat codes to their value relative to USD. A `USD`
/// lookup always answers `1.0`, even on an empty table.
#[derive(Debug, Default)]
pub struct RateCache {
    rates: HashMap<String, f64>,
    fetched_at: Option<DateTime<Utc>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the table needs a refresh before the next non-USD lookup
    pub fn is_stale(&self) -> bool {
        match self.fetched_at {
            Some(fetched_at) => {
                Utc::now().signed_duration_since(fetched_at) > Duration::seconds(RATE_TTL_SECS)
            }
            None => true,
        }
    }

    /// Replace the table with freshly fetched rates. An empty payload is
    /// ignored so a failed refresh keeps the previous table.
    pub fn store(&mut self, mut rates: HashMap<String, f64>) {
        if rates.is_empty() {
            return;
        }
        rates.insert("USD".to_string(), 1.0);
        self.rates = rates;
        self.fetched_at = Some(Utc::now());
    }

    pub fn lookup(&self, code: &str) -> Option<f64> {
        let code = code.to_uppercase();
        if code == "USD" {
            return Some(1.0);
        }
        self.rates.get(&code).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_is_always_one() {
        let cache = RateCache::new();
        assert_eq!(cache.lookup("USD"), Some(1.0));
        assert_eq!(cache.lookup("usd"), Some(1.0));
    }

    #[test]
    fn starts_stale_and_freshens_on_store() {
        let mut cache = RateCache::new();
        assert!(cache.is_stale());

        cache.store(HashMap::from([("EUR".to_string(), 0.9)]));
        assert!(!cache.is_stale());
        assert_eq!(cache.lookup("eur"), Some(0.9));
    }

    #[test]
    fn empty_refresh_keeps_previous_table() {
        let mut cache = RateCache::new();
        cache.store(HashMap::from([("EUR".to_string(), 0.9)]));

        cache.store(HashMap::new());
        assert_eq!(cache.lookup("EUR"), Some(0.9));
    }

    #[test]
    fn unknown_codes_miss() {
        let cache = RateCache::new();
        assert_eq!(cache.lookup("EUR"), None);
    }
}
