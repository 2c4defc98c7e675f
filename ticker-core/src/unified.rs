//! Unified price record

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Satoshis per bitcoin
pub const SATS_PER_BTC: f64 = 1e8;

/// Spot prices and satoshi conversions from a single provider call.
///
/// All fields come from the same provider; a record is replaced as a whole
/// on every successful refresh and never patched field by field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnifiedPrice {
    /// BTC price in US dollars
    pub usd: f64,
    /// BTC price in the configured fiat currency
    pub fiat: f64,
    /// Satoshis per US dollar
    pub sat_per_usd: f64,
    /// Satoshis per unit of the configured fiat currency
    pub sat_per_fiat: f64,
    /// When the record was fetched
    pub timestamp: DateTime<Utc>,
}

impl UnifiedPrice {
    pub fn new(usd: f64, fiat: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            usd,
            fiat,
            sat_per_usd: SATS_PER_BTC / usd,
            sat_per_fiat: SATS_PER_BTC / fiat,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn satoshi_conversions() {
        let record = UnifiedPrice::new(50_000.0, 42_000.0, Utc::now());

        assert_eq!(record.sat_per_usd, 2_000.0);
        assert!((record.sat_per_fiat - 2_380.952_380_952_380_7).abs() < 1e-9);
    }
}
