//! CoinGecko API response types
//!
//! These types mirror the CoinGecko API responses and are converted to
//! ticker-core types before leaving this crate.

use chrono::DateTime;
use serde::Deserialize;
use std::collections::HashMap;

use ticker_core::{PriceCandle, PriceSample};

/// Response from GET /simple/price, keyed by coin id then currency code
pub type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// Response from GET /coins/{id}/market_chart
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChartResponse {
    /// Rows of `[unix milliseconds, price]`
    pub prices: Vec<(f64, f64)>,
}

impl MarketChartResponse {
    /// Convert chart rows to samples, dropping everything at or before the
    /// cutoff (unix seconds) so overlapping fetch windows merge cleanly.
    pub fn to_samples(&self, cutoff: Option<f64>) -> Vec<PriceSample> {
        self.prices
            .iter()
            .filter_map(|&(ms, price)| {
                let secs = ms / 1000.0;
                if let Some(cutoff) = cutoff {
                    if secs <= cutoff {
                        return None;
                    }
                }
                let timestamp = DateTime::from_timestamp_millis(ms as i64)?;
                Some(PriceSample::new(timestamp, price))
            })
            .collect()
    }
}

/// One row of GET /coins/{id}/ohlc: `[ms, open, high, low, close]`
pub type OhlcRow = (f64, f64, f64, f64, f64);

/// Convert native OHLC rows to candles. CoinGecko supplies no volume.
pub fn ohlc_rows_to_candles(rows: &[OhlcRow]) -> Vec<PriceCandle> {
    rows.iter()
        .filter_map(|&(ms, open, high, low, close)| {
            let timestamp = DateTime::from_timestamp_millis(ms as i64)?;
            Some(PriceCandle {
                timestamp,
                open,
                high,
                low,
                close,
                volume: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_chart_filters_by_cutoff() {
        let chart: MarketChartResponse = serde_json::from_str(
            r#"{"prices": [[1000000, 40000.0], [2000000, 41000.0], [3000000, 42000.0]]}"#,
        )
        .unwrap();

        let all = chart.to_samples(None);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].price, 40000.0);

        // Cutoff at 2000 seconds drops the first two rows.
        let fresh = chart.to_samples(Some(2000.0));
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].price, 42000.0);
    }

    #[test]
    fn simple_price_payload_parses() {
        let payload: SimplePriceResponse =
            serde_json::from_str(r#"{"bitcoin": {"eur": 42000.5}}"#).unwrap();

        assert_eq!(payload["bitcoin"]["eur"], 42000.5);
    }

    #[test]
    fn ohlc_rows_convert_to_candles() {
        let rows: Vec<OhlcRow> = serde_json::from_str(
            r#"[[3600000, 49000.0, 51000.0, 48000.0, 50000.0]]"#,
        )
        .unwrap();

        let candles = ohlc_rows_to_candles(&rows);
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, 49000.0);
        assert_eq!(candles[0].high, 51000.0);
        assert_eq!(candles[0].low, 48000.0);
        assert_eq!(candles[0].close, 50000.0);
        assert_eq!(candles[0].volume, None);
    }
}
