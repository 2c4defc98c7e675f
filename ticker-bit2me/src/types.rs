//! Bit2Me API response types
//!
//! The gateway mixes numeric and string encodings for numbers, so the
//! decoding helpers here accept both and drop anything else.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use ticker_core::{PriceCandle, PriceSample};

/// Numeric field that may arrive as a JSON number or a numeric string
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// One entry of GET /v1/currency/rate?type=fiat
#[derive(Debug, Clone, Deserialize)]
pub struct RateEntry {
    #[serde(default)]
    pub fiat: Option<HashMap<String, Value>>,
}

/// Flatten a rate payload into code -> USD-relative rate
pub fn parse_rate_table(entries: &[RateEntry]) -> HashMap<String, f64> {
    let mut rates = HashMap::new();
    for entry in entries {
        let Some(fiat) = &entry.fiat else { continue };
        for (code, value) in fiat {
            if let Some(rate) = value_as_f64(value) {
                rates.insert(code.to_uppercase(), rate);
            }
        }
    }
    rates
}

/// Ticker entry under GET /v3/currency/ticker/{asset}
#[derive(Debug, Clone, Deserialize)]
pub struct TickerEntry {
    #[serde(default)]
    pub price: Option<Value>,
}

/// Payload of GET /v3/currency/ticker/{asset}: currency -> asset -> entries
pub type TickerResponse = HashMap<String, HashMap<String, Vec<TickerEntry>>>;

/// First usable USD price for the asset, if any
pub fn extract_usd_price(payload: &TickerResponse, asset: &str) -> Option<f64> {
    payload
        .get("USD")?
        .get(asset)?
        .iter()
        .find_map(|entry| entry.price.as_ref().and_then(value_as_f64))
}

/// Decode chart rows of `[ms, inverse_price, multiplier]` into samples.
///
/// The wire encoding is the inverse of the price scaled by a multiplier:
/// `price = (1 / inverse) * multiplier`. Rows with a zero inverse are
/// unrepresentable and skipped, as are rows at or before the cutoff
/// (unix seconds).
pub fn decode_chart(rows: &[Vec<Value>], cutoff: Option<f64>) -> Vec<PriceSample> {
    let mut history = Vec::new();
    for row in rows {
        if row.len() < 3 {
            continue;
        }
        let (Some(ms), Some(inverse), Some(multiplier)) = (
            value_as_f64(&row[0]),
            value_as_f64(&row[1]),
            value_as_f64(&row[2]),
        ) else {
            continue;
        };

        if inverse == 0.0 {
            continue;
        }

        let secs = ms / 1000.0;
        if let Some(cutoff) = cutoff {
            if secs <= cutoff {
                continue;
            }
        }

        let Some(timestamp) = DateTime::from_timestamp_millis(ms as i64) else {
            continue;
        };
        history.push(PriceSample::new(timestamp, (1.0 / inverse) * multiplier));
    }
    history
}

/// Payload of GET /v1/currency/ohlca/{asset}, quoted in USD
#[derive(Debug, Clone, Deserialize)]
pub struct OhlcaResponse {
    pub open: Value,
    pub high: Value,
    pub low: Value,
    pub close: Value,
}

impl OhlcaResponse {
    /// Convert the USD candle into the requested fiat via `rate`
    pub fn to_candle(
        &self,
        timestamp: chrono::DateTime<chrono::Utc>,
        rate: f64,
    ) -> Option<PriceCandle> {
        Some(PriceCandle {
            timestamp,
            open: value_as_f64(&self.open)? * rate,
            high: value_as_f64(&self.high)? * rate,
            low: value_as_f64(&self.low)? * rate,
            close: value_as_f64(&self.close)? * rate,
            volume: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn chart_rows_decode_inverse_encoding() {
        let rows: Vec<Vec<Value>> = serde_json::from_str(
            r#"[[1712497400000, "0.00005", "0.9"], [1712498400000, "0.00004", "0.9"]]"#,
        )
        .unwrap();

        let history = decode_chart(&rows, None);
        assert_eq!(history.len(), 2);
        assert!((history[0].price - 18_000.0).abs() < 1e-9);
        assert!((history[1].price - 22_500.0).abs() < 1e-9);
    }

    #[test]
    fn chart_rows_skip_zero_inverse_and_cutoff() {
        let rows: Vec<Vec<Value>> = serde_json::from_str(
            r#"[[1712497400000, "0", "0.9"], [1712498400000, "0.00004", "0.9"]]"#,
        )
        .unwrap();

        // Zero inverse is unrepresentable.
        assert_eq!(decode_chart(&rows, None).len(), 1);

        // Everything at or before the cutoff is dropped.
        assert!(decode_chart(&rows, Some(1712498400.0)).is_empty());
    }

    #[test]
    fn rate_table_accepts_numbers_and_strings() {
        let entries: Vec<RateEntry> =
            serde_json::from_str(r#"[{"fiat": {"EUR": "0.9", "GBP": 0.8, "BAD": true}}]"#).unwrap();

        let rates = parse_rate_table(&entries);
        assert_eq!(rates.get("EUR"), Some(&0.9));
        assert_eq!(rates.get("GBP"), Some(&0.8));
        assert!(!rates.contains_key("BAD"));
    }

    #[test]
    fn ticker_payload_yields_first_numeric_price() {
        let payload: TickerResponse = serde_json::from_str(
            r#"{"USD": {"BTC": [{"price": null}, {"price": "50000.0"}]}}"#,
        )
        .unwrap();

        assert_eq!(extract_usd_price(&payload, "BTC"), Some(50_000.0));
        assert_eq!(extract_usd_price(&payload, "ETH"), None);
    }

    #[test]
    fn usd_candle_converts_with_rate() {
        let payload: OhlcaResponse = serde_json::from_str(
            r#"{"open": "100.0", "high": "110.0", "low": "90.0", "close": "105.0"}"#,
        )
        .unwrap();

        let candle = payload.to_candle(Utc::now(), 0.9).unwrap();
        assert!((candle.open - 90.0).abs() < 1e-9);
        assert!((candle.high - 99.0).abs() < 1e-9);
        assert!((candle.low - 81.0).abs() < 1e-9);
        assert!((candle.close - 94.5).abs() < 1e-9);
    }
}
