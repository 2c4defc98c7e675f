//! In-memory price time series
//!
//! Ordered, timestamp-keyed storage for fiat price samples, with merge,
//! percentage-change lookup and OHLC resampling.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::candle::{Interval, PriceCandle};

/// One fiat price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Ordered sequence of price samples with strictly increasing timestamps.
///
/// Samples live in memory for the process lifetime. Inserts that would
/// violate the ordering invariant, and non-positive prices, are dropped
/// silently so that re-merging an overlapping fetch window is idempotent.
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    samples: Vec<PriceSample>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample, if any
    pub fn last(&self) -> Option<&PriceSample> {
        self.samples.last()
    }

    /// All stored samples in timestamp order
    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    /// Insert one sample.
    ///
    /// No-op when `price <= 0` or when `timestamp` is not strictly after the
    /// last stored timestamp.
    pub fn add_price(&mut self, timestamp: DateTime<Utc>, price: f64) {
        if price <= 0.0 {
            debug!("Dropping non-positive price sample: {}", price);
            return;
        }
        if let Some(last) = self.samples.last() {
            if timestamp <= last.timestamp {
                return;
            }
        }
        self.samples.push(PriceSample::new(timestamp, price));
    }

    /// Merge a batch of samples in increasing timestamp order.
    ///
    /// Samples at or before the last stored timestamp are skipped, so merging
    /// the same history window twice leaves the series unchanged.
    pub fn merge(&mut self, samples: impl IntoIterator<Item = PriceSample>) {
        for sample in samples {
            self.add_price(sample.timestamp, sample.price);
        }
    }

    /// Stored timestamps as unix seconds, used by providers to pick a fetch
    /// cutoff.
    pub fn get_timestamp_list(&self) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| s.timestamp.timestamp() as f64)
            .collect()
    }

    /// Samples no older than `days` days
    pub fn get_price_list(&self, days: i64) -> Vec<PriceSample> {
        let cutoff = Utc::now() - Duration::days(days);
        self.samples
            .iter()
            .filter(|s| s.timestamp >= cutoff)
            .copied()
            .collect()
    }

    /// Percentage change between the earliest sample inside the lookback
    /// window and the latest stored sample.
    ///
    /// Returns `None` when the window holds fewer than two samples.
    pub fn get_percentage_change(&self, days: i64) -> Option<f64> {
        let cutoff = Utc::now() - Duration::days(days);
        let mut window = self.samples.iter().filter(|s| s.timestamp >= cutoff);
        let earliest = window.next()?;
        let latest = window.last()?;
        Some((latest.price - earliest.price) / earliest.price * 100.0)
    }

    /// Group samples into fixed-width buckets aligned to the bucket boundary
    /// and aggregate each non-empty bucket into an OHLC candle.
    ///
    /// Empty buckets are omitted, not interpolated.
    pub fn resample_to_ohlc(&self, interval: Interval) -> Vec<PriceCandle> {
        let width = interval.as_seconds() as i64;
        let mut buckets: BTreeMap<i64, PriceCandle> = BTreeMap::new();

        for sample in &self.samples {
            let bucket = sample.timestamp.timestamp().div_euclid(width) * width;
            buckets
                .entry(bucket)
                .and_modify(|candle| {
                    candle.high = candle.high.max(sample.price);
                    candle.low = candle.low.min(sample.price);
                    candle.close = sample.price;
                })
                .or_insert_with(|| PriceCandle {
                    timestamp: DateTime::from_timestamp(bucket, 0).unwrap_or_else(Utc::now),
                    open: sample.price,
                    high: sample.price,
                    low: sample.price,
                    close: sample.price,
                    volume: None,
                });
        }

        buckets.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::IntervalUnit;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn add_price_keeps_sorted_unique_timestamps() {
        let mut series = PriceSeries::new();
        series.add_price(ts(100), 40_000.0);
        series.add_price(ts(200), 41_000.0);

        assert_eq!(series.get_timestamp_list(), vec![100.0, 200.0]);
    }

    #[test]
    fn add_price_rejects_non_positive_prices() {
        let mut series = PriceSeries::new();
        series.add_price(ts(100), 0.0);
        series.add_price(ts(200), -5.0);

        assert!(series.is_empty());
    }

    #[test]
    fn add_price_rejects_stale_timestamps() {
        let mut series = PriceSeries::new();
        series.add_price(ts(200), 40_000.0);
        series.add_price(ts(200), 41_000.0);
        series.add_price(ts(100), 42_000.0);

        assert_eq!(series.len(), 1);
        assert_eq!(series.last().unwrap().price, 40_000.0);
    }

    #[test]
    fn merge_is_idempotent_for_overlapping_windows() {
        let window = vec![
            PriceSample::new(ts(100), 40_000.0),
            PriceSample::new(ts(200), 41_000.0),
            PriceSample::new(ts(300), 42_000.0),
        ];

        let mut series = PriceSeries::new();
        series.merge(window.clone());
        let once = series.samples().to_vec();

        series.merge(window);
        assert_eq!(series.samples(), once.as_slice());
    }

    #[test]
    fn percentage_change_compares_window_endpoints() {
        let now = Utc::now();
        let mut series = PriceSeries::new();
        series.add_price(now - Duration::hours(12), 40_000.0);
        series.add_price(now - Duration::hours(1), 50_000.0);

        let change = series.get_percentage_change(1).unwrap();
        assert!((change - 25.0).abs() < 1e-9);
    }

    #[test]
    fn percentage_change_needs_two_samples_in_window() {
        let now = Utc::now();
        let mut series = PriceSeries::new();
        assert_eq!(series.get_percentage_change(1), None);

        // Only one sample falls inside the one-day window.
        series.add_price(now - Duration::days(10), 30_000.0);
        series.add_price(now - Duration::hours(1), 50_000.0);
        assert_eq!(series.get_percentage_change(1), None);
    }

    #[test]
    fn resample_aggregates_bucket_open_high_low_close() {
        let mut series = PriceSeries::new();
        series.add_price(ts(3600), 50_000.0);
        series.add_price(ts(3900), 55_000.0);
        series.add_price(ts(4200), 45_000.0);
        series.add_price(ts(7300), 52_000.0);

        let candles = series.resample_to_ohlc(Interval::new(1, IntervalUnit::Hour));
        assert_eq!(candles.len(), 2);

        let first = &candles[0];
        assert_eq!(first.timestamp, ts(3600));
        assert_eq!(first.open, 50_000.0);
        assert_eq!(first.high, 55_000.0);
        assert_eq!(first.low, 45_000.0);
        assert_eq!(first.close, 45_000.0);
        assert_eq!(first.volume, None);

        assert_eq!(candles[1].timestamp, ts(7200));
        assert_eq!(candles[1].open, 52_000.0);
    }

    #[test]
    fn price_list_filters_by_lookback() {
        let now = Utc::now();
        let mut series = PriceSeries::new();
        series.add_price(now - Duration::days(3), 30_000.0);
        series.add_price(now - Duration::hours(2), 50_000.0);

        let recent = series.get_price_list(1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].price, 50_000.0);
    }
}
