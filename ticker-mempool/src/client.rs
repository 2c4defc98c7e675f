//! mempool.space API client
//!
//! The explorer has no bulk history endpoint, so historical samples are
//! fetched one timestamp at a time along a computed time vector.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;

use ticker_core::{
    Interval, PriceCandle, PriceProvider, PriceSample, ProviderKind, TickerError, TickerResult,
};
use tracing::{debug, info, instrument, warn};

use crate::types::{HistoricalPriceResponse, PricesResponse};

/// Base URL for the mempool.space API
const MEMPOOL_API_BASE: &str = "https://mempool.space/api/v1";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Timestamps to query for a history fetch, stepping by `interval` either
/// from the default lookback start or from just past the last known sample.
pub fn calculate_time_vector(
    now: DateTime<Utc>,
    interval: Interval,
    days_ago: i64,
    existing: &[f64],
) -> Vec<i64> {
    let step = interval.as_seconds() as i64;
    let start = match existing.last() {
        Some(&last) => last as i64 + 2 * step,
        None => now.timestamp() - days_ago * 86_400,
    };

    (start..now.timestamp())
        .step_by(step as usize)
        .collect()
}

/// mempool.space API client
#[derive(Clone)]
pub struct MempoolClient {
    client: Client,
    base_url: String,
    interval: Interval,
    days_ago: i64,
}

impl MempoolClient {
    pub fn new(interval: Interval, days_ago: i64) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: MEMPOOL_API_BASE.to_string(),
            interval,
            days_ago,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> TickerResult<T> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TickerError::network(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TickerError::api(format!(
                "Mempool API error ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TickerError::parse(format!("Failed to parse response: {}", e)))
    }

    #[instrument(skip(self))]
    async fn fetch_spot(&self, currency: &str) -> TickerResult<f64> {
        let url = format!("{}/prices", self.base_url);
        let payload: PricesResponse = self.get_json(&url).await?;

        payload
            .price_for(currency)
            .ok_or_else(|| TickerError::unsupported(format!("No {} price listed", currency)))
    }

    async fn fetch_point(&self, currency: &str, timestamp: i64) -> TickerResult<f64> {
        let url = format!(
            "{}/historical-price?currency={}&timestamp={}",
            self.base_url, currency, timestamp
        );
        let payload: HistoricalPriceResponse = self.get_json(&url).await?;

        payload
            .first_price(currency)
            .ok_or_else(|| TickerError::parse(format!("No {} price at {}", currency, timestamp)))
    }
}

#[async_trait]
impl PriceProvider for MempoolClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mempool
    }

    async fn get_current_price(&self, currency: &str) -> Option<f64> {
        match self.fetch_spot(&currency.to_uppercase()).await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!("Failed to fetch current price for {}: {}", currency, e);
                None
            }
        }
    }

    async fn get_history_price(&self, currency: &str, existing: &[f64]) -> Vec<PriceSample> {
        let currency = currency.to_uppercase();
        info!("Getting historical data for a {} interval", self.interval);

        let time_vector = calculate_time_vector(Utc::now(), self.interval, self.days_ago, existing);
        let mut samples = Vec::with_capacity(time_vector.len());

        for timestamp in time_vector {
            match self.fetch_point(&currency, timestamp).await {
                Ok(price) => {
                    if let Some(at) = DateTime::from_timestamp(timestamp, 0) {
                        samples.push(PriceSample::new(at, price));
                    }
                }
                Err(e) => {
                    warn!("Skipping historical point at {}: {}", timestamp, e);
                }
            }
        }

        samples
    }

    async fn get_ohlc(&self, _currency: &str) -> Option<Vec<PriceCandle>> {
        // No native candles; callers resample the time series instead.
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticker_core::IntervalUnit;

    #[test]
    fn time_vector_spans_default_lookback() {
        let now = DateTime::from_timestamp(100_000, 0).unwrap();
        let vector = calculate_time_vector(now, Interval::new(1, IntervalUnit::Hour), 1, &[]);

        assert_eq!(vector.first(), Some(&(100_000 - 86_400)));
        assert_eq!(vector.len(), 24);
        assert!(vector.windows(2).all(|w| w[1] - w[0] == 3600));
    }

    #[test]
    fn time_vector_resumes_past_last_sample() {
        let now = DateTime::from_timestamp(100_000, 0).unwrap();
        let existing = vec![90_000.0];
        let vector =
            calculate_time_vector(now, Interval::new(1, IntervalUnit::Hour), 1, &existing);

        // Resumes two intervals past the last known timestamp.
        assert_eq!(vector.first(), Some(&97_200));
        assert!(vector.iter().all(|&t| t < 100_000));
    }

    #[test]
    fn time_vector_is_empty_when_caught_up() {
        let now = DateTime::from_timestamp(100_000, 0).unwrap();
        let existing = vec![99_000.0];
        let vector =
            calculate_time_vector(now, Interval::new(1, IntervalUnit::Hour), 1, &existing);

        assert!(vector.is_empty());
    }
}
