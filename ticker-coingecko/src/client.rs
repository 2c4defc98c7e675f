//! CoinGecko API client
//!
//! Thin adapter over the public CoinGecko REST API. All trait methods
//! degrade to "no data" on any upstream fault; only the internal helpers
//! return errors.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use ticker_core::{
    PriceCandle, PriceProvider, PriceSample, ProviderKind, TickerError, TickerResult,
};
use tracing::{debug, instrument, warn};

use crate::types::{ohlc_rows_to_candles, MarketChartResponse, OhlcRow, SimplePriceResponse};

/// Base URL for the CoinGecko API
const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// CoinGecko API client
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    coin_id: String,
    days_ago: i64,
}

impl CoinGeckoClient {
    /// Create a new client for the public (unauthenticated) API
    pub fn new(days_ago: i64) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: COINGECKO_API_BASE.to_string(),
            api_key: None,
            coin_id: "bitcoin".to_string(),
            days_ago,
        }
    }

    /// Create a client with the demo API key taken from `COINGECKO_API_KEY`,
    /// if set. Without the variable the client stays on public endpoints.
    pub fn from_env(days_ago: i64) -> Self {
        let mut client = Self::new(days_ago);
        client.api_key = std::env::var("COINGECKO_API_KEY").ok();
        client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> TickerResult<T> {
        debug!("Fetching {}", url);

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TickerError::network(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TickerError::api(format!(
                "CoinGecko API error ({}): {}",
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
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url, self.coin_id, currency
        );
        let payload: SimplePriceResponse = self.get_json(&url).await?;

        payload
            .get(&self.coin_id)
            .and_then(|prices| prices.get(currency))
            .copied()
            .ok_or_else(|| {
                TickerError::parse(format!("No {} price for {}", currency, self.coin_id))
            })
    }

    #[instrument(skip(self, existing))]
    async fn fetch_history(
        &self,
        currency: &str,
        existing: &[f64],
    ) -> TickerResult<Vec<PriceSample>> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.base_url, self.coin_id, currency, self.days_ago
        );
        let chart: MarketChartResponse = self.get_json(&url).await?;
        Ok(chart.to_samples(existing.last().copied()))
    }

    #[instrument(skip(self))]
    async fn fetch_ohlc(&self, currency: &str) -> TickerResult<Vec<PriceCandle>> {
        let url = format!(
            "{}/coins/{}/ohlc?vs_currency={}&days={}",
            self.base_url, self.coin_id, currency, self.days_ago
        );
        let rows: Vec<OhlcRow> = self.get_json(&url).await?;
        Ok(ohlc_rows_to_candles(&rows))
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CoinGecko
    }

    async fn get_current_price(&self, currency: &str) -> Option<f64> {
        let currency = currency.to_lowercase();
        match self.fetch_spot(&currency).await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!("Failed to fetch current price for {}: {}", currency, e);
                None
            }
        }
    }

    async fn get_history_price(&self, currency: &str, existing: &[f64]) -> Vec<PriceSample> {
        let currency = currency.to_lowercase();
        match self.fetch_history(&currency, existing).await {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Failed to fetch price history for {}: {}", currency, e);
                Vec::new()
            }
        }
    }

    async fn get_ohlc(&self, currency: &str) -> Option<Vec<PriceCandle>> {
        let currency = currency.to_lowercase();
        match self.fetch_ohlc(&currency).await {
            Ok(candles) => Some(candles),
            Err(e) => {
                warn!("Failed to fetch OHLC data for {}: {}", currency, e);
                None
            }
        }
    }
}
