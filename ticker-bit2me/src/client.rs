//! Bit2Me gateway client
//!
//! Provides spot, history and OHLC data. The gateway quotes BTC in USD;
//! other fiat prices go through the cached rate table in [`crate::rate`].

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use ticker_core::{
    Interval, IntervalUnit, PriceCandle, PriceProvider, PriceSample, ProviderKind, TickerError,
    TickerResult,
};
use tracing::{debug, instrument, warn};

use crate::rate::RateCache;
use crate::types::{decode_chart, extract_usd_price, OhlcaResponse, RateEntry, TickerResponse};

/// Base URL for the Bit2Me gateway
const BIT2ME_API_BASE: &str = "https://gateway.bit2me.com";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// API key pair for authenticated gateway access.
///
/// Only the key travels with requests (as `x-api-key`); request signing is
/// not part of this client.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub key: String,
    pub secret: Option<String>,
}

/// Bit2Me gateway client
pub struct Bit2MeClient {
    client: Client,
    base_url: String,
    base_asset: String,
    interval: Interval,
    credentials: Option<ApiCredentials>,
    rates: RwLock<RateCache>,
}

impl Bit2MeClient {
    /// Create a new unauthenticated client for public endpoints
    pub fn new(interval: Interval) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: BIT2ME_API_BASE.to_string(),
            base_asset: "BTC".to_string(),
            interval,
            credentials: None,
            rates: RwLock::new(RateCache::new()),
        }
    }

    /// Create a client with credentials taken from `BIT2ME_API_KEY` and
    /// `BIT2ME_API_SECRET`. Missing variables leave the client on public
    /// endpoints rather than failing construction.
    pub fn from_env(interval: Interval) -> Self {
        let mut client = Self::new(interval);
        client.credentials = std::env::var("BIT2ME_API_KEY").ok().map(|key| ApiCredentials {
            key,
            secret: std::env::var("BIT2ME_API_SECRET").ok(),
        });
        client
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> TickerResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching {}", url);

        let mut request = self.client.get(&url).query(params);
        if let Some(credentials) = &self.credentials {
            request = request.header("x-api-key", &credentials.key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TickerError::network(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TickerError::api(format!(
                "Bit2Me API error ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TickerError::parse(format!("Failed to parse response: {}", e)))
    }

    #[instrument(skip(self))]
    async fn fetch_usd_price(&self) -> TickerResult<f64> {
        let payload: TickerResponse = self
            .get_json(&format!("/v3/currency/ticker/{}", self.base_asset), &[])
            .await?;

        extract_usd_price(&payload, &self.base_asset)
            .ok_or_else(|| TickerError::parse(format!("No USD price for {}", self.base_asset)))
    }

    async fn fetch_rate_table(&self, time_ms: Option<i64>) -> TickerResult<HashMap<String, f64>> {
        let mut params = vec![("type", "fiat".to_string())];
        if let Some(ms) = time_ms {
            params.push(("time", ms.to_string()));
        }
        let entries: Vec<RateEntry> = self.get_json("/v1/currency/rate", &params).await?;
        Ok(crate::types::parse_rate_table(&entries))
    }

    async fn refresh_rates(&self) {
        match self.fetch_rate_table(None).await {
            Ok(rates) => self.rates.write().store(rates),
            Err(e) => warn!("Failed to refresh fiat rates: {}", e),
        }
    }

    /// USD-relative rate for `currency`. USD never touches the network;
    /// other codes refresh the cached table when it has gone stale, with one
    /// extra refresh attempt for codes missing from the table.
    async fn get_fiat_rate(&self, currency: &str) -> Option<f64> {
        if currency.eq_ignore_ascii_case("USD") {
            return Some(1.0);
        }

        if self.rates.read().is_stale() {
            self.refresh_rates().await;
        }
        if let Some(rate) = self.rates.read().lookup(currency) {
            return Some(rate);
        }

        self.refresh_rates().await;
        self.rates.read().lookup(currency)
    }

    /// Chart temporality parameter for the configured interval, when the
    /// gateway has a matching preset
    fn chart_temporality(&self) -> Option<&'static str> {
        match (self.interval.value, self.interval.unit) {
            (1, IntervalUnit::Hour) => Some("one-hour"),
            (4, IntervalUnit::Hour) => Some("four-hours"),
            (12, IntervalUnit::Hour) => Some("twelve-hours"),
            (1, IntervalUnit::Day) => Some("one-day"),
            (7, IntervalUnit::Day) => Some("one-week"),
            _ => None,
        }
    }

    #[instrument(skip(self, existing))]
    async fn fetch_history(
        &self,
        currency: &str,
        existing: &[f64],
    ) -> TickerResult<Vec<PriceSample>> {
        let mut params = vec![(
            "ticker",
            format!("{}/{}", self.base_asset, currency),
        )];
        if let Some(temporality) = self.chart_temporality() {
            params.push(("temporality", temporality.to_string()));
        }

        let rows: Vec<Vec<serde_json::Value>> =
            self.get_json("/v3/currency/chart", &params).await?;
        Ok(decode_chart(&rows, existing.last().copied()))
    }

    #[instrument(skip(self))]
    async fn fetch_ohlc(&self, currency: &str) -> TickerResult<Vec<PriceCandle>> {
        let now = Utc::now();
        let params = vec![
            ("timeframe", self.interval.to_string().to_uppercase()),
            ("time", now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
        ];
        let usd_candle: OhlcaResponse = self
            .get_json(&format!("/v1/currency/ohlca/{}", self.base_asset), &params)
            .await?;

        let rate = if currency.eq_ignore_ascii_case("USD") {
            1.0
        } else {
            let rates = self.fetch_rate_table(Some(now.timestamp_millis())).await?;
            *rates.get(&currency.to_uppercase()).ok_or_else(|| {
                TickerError::parse(format!("No fiat rate for {}", currency))
            })?
        };

        usd_candle
            .to_candle(now, rate)
            .map(|candle| vec![candle])
            .ok_or_else(|| TickerError::parse("Malformed OHLC payload".to_string()))
    }
}

#[async_trait]
impl PriceProvider for Bit2MeClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bit2Me
    }

    async fn get_current_price(&self, currency: &str) -> Option<f64> {
        let usd_price = match self.fetch_usd_price().await {
            Ok(price) => price,
            Err(e) => {
                warn!("Failed to fetch current price: {}", e);
                return None;
            }
        };

        if currency.eq_ignore_ascii_case("USD") {
            return Some(usd_price);
        }

        match self.get_fiat_rate(currency).await {
            Some(rate) => Some(usd_price * rate),
            None => {
                warn!("Fiat rate for {} not found", currency);
                None
            }
        }
    }

    async fn get_history_price(&self, currency: &str, existing: &[f64]) -> Vec<PriceSample> {
        let currency = currency.to_uppercase();
        match self.fetch_history(&currency, existing).await {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Failed to fetch price history for {}: {}", currency, e);
                Vec::new()
            }
        }
    }

    async fn get_ohlc(&self, currency: &str) -> Option<Vec<PriceCandle>> {
        let currency = currency.to_uppercase();
        match self.fetch_ohlc(&currency).await {
            Ok(candles) => Some(candles),
            Err(e) => {
                warn!("Failed to fetch OHLC data for {}: {}", currency, e);
                None
            }
        }
    }
}
