//! Price service: refresh policy, provider rotation and derived metrics

use chrono::{DateTime, Utc};
use std::sync::Arc;

use ticker_core::{
    Interval, PriceCandle, PriceProvider, PriceSample, PriceSeries, ProviderKind, TickerError,
    TickerResult, UnifiedPrice,
};
use ticker_bit2me::Bit2MeClient;
use ticker_coingecko::CoinGeckoClient;
use ticker_mempool::MempoolClient;
use tracing::{info, warn};

/// Attempts made by [`PriceService::get_price_now`] before giving up
const PRICE_NOW_ATTEMPTS: usize = 3;

/// Configuration for a [`PriceService`]
#[derive(Debug, Clone)]
pub struct PriceServiceConfig {
    /// Fiat currency code the ticker reports in
    pub fiat: String,
    /// Lookback window in days for history and percentage change
    pub days_ago: i64,
    /// Sampling interval for provider history fetches
    pub interval: Interval,
    /// Bucket width for derived OHLC candles
    pub ohlc_interval: Interval,
    /// Successful refreshes are cached for this many seconds
    pub min_refresh_secs: i64,
    /// Provider queried first; the rotation continues from here on failure
    pub service: ProviderKind,
    /// Fetch or derive OHLC candles on refresh
    pub enable_ohlc: bool,
    /// Fetch provider history into the time series on refresh
    pub enable_timeseries: bool,
}

impl Default for PriceServiceConfig {
    fn default() -> Self {
        Self {
            fiat: "eur".to_string(),
            days_ago: 1,
            interval: Interval::default(),
            ohlc_interval: Interval::default(),
            min_refresh_secs: 120,
            service: ProviderKind::Mempool,
            enable_ohlc: false,
            enable_timeseries: true,
        }
    }
}

/// Orchestrator over the configured providers.
///
/// Owns the time series and the last unified price record. All getters are
/// I/O-free; only [`refresh`](Self::refresh) and its callers talk to
/// upstreams. The service is not safe for concurrent refreshes: embed it
/// behind a mutex or confine it to one task.
pub struct PriceService {
    providers: Vec<Arc<dyn PriceProvider>>,
    active: usize,
    series: PriceSeries,
    price: Option<UnifiedPrice>,
    ohlc: Vec<PriceCandle>,
    last_refresh: Option<DateTime<Utc>>,
    fiat: String,
    days_ago: i64,
    ohlc_interval: Interval,
    min_refresh_secs: i64,
    enable_ohlc: bool,
    enable_timeseries: bool,
}

impl PriceService {
    /// Create a service over an explicit provider rotation.
    ///
    /// Rotation order is the vector order; the starting provider is the
    /// configured one when present, else the first. The rotation operates
    /// over whatever set is supplied, not a fixed triple.
    pub fn new(
        config: PriceServiceConfig,
        providers: Vec<Arc<dyn PriceProvider>>,
    ) -> TickerResult<Self> {
        if providers.is_empty() {
            return Err(TickerError::config("At least one provider is required"));
        }
        let active = providers
            .iter()
            .position(|p| p.kind() == config.service)
            .unwrap_or(0);

        Ok(Self {
            providers,
            active,
            series: PriceSeries::new(),
            price: None,
            ohlc: Vec::new(),
            last_refresh: None,
            fiat: config.fiat,
            days_ago: config.days_ago,
            ohlc_interval: config.ohlc_interval,
            min_refresh_secs: config.min_refresh_secs,
            enable_ohlc: config.enable_ohlc,
            enable_timeseries: config.enable_timeseries,
        })
    }

    /// Create a service over the standard rotation (CoinGecko, Bit2Me,
    /// mempool.space), with provider credentials taken from the environment.
    pub fn from_config(config: PriceServiceConfig) -> TickerResult<Self> {
        let providers: Vec<Arc<dyn PriceProvider>> = vec![
            Arc::new(CoinGeckoClient::from_env(config.days_ago)),
            Arc::new(Bit2MeClient::from_env(config.interval)),
            Arc::new(MempoolClient::new(config.interval, config.days_ago)),
        ];
        Self::new(config, providers)
    }

    /// Provider the next refresh attempt will use
    pub fn active_provider(&self) -> ProviderKind {
        self.providers[self.active].kind()
    }

    /// The shared time series
    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    /// Refresh the price data if necessary.
    ///
    /// Inside the refresh window this is a no-op returning `true` without
    /// contacting any provider. Otherwise the active provider is queried;
    /// on failure the rotation advances and `false` comes back while the
    /// previous record stays untouched.
    pub async fn refresh(&mut self) -> bool {
        let now = Utc::now();
        if self.price.is_some() {
            if let Some(last_refresh) = self.last_refresh {
                if now.signed_duration_since(last_refresh).num_seconds() < self.min_refresh_secs {
                    return true;
                }
            }
        }

        info!("Fetching price data from {}", self.active_provider());
        match self.try_refresh(now).await {
            Ok(()) => {
                self.last_refresh = Some(now);
                true
            }
            Err(e) => {
                warn!("Failed to fetch from {}: {}", self.active_provider(), e);
                self.active = (self.active + 1) % self.providers.len();
                false
            }
        }
    }

    /// Refresh, falling back through the rotation until a provider succeeds.
    /// Bounded by the number of configured providers.
    pub async fn refresh_with_fallback(&mut self) -> bool {
        for _ in 0..self.providers.len() {
            if self.refresh().await {
                return true;
            }
        }
        false
    }

    /// One full fetch from the active provider. The record and series are
    /// only touched once every price this attempt needs is in hand, so a
    /// failed attempt leaves the previous record complete.
    async fn try_refresh(&mut self, now: DateTime<Utc>) -> TickerResult<()> {
        let provider = Arc::clone(&self.providers[self.active]);

        let usd = provider
            .get_current_price("USD")
            .await
            .ok_or_else(|| TickerError::api("No USD price"))?;
        let fiat = if self.fiat.eq_ignore_ascii_case("USD") {
            usd
        } else {
            provider
                .get_current_price(&self.fiat)
                .await
                .ok_or_else(|| TickerError::api(format!("No {} price", self.fiat)))?
        };

        if self.enable_timeseries {
            let existing = self.series.get_timestamp_list();
            let history = provider.get_history_price(&self.fiat, &existing).await;
            self.series.merge(history);
        }
        self.series.add_price(now, fiat);

        if self.enable_ohlc {
            self.ohlc = match provider.get_ohlc(&self.fiat).await {
                Some(candles) if !candles.is_empty() => candles,
                _ => self.series.resample_to_ohlc(self.ohlc_interval),
            };
        }

        self.price = Some(UnifiedPrice::new(usd, fiat, now));
        Ok(())
    }

    /// Current formatted fiat price, refreshing through the rotation first.
    ///
    /// Makes up to three attempts; if all fail, the previously known price
    /// is formatted, or an empty string when no refresh ever succeeded.
    pub async fn get_price_now(&mut self) -> String {
        let mut success = false;
        let mut attempts = 0;
        while !success && attempts < PRICE_NOW_ATTEMPTS {
            success = self.refresh().await;
            attempts += 1;
        }

        match &self.price {
            Some(record) => crate::format::format_price(record.fiat),
            None => String::new(),
        }
    }

    /// Percentage change over the lookback window, formatted like `+2.41%`.
    /// Empty when the window holds fewer than two samples.
    pub fn get_price_change(&self) -> String {
        match self.series.get_percentage_change(self.days_ago) {
            Some(change) => format!("{:+.2}%", change),
            None => String::new(),
        }
    }

    pub fn get_fiat_price(&self) -> Option<f64> {
        self.price.as_ref().map(|p| p.fiat)
    }

    pub fn get_usd_price(&self) -> Option<f64> {
        self.price.as_ref().map(|p| p.usd)
    }

    pub fn get_sats_per_fiat(&self) -> Option<f64> {
        self.price.as_ref().map(|p| p.sat_per_fiat)
    }

    pub fn get_sats_per_usd(&self) -> Option<f64> {
        self.price.as_ref().map(|p| p.sat_per_usd)
    }

    pub fn get_timestamp(&self) -> Option<DateTime<Utc>> {
        self.price.as_ref().map(|p| p.timestamp)
    }

    /// The last unified price record, if any refresh ever succeeded
    pub fn get_price(&self) -> Option<&UnifiedPrice> {
        self.price.as_ref()
    }

    /// Samples within the lookback window
    pub fn get_timeseries_list(&self) -> Vec<PriceSample> {
        self.series.get_price_list(self.days_ago)
    }

    /// OHLC candles from the last refresh (native or derived)
    pub fn ohlc(&self) -> &[PriceCandle] {
        &self.ohlc
    }

    /// OHLC candles with the volume column zero-filled where the provider
    /// supplied none
    pub fn ohlcv(&self) -> Vec<PriceCandle> {
        self.ohlc
            .iter()
            .map(|candle| candle.with_zero_volume())
            .collect()
    }

    pub fn set_days_ago(&mut self, days_ago: i64) {
        self.days_ago = days_ago;
    }
}
