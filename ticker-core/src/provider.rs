//! Provider abstraction for upstream price feeds

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::candle::PriceCandle;
use crate::series::PriceSample;

/// Supported upstream price-data providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// CoinGecko market-data aggregator
    CoinGecko,
    /// Bit2Me exchange
    Bit2Me,
    /// mempool.space blockchain explorer price feed
    Mempool,
}

impl ProviderKind {
    /// Identifier used in CLI flags and log lines
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::CoinGecko => "coingecko",
            ProviderKind::Bit2Me => "bit2me",
            ProviderKind::Mempool => "mempool",
        }
    }

    /// Successor in the fixed fallback rotation
    pub fn next(&self) -> ProviderKind {
        match self {
            ProviderKind::CoinGecko => ProviderKind::Bit2Me,
            ProviderKind::Bit2Me => ProviderKind::Mempool,
            ProviderKind::Mempool => ProviderKind::CoinGecko,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "coingecko" | "gecko" => Ok(ProviderKind::CoinGecko),
            "bit2me" | "b2m" => Ok(ProviderKind::Bit2Me),
            "mempool" | "mempool.space" => Ok(ProviderKind::Mempool),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Capability set shared by every upstream price feed.
///
/// Currency codes are case-insensitive; adapters normalize to whatever the
/// upstream expects.
///
/// Runtime faults never escape these methods: transport errors, non-2xx
/// responses and malformed payloads are logged at warning level inside the
/// adapter and surfaced as `None` or an empty sequence. The orchestrator's
/// fallback logic relies on that uniform "no data" signal and cannot tell
/// the causes apart.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Which upstream this adapter talks to
    fn kind(&self) -> ProviderKind;

    /// Current spot price in the requested currency
    async fn get_current_price(&self, currency: &str) -> Option<f64>;

    /// Historical samples strictly newer than the last entry of `existing`
    /// (unix seconds). With no cutoff, a provider-defined default lookback
    /// window applies.
    async fn get_history_price(&self, currency: &str, existing: &[f64]) -> Vec<PriceSample>;

    /// Native OHLC candles, for providers that supply them
    async fn get_ohlc(&self, currency: &str) -> Option<Vec<PriceCandle>>;
}
