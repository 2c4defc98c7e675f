//! mempool.space API response types

use serde::Deserialize;
use std::collections::HashMap;

/// Response from GET /prices: a timestamp plus one field per currency code
#[derive(Debug, Clone, Deserialize)]
pub struct PricesResponse {
    pub time: i64,
    #[serde(flatten)]
    pub rates: HashMap<String, f64>,
}

impl PricesResponse {
    pub fn price_for(&self, currency: &str) -> Option<f64> {
        self.rates.get(&currency.to_uppercase()).copied()
    }
}

/// Response from GET /historical-price
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalPriceResponse {
    pub prices: Vec<HistoricalPricePoint>,
}

/// One historical price point, again one field per currency code
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalPricePoint {
    pub time: i64,
    #[serde(flatten)]
    pub rates: HashMap<String, f64>,
}

impl HistoricalPriceResponse {
    /// Price of the first returned point in the requested currency
    pub fn first_price(&self, currency: &str) -> Option<f64> {
        self.prices
            .first()
            .and_then(|point| point.rates.get(&currency.to_uppercase()).copied())
    }
}
