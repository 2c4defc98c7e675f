//! CoinGecko integration for the Bitcoin price ticker
//!
//! This crate provides a client for the CoinGecko market-data API: spot
//! prices, market-chart history and native OHLC candles.

pub mod client;
pub mod types;

pub use client::CoinGeckoClient;
