//! Bit2Me exchange integration for the Bitcoin price ticker
//!
//! This crate provides a client for the Bit2Me gateway API. Bit2Me quotes
//! BTC in US dollars only, so fiat prices are derived through a cached
//! fiat-rate table.

pub mod client;
pub mod rate;
pub mod types;

pub use client::{ApiCredentials, Bit2MeClient};
pub use rate::RateCache;
