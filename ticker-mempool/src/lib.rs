//! mempool.space price-feed integration for the Bitcoin price ticker
//!
//! The explorer exposes a current price map and a per-timestamp historical
//! lookup; history is assembled point by point along a computed time vector.

pub mod client;
pub mod types;

pub use client::MempoolClient;
