//! Price orchestration for the Bitcoin price ticker
//!
//! Holds the provider rotation, the shared time series and the last
//! unified price record, and decides when a refresh actually talks to an
//! upstream.

pub mod format;
pub mod price_service;

pub use format::format_price;
pub use price_service::{PriceService, PriceServiceConfig};
