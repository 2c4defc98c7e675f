//! Candle and interval types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TickerError;

/// A single OHLC candle over a fixed time bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceCandle {
    /// Start time of the bucket
    pub timestamp: DateTime<Utc>,
    /// First price in the bucket
    pub open: f64,
    /// Highest price in the bucket
    pub high: f64,
    /// Lowest price in the bucket
    pub low: f64,
    /// Last price in the bucket
    pub close: f64,
    /// Traded volume, when the source supplies it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl PriceCandle {
    /// Candle with the volume column filled in, defaulting to zero when the
    /// source has no volume data.
    pub fn with_zero_volume(mut self) -> Self {
        self.volume.get_or_insert(0.0);
        self
    }
}

/// Time unit of an [`Interval`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Minute,
    Hour,
    Day,
}

impl IntervalUnit {
    fn seconds(self) -> u64 {
        match self {
            IntervalUnit::Minute => 60,
            IntervalUnit::Hour => 3600,
            IntervalUnit::Day => 86400,
        }
    }

    fn suffix(self) -> char {
        match self {
            IntervalUnit::Minute => 'm',
            IntervalUnit::Hour => 'h',
            IntervalUnit::Day => 'd',
        }
    }
}

/// A candle or sampling interval such as `5m`, `1h` or `2d`.
///
/// Parsing a malformed interval is a configuration error and fails hard,
/// unlike provider faults which degrade to "no data".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub value: u32,
    pub unit: IntervalUnit,
}

impl Interval {
    pub fn new(value: u32, unit: IntervalUnit) -> Self {
        Self { value, unit }
    }

    /// Interval width in seconds
    pub fn as_seconds(&self) -> u64 {
        u64::from(self.value) * self.unit.seconds()
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::new(1, IntervalUnit::Hour)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

impl FromStr for Interval {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TickerError::config(format!("Invalid interval format {}", s));
        let unit = match s.chars().last() {
            Some('m') => IntervalUnit::Minute,
            Some('h') => IntervalUnit::Hour,
            Some('d') => IntervalUnit::Day,
            _ => return Err(invalid()),
        };
        let value: u32 = s[..s.len() - 1].parse().map_err(|_| invalid())?;
        if value == 0 {
            return Err(invalid());
        }
        Ok(Interval::new(value, unit))
    }
}
