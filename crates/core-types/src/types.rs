// In crates/core-types/src/types.rs

use crate::error::{Error, Result};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quotes are kept at pip-scale precision (5 decimals for EUR/USD).
pub const PRICE_DECIMALS: u32 = 5;

/// Rounds a price to pip-scale precision, half away from zero.
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a raw floating point quote into a rounded `Decimal` price.
///
/// NaN and infinite values are rejected.
pub fn price_from_f64(value: f64) -> Result<Decimal> {
    Decimal::from_f64(value)
        .map(round_price)
        .ok_or_else(|| Error::InvalidPrice(value.to_string()))
}

/// Represents the direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStatus {
    Open,
    Closed,
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStatus::Open => write!(f, "OPEN"),
            SignalStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// The terminal outcome of a signal. `Pending` until the signal closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalResult {
    #[serde(rename = "WIN")]
    Win,
    #[serde(rename = "LOSS")]
    Loss,
    #[serde(rename = "NONE")]
    Pending,
}

impl fmt::Display for SignalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalResult::Win => write!(f, "WIN"),
            SignalResult::Loss => write!(f, "LOSS"),
            SignalResult::Pending => write!(f, "-"),
        }
    }
}

/// A fabricated trade recommendation and its lifecycle state.
///
/// Everything up to `target` is fixed when the signal is generated. Only
/// `status`, `result` and `pnl` change, and only once (OPEN -> CLOSED).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    /// Wall-clock time of generation, formatted `HH:MM:SS`.
    pub time: String,
    /// Generation time in epoch milliseconds.
    pub timestamp: i64,
    /// Display name of the originating strategy at generation time.
    pub strategy: String,
    pub strategy_id: String,
    pub side: Side,
    pub entry: Decimal,
    pub stop: Decimal,
    pub target: Decimal,
    pub status: SignalStatus,
    pub result: SignalResult,
    /// Realized P&L as a percentage of `entry`. Zero while open.
    pub pnl: f64,
}

impl Signal {
    pub fn is_open(&self) -> bool {
        self.status == SignalStatus::Open
    }
}

/// One observation in the rolling price history used for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Wall-clock time of the observation, formatted `HH:MM:SS`.
    pub time: String,
    /// Observation time in epoch milliseconds.
    pub timestamp: i64,
    pub price: Decimal,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// Coarse market sentiment derived from recent signal sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Prediction {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Bullish => write!(f, "Bullish"),
            Prediction::Bearish => write!(f, "Bearish"),
            Prediction::Neutral => write!(f, "Neutral"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_price_uses_five_decimals() {
        let raw = Decimal::from_str("1.0850049").unwrap();
        assert_eq!(round_price(raw), Decimal::from_str("1.08500").unwrap());

        let midpoint = Decimal::from_str("1.085005").unwrap();
        assert_eq!(round_price(midpoint), Decimal::from_str("1.08501").unwrap());
    }

    #[test]
    fn price_from_f64_rejects_non_finite_values() {
        assert!(price_from_f64(f64::NAN).is_err());
        assert!(price_from_f64(f64::INFINITY).is_err());
        assert_eq!(price_from_f64(1.16).unwrap(), Decimal::from_str("1.16").unwrap());
    }

    #[test]
    fn enums_serialize_with_wire_names() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&SignalStatus::Closed).unwrap(), "\"CLOSED\"");
        assert_eq!(serde_json::to_string(&SignalResult::Pending).unwrap(), "\"NONE\"");
        assert_eq!(serde_json::to_string(&Prediction::Bearish).unwrap(), "\"BEARISH\"");
    }
}
