// In crates/core-types/src/lib.rs

pub mod error;
pub mod strategy;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use error::{Error, Result};
pub use strategy::StrategyDescriptor;
pub use types::{
    price_from_f64, round_price, Prediction, PricePoint, Side, Signal, SignalResult, SignalStatus,
    PRICE_DECIMALS,
};
