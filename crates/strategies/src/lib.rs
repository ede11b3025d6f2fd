// In crates/strategies/src/lib.rs

use chrono::{DateTime, Utc};
use core_types::{Signal, StrategyDescriptor};
use rand::RngCore;
use rust_decimal::Decimal;

pub mod catalog;
pub mod error;
pub mod generator;
pub mod types;

pub use catalog::{find, resolve_selection, DEFAULT_STRATEGY_ID, STRATEGIES};
pub use error::{Error, Result};
pub use generator::RandomSignalGenerator;

/// The universal interface for a signal generator.
///
/// A generator fabricates a new OPEN `Signal` for a strategy at the current price.
/// All randomness is drawn from the supplied `rng`, so callers decide whether
/// the output is reproducible.
pub trait SignalGenerator {
    /// The name of the generator.
    fn name(&self) -> &'static str;

    fn generate(
        &self,
        strategy: &StrategyDescriptor,
        current_price: Decimal,
        now: DateTime<Utc>,
        rng: &mut dyn RngCore,
    ) -> Signal;
}
