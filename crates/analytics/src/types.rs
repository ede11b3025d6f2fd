// In crates/analytics/src/types.rs

use serde::{Deserialize, Serialize};

/// Aggregate counters over the session's signal log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SignalStats {
    pub open: usize,
    pub closed: usize,
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    /// Wins as a percentage of closed signals; 0 when nothing has closed.
    pub win_rate: f64,
    /// Sum of realized P&L percentages over closed signals.
    pub total_pnl: f64,
}

/// Mark-to-market of a single signal against the current price.
///
/// Measured as `price - entry` regardless of side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct UnrealizedPnl {
    pub pips: f64,
    pub percent: f64,
}
