use crate::types::{SignalStats, UnrealizedPnl};
use core_types::{Signal, SignalResult};
use rust_decimal::prelude::*;

const PIPS_PER_UNIT: i64 = 10_000;

/// The engine responsible for calculating summary metrics from the signal log.
#[derive(Default)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates open/closed counts, win rate and total P&L.
    pub fn calculate(&self, signals: &[Signal]) -> SignalStats {
        let mut stats = SignalStats {
            total: signals.len(),
            ..SignalStats::default()
        };

        for signal in signals {
            if signal.is_open() {
                stats.open += 1;
                continue;
            }
            stats.closed += 1;
            stats.total_pnl += signal.pnl;
            match signal.result {
                SignalResult::Win => stats.wins += 1,
                SignalResult::Loss => stats.losses += 1,
                SignalResult::Pending => {}
            }
        }

        if stats.closed > 0 {
            stats.win_rate = stats.wins as f64 / stats.closed as f64 * 100.0;
        }

        stats
    }

    /// Unrealized P&L of `signal` if it were marked at `current_price`.
    pub fn unrealized(&self, signal: &Signal, current_price: Decimal) -> UnrealizedPnl {
        let diff = current_price - signal.entry;
        let percent = diff
            .checked_div(signal.entry)
            .and_then(|ratio| (ratio * Decimal::ONE_HUNDRED).to_f64())
            .unwrap_or(0.0);

        UnrealizedPnl {
            pips: (diff * Decimal::from(PIPS_PER_UNIT)).to_f64().unwrap_or(0.0),
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Side, SignalStatus};
    use rust_decimal_macros::dec;

    fn signal(status: SignalStatus, result: SignalResult, pnl: f64) -> Signal {
        Signal {
            id: "TREND_FOLLOW-1-1".into(),
            time: "10:00:00".into(),
            timestamp: 1,
            strategy: "Trend Following".into(),
            strategy_id: "TREND_FOLLOW".into(),
            side: Side::Buy,
            entry: dec!(1.08500),
            stop: dec!(1.08300),
            target: dec!(1.08800),
            status,
            result,
            pnl,
        }
    }

    #[test]
    fn empty_log_has_zero_stats() {
        let stats = AnalyticsEngine::new().calculate(&[]);
        assert_eq!(stats, SignalStats::default());
    }

    #[test]
    fn counts_wins_losses_and_open() {
        let signals = vec![
            signal(SignalStatus::Open, SignalResult::Pending, 0.0),
            signal(SignalStatus::Closed, SignalResult::Win, 0.3),
            signal(SignalStatus::Closed, SignalResult::Win, 0.2),
            signal(SignalStatus::Closed, SignalResult::Loss, -0.25),
        ];

        let stats = AnalyticsEngine::new().calculate(&signals);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.open, 1);
        assert_eq!(stats.closed, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert!((stats.win_rate - 66.666_666).abs() < 1e-3);
        assert!((stats.total_pnl - 0.25).abs() < 1e-9);
    }

    #[test]
    fn unrealized_is_price_minus_entry() {
        let s = signal(SignalStatus::Open, SignalResult::Pending, 0.0);
        let pnl = AnalyticsEngine::new().unrealized(&s, dec!(1.08620));

        assert!((pnl.pips - 12.0).abs() < 1e-9);
        assert!((pnl.percent - 0.110_599).abs() < 1e-5);
    }
}
