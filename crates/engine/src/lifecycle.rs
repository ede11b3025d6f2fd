//! Open -> closed transitions of signals as prices arrive.
//!
//! Target is checked before stop, so a tick that satisfies both closes the
//! signal as a win. With correctly generated levels that cannot happen.

use core_types::{Side, Signal, SignalResult, SignalStatus};
use rust_decimal::prelude::*;

/// Returns the closed version of `signal` if `price` touches its target or stop.
///
/// Closed signals are never re-evaluated and yield `None`.
pub fn close_if_triggered(signal: &Signal, price: Decimal) -> Option<Signal> {
    if !signal.is_open() {
        return None;
    }

    let (result, exit) = match signal.side {
        Side::Buy if price >= signal.target => (SignalResult::Win, signal.target),
        Side::Sell if price <= signal.target => (SignalResult::Win, signal.target),
        Side::Buy if price <= signal.stop => (SignalResult::Loss, signal.stop),
        Side::Sell if price >= signal.stop => (SignalResult::Loss, signal.stop),
        _ => return None,
    };

    Some(Signal {
        status: SignalStatus::Closed,
        result,
        pnl: realized_pnl(signal.side, signal.entry, exit),
        ..signal.clone()
    })
}

/// Evaluates every signal against one price observation.
///
/// The output has the same length and order as the input; each element is
/// either unchanged or its closed version.
pub fn evaluate(signals: &[Signal], price: Decimal) -> Vec<Signal> {
    signals
        .iter()
        .map(|s| close_if_triggered(s, price).unwrap_or_else(|| s.clone()))
        .collect()
}

/// Closes triggered signals in place and returns copies of the ones that closed.
pub fn evaluate_in_place(signals: &mut [Signal], price: Decimal) -> Vec<Signal> {
    let mut closed = Vec::new();
    for signal in signals.iter_mut() {
        if let Some(updated) = close_if_triggered(signal, price) {
            *signal = updated.clone();
            closed.push(updated);
        }
    }
    closed
}

/// Signed P&L of a move from `entry` to `exit`, as a percentage of `entry`.
pub fn realized_pnl(side: Side, entry: Decimal, exit: Decimal) -> f64 {
    let diff = match side {
        Side::Buy => exit - entry,
        Side::Sell => entry - exit,
    };
    diff.checked_div(entry)
        .and_then(|ratio| (ratio * Decimal::ONE_HUNDRED).to_f64())
        .unwrap_or(0.0)
}
