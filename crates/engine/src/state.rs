// In crates/engine/src/state.rs

use crate::error::Result;
use crate::history::PriceHistory;
use crate::lifecycle;
use crate::prediction::predict;
use analytics::{AnalyticsEngine, SignalStats, UnrealizedPnl};
use chrono::{DateTime, Utc};
use core_types::{round_price, Prediction, PricePoint, Signal};
use rust_decimal::Decimal;
use serde::Serialize;

/// The complete mutable state of one runner session.
///
/// Owned by the runner loop; everyone else sees `RunnerSnapshot`s.
#[derive(Debug, Clone)]
pub struct RunnerState {
    pub pair: String,
    pub current_price: Decimal,
    pub history: PriceHistory,
    /// Every signal of the session, newest first.
    pub signals: Vec<Signal>,
    /// Active strategy ids, in the order they were selected.
    pub selected: Vec<String>,
    /// Message of the most recent feed failure, cleared by the next good price.
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// What a successful price observation changed.
#[derive(Debug, Clone)]
pub struct PriceOutcome {
    pub point: PricePoint,
    pub closed: Vec<Signal>,
}

impl RunnerState {
    /// Starts a session with one history point at `initial_price`.
    pub fn new(pair: String, initial_price: Decimal, selected: Vec<String>, now: DateTime<Utc>) -> Self {
        let current_price = round_price(initial_price);
        let mut history = PriceHistory::new();
        history.append(current_price, now);

        Self {
            pair,
            current_price,
            history,
            signals: Vec::new(),
            selected,
            last_error: None,
            updated_at: now,
        }
    }

    /// Records a new price and closes any signal whose stop or target it touches.
    pub fn apply_price(&mut self, price: Decimal, now: DateTime<Utc>) -> PriceOutcome {
        let price = round_price(price);
        self.current_price = price;
        let point = self.history.append(price, now).clone();
        let closed = lifecycle::evaluate_in_place(&mut self.signals, price);
        self.last_error = None;
        self.updated_at = now;

        PriceOutcome { point, closed }
    }

    /// Keeps price, history and signals as they are and remembers the failure.
    pub fn record_feed_error(&mut self, message: String, now: DateTime<Utc>) {
        self.last_error = Some(message);
        self.updated_at = now;
    }

    pub fn record_signal(&mut self, signal: Signal, now: DateTime<Utc>) {
        self.signals.insert(0, signal);
        self.updated_at = now;
    }

    /// Flips membership of `id` in the selection. Returns whether it is now selected.
    pub fn toggle_strategy(&mut self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        let strategy = strategies::find(id)
            .ok_or_else(|| strategies::Error::UnknownStrategy(id.to_string()))?;

        let selected = match self.selected.iter().position(|s| s == strategy.id) {
            Some(index) => {
                self.selected.remove(index);
                false
            }
            None => {
                self.selected.push(strategy.id.to_string());
                true
            }
        };
        self.updated_at = now;
        Ok(selected)
    }

    pub fn latest_signal(&self) -> Option<&Signal> {
        self.signals.first()
    }

    pub fn prediction(&self) -> Prediction {
        predict(&self.signals)
    }

    pub fn snapshot(&self, analytics: &AnalyticsEngine) -> RunnerSnapshot {
        RunnerSnapshot {
            pair: self.pair.clone(),
            current_price: self.current_price,
            price_history: self.history.to_vec(),
            signals: self.signals.clone(),
            latest_signal: self.latest_signal().map(|signal| LatestSignal {
                unrealized: analytics.unrealized(signal, self.current_price),
                signal: signal.clone(),
            }),
            selected_strategies: self.selected.clone(),
            prediction: self.prediction(),
            stats: analytics.calculate(&self.signals),
            last_error: self.last_error.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// The newest signal together with its mark-to-market.
#[derive(Debug, Clone, Serialize)]
pub struct LatestSignal {
    pub signal: Signal,
    pub unrealized: UnrealizedPnl,
}

/// A read-only copy of the runner state for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct RunnerSnapshot {
    pub pair: String,
    pub current_price: Decimal,
    pub price_history: Vec<PricePoint>,
    pub signals: Vec<Signal>,
    pub latest_signal: Option<LatestSignal>,
    pub selected_strategies: Vec<String>,
    pub prediction: Prediction,
    pub stats: SignalStats,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}
