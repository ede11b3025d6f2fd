use core_types::{Prediction, Side, Signal};

/// Number of most recent signals considered.
pub const PREDICTION_WINDOW: usize = 5;

/// One side must outnumber the other by more than this factor.
const DOMINANCE_RATIO: f64 = 1.5;

/// Derives market sentiment from the sides of the most recent signals.
///
/// `signals` must be ordered newest first.
pub fn predict(signals: &[Signal]) -> Prediction {
    let window = &signals[..signals.len().min(PREDICTION_WINDOW)];
    if window.is_empty() {
        return Prediction::Neutral;
    }

    let buy = window.iter().filter(|s| s.side == Side::Buy).count() as f64;
    let sell = window.iter().filter(|s| s.side == Side::Sell).count() as f64;

    if buy > sell * DOMINANCE_RATIO {
        Prediction::Bullish
    } else if sell > buy * DOMINANCE_RATIO {
        Prediction::Bearish
    } else {
        Prediction::Neutral
    }
}
