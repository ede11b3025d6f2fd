// In crates/web-server/src/types.rs

use analytics::SignalStats;
use core_types::{Prediction, StrategyDescriptor};
use serde::Serialize;

/// A catalog entry together with whether it is currently active.
#[derive(Debug, Serialize)]
pub struct StrategyView {
    #[serde(flatten)]
    pub descriptor: StrategyDescriptor,
    pub selected: bool,
}

/// Response body of a toggle request.
#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub selected: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: Prediction,
    pub stats: SignalStats,
}
