// --- WebSocket Message Structures ---

use analytics::SignalStats;
use chrono::{DateTime, Utc};
use core_types::{Prediction, PricePoint, Signal};
use serde::Serialize;

/// Represents a log message event to be sent to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct WsLogMessage {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

/// A feed failure. The runner keeps serving the last known price.
#[derive(Debug, Clone, Serialize)]
pub struct WsFeedError {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// The derived sentiment and statistics after the signal log changed.
#[derive(Debug, Clone, Serialize)]
pub struct WsPredictionUpdate {
    pub prediction: Prediction,
    pub stats: SignalStats,
}

/// The top-level WebSocket message enum.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum WsMessage {
    Log(WsLogMessage),
    /// A new observation was appended to the price history.
    PriceUpdate(PricePoint),
    SignalGenerated(Signal),
    /// An open signal touched its stop or target.
    SignalClosed(Signal),
    PredictionUpdate(WsPredictionUpdate),
    FeedError(WsFeedError),
    /// The set of active strategy ids after a toggle.
    SelectionChanged(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_tagged_with_type_and_payload() {
        let msg = WsMessage::SelectionChanged(vec!["EMA_CROSSOVER".into()]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "SelectionChanged");
        assert_eq!(json["payload"][0], "EMA_CROSSOVER");
    }

    #[test]
    fn prediction_update_serializes_label() {
        let msg = WsMessage::PredictionUpdate(WsPredictionUpdate {
            prediction: Prediction::Bullish,
            stats: SignalStats::default(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["payload"]["prediction"], "BULLISH");
        assert_eq!(json["payload"]["stats"]["total"], 0);
    }
}
