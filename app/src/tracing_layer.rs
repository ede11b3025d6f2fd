// In app/src/tracing_layer.rs

use chrono::Utc;
use events::{WsLogMessage, WsMessage};
use tokio::sync::broadcast;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;

/// Forwards every log event to WebSocket clients as a `WsMessage::Log`.
pub struct WsBroadcastLayer {
    tx: broadcast::Sender<WsMessage>,
}

impl WsBroadcastLayer {
    pub fn new(tx: broadcast::Sender<WsMessage>) -> Self {
        Self { tx }
    }
}

impl<S> Layer<S> for WsBroadcastLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = LogMessageVisitor::default();
        event.record(&mut visitor);
        let log_message = WsLogMessage {
            timestamp: Utc::now(),
            level: event.metadata().level().to_string(),
            message: visitor.render(),
        };
        // No live clients is fine; the replay recorder is a subscriber too.
        let _ = self.tx.send(WsMessage::Log(log_message));
    }
}

/// Captures the `message` field of an event plus its structured fields.
#[derive(Default)]
struct LogMessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl LogMessageVisitor {
    fn render(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl tracing::field::Visit for LogMessageVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
