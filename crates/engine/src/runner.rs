// In crates/engine/src/runner.rs

use crate::error::{Error, Result};
use crate::feed::PriceFeed;
use crate::state::{RunnerSnapshot, RunnerState};
use analytics::AnalyticsEngine;
use chrono::{DateTime, Utc};
use events::{WsFeedError, WsMessage, WsPredictionUpdate};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use strategies::SignalGenerator;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const COMMAND_BUFFER: usize = 32;

/// Timing and probability knobs for the runner loop.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub price_interval: Duration,
    pub signal_interval: Duration,
    /// Chance that a signal tick fabricates a signal.
    pub signal_probability: f64,
}

/// Inbound events from the presentation layer.
#[derive(Debug)]
pub enum Command {
    ToggleStrategy {
        id: String,
        reply: oneshot::Sender<Result<Vec<String>>>,
    },
}

/// A cloneable handle for reading snapshots and sending commands to a runner.
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Arc<RunnerSnapshot>>,
}

impl RunnerHandle {
    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<RunnerSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RunnerSnapshot>> {
        self.snapshots.clone()
    }

    /// Toggles a strategy and returns the resulting selection.
    pub async fn toggle_strategy(&self, id: &str) -> Result<Vec<String>> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::ToggleStrategy { id: id.to_string(), reply })
            .await
            .map_err(|_| Error::RunnerStopped)?;
        response.await.map_err(|_| Error::RunnerStopped)?
    }
}

/// The single writer of a session's state.
///
/// Price ticks, signal ticks and commands are handled one at a time on the
/// same task, so every signal transition of a tick sees the same price.
pub struct Runner {
    state: RunnerState,
    settings: RunnerSettings,
    feed: Box<dyn PriceFeed + Send>,
    generator: Box<dyn SignalGenerator + Send + Sync>,
    rng: StdRng,
    analytics: AnalyticsEngine,
    ws_tx: broadcast::Sender<WsMessage>,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<Arc<RunnerSnapshot>>,
}

impl Runner {
    pub fn new(
        state: RunnerState,
        settings: RunnerSettings,
        feed: Box<dyn PriceFeed + Send>,
        generator: Box<dyn SignalGenerator + Send + Sync>,
        rng: StdRng,
        ws_tx: broadcast::Sender<WsMessage>,
    ) -> (Self, RunnerHandle) {
        let analytics = AnalyticsEngine::new();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(state.snapshot(&analytics)));

        let runner = Self {
            state,
            settings,
            feed,
            generator,
            rng,
            analytics,
            ws_tx,
            commands: command_rx,
            snapshots: snapshot_tx,
        };
        let handle = RunnerHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (runner, handle)
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    /// The main, long-running loop. Returns once `shutdown` flips to `true`
    /// or its sender is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        tracing::info!(
            pair = %self.state.pair,
            feed = self.feed.name(),
            generator = self.generator.name(),
            "Starting strategy runner."
        );

        // The first tick fires one period after start.
        let mut price_ticker = interval_at(
            Instant::now() + self.settings.price_interval,
            self.settings.price_interval,
        );
        price_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut signal_ticker = interval_at(
            Instant::now() + self.settings.signal_interval,
            self.settings.signal_interval,
        );
        signal_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if *shutdown.borrow() {
            return Ok(());
        }

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = price_ticker.tick() => {
                    // A shutdown that arrives mid-fetch drops the fetch and its result.
                    tokio::select! {
                        _ = self.on_price_tick(Utc::now()) => {}
                        _ = shutdown.changed() => break,
                    }
                }
                _ = signal_ticker.tick() => {
                    self.on_signal_tick(Utc::now());
                }
                Some(command) = self.commands.recv() => {
                    self.on_command(command);
                }
            }
        }

        tracing::info!(pair = %self.state.pair, "Strategy runner stopped.");
        Ok(())
    }

    /// Pulls the next price from the feed and applies it.
    pub async fn on_price_tick(&mut self, now: DateTime<Utc>) {
        let previous = self.state.current_price;

        match self.feed.next_price(previous).await {
            Ok(price) => {
                let outcome = self.state.apply_price(price, now);
                tracing::debug!(pair = %self.state.pair, price = %price, "Price updated.");
                self.broadcast(WsMessage::PriceUpdate(outcome.point));

                for signal in &outcome.closed {
                    tracing::info!(
                        id = %signal.id,
                        strategy = %signal.strategy,
                        side = %signal.side,
                        result = %signal.result,
                        pnl = signal.pnl,
                        "Signal closed."
                    );
                    self.broadcast(WsMessage::SignalClosed(signal.clone()));
                }
                if !outcome.closed.is_empty() {
                    self.broadcast_prediction();
                }
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(
                    pair = %self.state.pair,
                    error = %message,
                    "Price feed failed, keeping last known price."
                );
                self.state.record_feed_error(message.clone(), now);
                self.broadcast(WsMessage::FeedError(WsFeedError { timestamp: now, message }));
            }
        }

        self.publish();
    }

    /// Possibly fabricates a signal for one of the selected strategies.
    ///
    /// Returns the new signal, if any.
    pub fn on_signal_tick(&mut self, now: DateTime<Utc>) -> Option<core_types::Signal> {
        if self.state.selected.is_empty() {
            return None;
        }
        if !self.rng.gen_bool(self.settings.signal_probability) {
            return None;
        }

        let index = self.rng.gen_range(0..self.state.selected.len());
        let strategy = strategies::find(&self.state.selected[index])?;
        let signal = self
            .generator
            .generate(strategy, self.state.current_price, now, &mut self.rng);

        tracing::info!(
            id = %signal.id,
            strategy = %signal.strategy,
            side = %signal.side,
            entry = %signal.entry,
            stop = %signal.stop,
            target = %signal.target,
            "Strategy generated a signal."
        );
        self.state.record_signal(signal.clone(), now);
        self.broadcast(WsMessage::SignalGenerated(signal.clone()));
        self.broadcast_prediction();
        self.publish();

        Some(signal)
    }

    /// Applies a command from the presentation layer.
    pub fn on_command(&mut self, command: Command) {
        match command {
            Command::ToggleStrategy { id, reply } => {
                let result = self
                    .state
                    .toggle_strategy(&id, Utc::now())
                    .map(|_| self.state.selected.clone());

                match &result {
                    Ok(selected) => {
                        tracing::info!(id = %id, selected = ?selected, "Strategy selection changed.");
                        self.broadcast(WsMessage::SelectionChanged(selected.clone()));
                        self.publish();
                    }
                    Err(e) => tracing::warn!(id = %id, error = %e, "Rejected strategy toggle."),
                }
                // The requester may have gone away; nothing to do then.
                let _ = reply.send(result);
            }
        }
    }

    fn broadcast_prediction(&self) {
        self.broadcast(WsMessage::PredictionUpdate(WsPredictionUpdate {
            prediction: self.state.prediction(),
            stats: self.analytics.calculate(&self.state.signals),
        }));
    }

    fn broadcast(&self, message: WsMessage) {
        // No subscribers is not an error.
        let _ = self.ws_tx.send(message);
    }

    fn publish(&self) {
        self.snapshots
            .send_replace(Arc::new(self.state.snapshot(&self.analytics)));
    }
}
