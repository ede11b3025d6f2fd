// In crates/engine/src/lib.rs

pub mod error;
pub mod feed;
pub mod history;
pub mod lifecycle;
pub mod prediction;
pub mod runner;
pub mod state;

use crate::feed::{LiveFeed, PriceFeed, SimulatedFeed};
use crate::runner::{Runner, RunnerSettings};
pub use crate::runner::RunnerHandle;
use crate::state::RunnerState;
use app_config::{FeedMode, Settings};
use chrono::Utc;
use events::WsMessage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use strategies::RandomSignalGenerator;
use tokio::sync::broadcast;

pub use error::{Error, Result};
pub use history::{PriceHistory, HISTORY_CAPACITY};
pub use lifecycle::{close_if_triggered, evaluate};
pub use prediction::{predict, PREDICTION_WINDOW};
pub use state::{LatestSignal, RunnerSnapshot};

/// Assembles a runner session from application settings.
pub struct Engine {
    settings: Settings,
    ws_tx: broadcast::Sender<WsMessage>,
}

impl Engine {
    pub fn new(settings: Settings, ws_tx: broadcast::Sender<WsMessage>) -> Self {
        Self { settings, ws_tx }
    }

    /// Builds the feed, generator and initial state, returning a runner ready
    /// to be spawned and the handle used to observe and steer it.
    pub fn build(&self) -> Result<(Runner, RunnerHandle)> {
        let feed_settings = &self.settings.feed;
        let signal_settings = &self.settings.signals;

        // Feed and signal generation draw from separate streams of the same seed.
        let (signal_rng, feed_rng) = match signal_settings.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };

        let feed: Box<dyn PriceFeed + Send> = match feed_settings.mode {
            FeedMode::Simulated => Box::new(SimulatedFeed::new(feed_rng, feed_settings.max_step)),
            FeedMode::Live => {
                let client = api_client::new(feed_settings)?;
                Box::new(LiveFeed::new(client, &feed_settings.base, &feed_settings.quote))
            }
        };

        let selected = strategies::resolve_selection(&signal_settings.default_strategies)?
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();

        let initial_price = core_types::price_from_f64(feed_settings.initial_price)?;
        let state = RunnerState::new(feed_settings.pair(), initial_price, selected, Utc::now());

        let runner_settings = RunnerSettings {
            price_interval: Duration::from_millis(feed_settings.poll_interval_ms),
            signal_interval: Duration::from_millis(signal_settings.interval_ms),
            signal_probability: signal_settings.probability.clamp(0.0, 1.0),
        };

        tracing::info!(
            pair = %state.pair,
            mode = ?feed_settings.mode,
            selected = ?state.selected,
            seeded = signal_settings.seed.is_some(),
            "Runner session assembled."
        );

        Ok(Runner::new(
            state,
            runner_settings,
            feed,
            Box::new(RandomSignalGenerator::new(signal_settings.generator.clone())),
            signal_rng,
            self.ws_tx.clone(),
        ))
    }
}
