// In crates/app-config/src/types.rs

use crate::error::{Error, Result};
use serde::Deserialize;
use strategies::types::GeneratorSettings;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Where prices come from and how often they are polled.
    pub feed: FeedSettings,
    /// How and how often signals are fabricated.
    pub signals: SignalSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Rejects settings the runner cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.feed.poll_interval_ms == 0 || self.signals.interval_ms == 0 {
            return Err(Error::Invalid("tick intervals must be greater than zero".into()));
        }
        if !(0.0..=1.0).contains(&self.signals.probability) {
            return Err(Error::Invalid(format!(
                "signals.probability must be within [0, 1], got {}",
                self.signals.probability
            )));
        }
        if !self.feed.initial_price.is_finite() || self.feed.initial_price <= 0.0 {
            return Err(Error::Invalid(format!(
                "feed.initial_price must be a positive number, got {}",
                self.feed.initial_price
            )));
        }
        if self.feed.base.trim().is_empty() || self.feed.quote.trim().is_empty() {
            return Err(Error::Invalid("feed.base and feed.quote must be set".into()));
        }

        strategies::resolve_selection(&self.signals.default_strategies)?;
        self.signals.generator.validate()?;
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            environment: "development".into(),
            log_level: "info".into(),
        }
    }
}

/// Which implementation backs the price feed.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    /// Random walk around the previous price.
    #[default]
    Simulated,
    /// Periodic fetch from the currency-rate API.
    Live,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FeedSettings {
    pub mode: FeedMode,
    /// Base currency code, e.g. "EUR".
    pub base: String,
    /// Quote currency code, e.g. "USD".
    pub quote: String,
    /// The REST base URL of the currency-rate service.
    pub base_url: String,
    /// Some rate providers require an access key.
    pub access_key: Option<String>,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// Price the session starts from before the first observation.
    pub initial_price: f64,
    /// Maximum absolute step of the simulated random walk.
    pub max_step: f64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            mode: FeedMode::Simulated,
            base: "EUR".into(),
            quote: "USD".into(),
            base_url: "https://api.exchangerate.host".into(),
            access_key: None,
            poll_interval_ms: 2_000,
            request_timeout_ms: 10_000,
            initial_price: 1.0850,
            max_step: 0.0001,
        }
    }
}

impl FeedSettings {
    /// The pair label, e.g. "EUR/USD".
    pub fn pair(&self) -> String {
        format!("{}/{}", self.base.to_uppercase(), self.quote.to_uppercase())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SignalSettings {
    pub interval_ms: u64,
    /// Chance that a signal tick fabricates a signal.
    pub probability: f64,
    /// Strategy ids selected when the session starts.
    pub default_strategies: Vec<String>,
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
    pub generator: GeneratorSettings,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            probability: 0.2,
            default_strategies: vec![strategies::DEFAULT_STRATEGY_ID.to_string()],
            seed: None,
            generator: GeneratorSettings::default(),
        }
    }
}
