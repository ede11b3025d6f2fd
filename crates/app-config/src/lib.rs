// In crates/app-config/src/lib.rs

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, FeedMode, FeedSettings, ServerSettings, Settings, SignalSettings};

/// Loads the application settings from the `config/` directory.
pub fn load_settings() -> Result<Settings> {
    load_settings_from("config")
}

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings_from(dir: &str) -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let builder = Config::builder()
        // 1. Load the base configuration file.
        .add_source(File::with_name(&format!("{}/base", dir)))
        // 2. Load the environment-specific configuration file.
        .add_source(File::with_name(&format!("{}/{}", dir, environment)).required(false))
        // 3. Load settings from environment variables (e.g., `APP_FEED__MODE=live`).
        // The prefix is `APP`, separator is `__`.
        .add_source(Environment::with_prefix("APP").separator("__"));

    build_settings(builder)
}

/// Builds, deserializes and validates settings from a prepared builder.
pub fn build_settings(builder: ConfigBuilder<DefaultState>) -> Result<Settings> {
    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Settings> {
        build_settings(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings.feed.mode, FeedMode::Simulated);
        assert_eq!(settings.feed.pair(), "EUR/USD");
        assert_eq!(settings.feed.poll_interval_ms, 2_000);
        assert_eq!(settings.signals.interval_ms, 5_000);
        assert_eq!(settings.signals.default_strategies, vec!["EMA_CROSSOVER".to_string()]);
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn sections_override_defaults() {
        let settings = from_toml(
            r#"
            [feed]
            mode = "live"
            base = "gbp"
            quote = "jpy"
            initial_price = 190.5

            [signals]
            probability = 1.0
            default_strategies = ["MACD_SIGNAL", "TREND_FOLLOW"]
            seed = 42

            [signals.generator]
            stop_min = 0.001
            "#,
        )
        .unwrap();

        assert_eq!(settings.feed.mode, FeedMode::Live);
        assert_eq!(settings.feed.pair(), "GBP/JPY");
        assert_eq!(settings.signals.seed, Some(42));
        assert_eq!(settings.signals.default_strategies.len(), 2);
        assert_eq!(settings.signals.generator.stop_min, 0.001);
        assert_eq!(settings.signals.generator.stop_max, 0.0030);
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let err = from_toml("[signals]\nprobability = 1.5").unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[test]
    fn unknown_default_strategy_is_rejected() {
        let err = from_toml("[signals]\ndefault_strategies = [\"ICHIMOKU\"]").unwrap_err();
        assert!(matches!(err, Error::StrategyError(_)));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(from_toml("[feed]\npoll_interval_ms = 0").is_err());
    }
}
