// In crates/strategies/src/types.rs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Price distances used when fabricating a signal, in quote units.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Maximum absolute offset of the entry from the current price.
    pub entry_jitter: f64,

    // Distance from entry to the protective stop.
    pub stop_min: f64,
    pub stop_max: f64,

    // Distance from entry to the profit target.
    pub target_min: f64,
    pub target_max: f64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            entry_jitter: 0.0005,
            stop_min: 0.0020,
            stop_max: 0.0030,
            target_min: 0.0030,
            target_max: 0.0050,
        }
    }
}

impl GeneratorSettings {
    /// Checks that every range is non-empty and survives pip-scale rounding.
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.entry_jitter,
            self.stop_min,
            self.stop_max,
            self.target_min,
            self.target_max,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::InvalidSettings(
                "all distances must be finite and non-negative".into(),
            ));
        }
        if self.stop_min > self.stop_max {
            return Err(Error::InvalidSettings(format!(
                "stop_min {} exceeds stop_max {}",
                self.stop_min, self.stop_max
            )));
        }
        if self.target_min > self.target_max {
            return Err(Error::InvalidSettings(format!(
                "target_min {} exceeds target_max {}",
                self.target_min, self.target_max
            )));
        }
        // Levels are rounded to 5 decimals, so anything under a tenth of a pip collapses.
        if self.stop_min < 0.00001 || self.target_min < 0.00001 {
            return Err(Error::InvalidSettings(
                "stop and target distances must be at least 0.00001".into(),
            ));
        }
        Ok(())
    }
}
