// In crates/strategies/src/generator.rs

use crate::types::GeneratorSettings;
use crate::SignalGenerator;
use chrono::{DateTime, Utc};
use core_types::{round_price, Side, Signal, SignalResult, SignalStatus, StrategyDescriptor};
use rand::{Rng, RngCore};
use rust_decimal::Decimal;

// Random distances are drawn on a 1e-8 grid, three orders finer than the stored precision.
const DRAW_SCALE: u32 = 8;

fn to_units(distance: f64) -> i64 {
    (distance * 10f64.powi(DRAW_SCALE as i32)).round() as i64
}

/// Draws a uniform distance in `[min, max]`.
fn draw(rng: &mut dyn RngCore, min: f64, max: f64) -> Decimal {
    Decimal::new(rng.gen_range(to_units(min)..=to_units(max)), DRAW_SCALE)
}

/// Fabricates signals with a random side and randomly spaced stop/target levels.
#[derive(Debug, Clone, Default)]
pub struct RandomSignalGenerator {
    settings: GeneratorSettings,
}

impl RandomSignalGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }
}

impl SignalGenerator for RandomSignalGenerator {
    fn name(&self) -> &'static str {
        "RandomSignalGenerator"
    }

    fn generate(
        &self,
        strategy: &StrategyDescriptor,
        current_price: Decimal,
        now: DateTime<Utc>,
        rng: &mut dyn RngCore,
    ) -> Signal {
        let s = &self.settings;

        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let entry = round_price(current_price + draw(rng, -s.entry_jitter, s.entry_jitter));
        let stop_distance = draw(rng, s.stop_min, s.stop_max);
        let target_distance = draw(rng, s.target_min, s.target_max);

        let (stop, target) = match side {
            Side::Buy => (entry - stop_distance, entry + target_distance),
            Side::Sell => (entry + stop_distance, entry - target_distance),
        };

        let timestamp = now.timestamp_millis();

        Signal {
            id: format!("{}-{}-{}", strategy.id, timestamp, rng.next_u32()),
            time: now.format("%H:%M:%S").to_string(),
            timestamp,
            strategy: strategy.name.to_string(),
            strategy_id: strategy.id.to_string(),
            side,
            entry,
            stop: round_price(stop),
            target: round_price(target),
            status: SignalStatus::Open,
            result: SignalResult::Pending,
            pnl: 0.0,
        }
    }
}
