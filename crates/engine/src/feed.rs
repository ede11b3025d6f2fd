// In crates/engine/src/feed.rs

use crate::error::Result;
use api_client::ApiClient;
use async_trait::async_trait;
use core_types::{round_price, PRICE_DECIMALS};
use rand::rngs::StdRng;
use rand::Rng;
use rust_decimal::Decimal;

/// The universal interface for a source of price observations.
///
/// Every implementation answers one question: given the previous price, what
/// is the next one? Failures leave it to the caller to keep the old price.
#[async_trait]
pub trait PriceFeed: Send {
    /// The name of the feed (e.g., "SimulatedFeed", "LiveFeed").
    fn name(&self) -> &'static str;

    async fn next_price(&mut self, previous: Decimal) -> Result<Decimal>;
}

// Steps are drawn on a 1e-8 grid before rounding back to pip scale.
const STEP_SCALE: u32 = 8;

/// A random walk around the previous price.
pub struct SimulatedFeed {
    rng: StdRng,
    max_step_units: i64,
}

impl SimulatedFeed {
    /// `max_step` is the largest absolute move per tick, in quote units.
    pub fn new(rng: StdRng, max_step: f64) -> Self {
        let max_step_units = (max_step.abs() * 10f64.powi(STEP_SCALE as i32)).round() as i64;
        Self { rng, max_step_units }
    }
}

#[async_trait]
impl PriceFeed for SimulatedFeed {
    fn name(&self) -> &'static str {
        "SimulatedFeed"
    }

    async fn next_price(&mut self, previous: Decimal) -> Result<Decimal> {
        let step = Decimal::new(
            self.rng.gen_range(-self.max_step_units..=self.max_step_units),
            STEP_SCALE,
        );
        // Prices stay strictly positive.
        let floor = Decimal::new(1, PRICE_DECIMALS);
        Ok(round_price(previous + step).max(floor))
    }
}

/// Polls the currency-rate API for the latest `base/quote` rate.
pub struct LiveFeed {
    client: ApiClient,
    base: String,
    quote: String,
}

impl LiveFeed {
    pub fn new(client: ApiClient, base: &str, quote: &str) -> Self {
        Self {
            client,
            base: base.to_string(),
            quote: quote.to_string(),
        }
    }
}

#[async_trait]
impl PriceFeed for LiveFeed {
    fn name(&self) -> &'static str {
        "LiveFeed"
    }

    async fn next_price(&mut self, _previous: Decimal) -> Result<Decimal> {
        let price = self.client.fetch_latest_price(&self.base, &self.quote).await?;
        Ok(price)
    }
}
