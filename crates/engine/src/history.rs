// In crates/engine/src/history.rs

use chrono::{DateTime, Utc};
use core_types::{round_price, PricePoint};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// The number of price points kept for charting.
pub const HISTORY_CAPACITY: usize = 50;

/// A bounded, chronologically ordered buffer of price points.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    points: VecDeque<PricePoint>,
    capacity: usize,
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(1),
        }
    }

    /// Appends an observation and drops the oldest points beyond capacity.
    ///
    /// The new point opens at the previous close; its high and low span the
    /// previous close and `latest_price`.
    pub fn append(&mut self, latest_price: Decimal, at: DateTime<Utc>) -> &PricePoint {
        let latest = round_price(latest_price);
        let open = self.points.back().map(|p| p.close).unwrap_or(latest);

        self.points.push_back(PricePoint {
            time: at.format("%H:%M:%S").to_string(),
            timestamp: at.timestamp_millis(),
            price: latest,
            open,
            high: open.max(latest),
            low: open.min(latest),
            close: latest,
        });
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }

        // Just pushed, so never empty.
        &self.points[self.points.len() - 1]
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> {
        self.points.iter()
    }

    /// Copies the buffer out, oldest first.
    pub fn to_vec(&self) -> Vec<PricePoint> {
        self.points.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap()
    }

    #[test]
    fn first_point_is_flat() {
        let mut history = PriceHistory::new();
        let point = history.append(dec!(1.08500), start()).clone();

        assert_eq!(point.open, dec!(1.085));
        assert_eq!(point.high, dec!(1.085));
        assert_eq!(point.low, dec!(1.085));
        assert_eq!(point.close, dec!(1.085));
        assert_eq!(point.price, dec!(1.085));
        assert_eq!(point.time, "08:00:00");
    }

    #[test]
    fn next_point_opens_at_previous_close() {
        let mut history = PriceHistory::new();
        history.append(dec!(1.08500), start());
        let down = history.append(dec!(1.08470), start() + Duration::seconds(2)).clone();

        assert_eq!(down.open, dec!(1.08500));
        assert_eq!(down.high, dec!(1.08500));
        assert_eq!(down.low, dec!(1.08470));
        assert_eq!(down.close, dec!(1.08470));

        let up = history.append(dec!(1.08490), start() + Duration::seconds(4)).clone();
        assert_eq!(up.open, dec!(1.08470));
        assert_eq!(up.high, dec!(1.08490));
        assert_eq!(up.low, dec!(1.08470));
    }

    #[test]
    fn values_are_rounded_to_five_decimals() {
        let mut history = PriceHistory::new();
        let point = history.append(dec!(1.0850049), start());
        assert_eq!(point.close, dec!(1.08500));
        assert_eq!(point.close.scale(), 5);
    }

    #[test]
    fn keeps_latest_fifty_in_order() {
        let mut history = PriceHistory::new();
        for i in 0..60i64 {
            let price = dec!(1.0) + Decimal::new(i, 5);
            history.append(price, start() + Duration::seconds(i));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        let points = history.to_vec();
        // The 11th inserted point (index 10) is now the oldest.
        assert_eq!(points[0].close, dec!(1.00010));
        assert_eq!(points[49].close, dec!(1.00059));
        assert!(points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}
