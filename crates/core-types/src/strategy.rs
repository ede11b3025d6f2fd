use serde::Serialize;

/// A static description of a signal-producing strategy.
///
/// Descriptors are compile-time configuration: they carry no behaviour and are
/// never mutated. Signals keep a snapshot of the display `name`, not a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategyDescriptor {
    /// Stable identifier, e.g. "EMA_CROSSOVER".
    pub id: &'static str,
    /// Human readable name shown in the signal log.
    pub name: &'static str,
    pub description: &'static str,
    /// Hex colour used by charting front ends.
    pub color: &'static str,
}
