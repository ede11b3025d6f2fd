//! The fixed catalog of strategies a user can select.

use crate::error::{Error, Result};
use core_types::StrategyDescriptor;

/// The strategy selected when nothing else is configured.
pub const DEFAULT_STRATEGY_ID: &str = "EMA_CROSSOVER";

pub const STRATEGIES: [StrategyDescriptor; 6] = [
    StrategyDescriptor {
        id: "EMA_CROSSOVER",
        name: "EMA Crossover",
        description: "Fast EMA crosses slow EMA",
        color: "#3b82f6",
    },
    StrategyDescriptor {
        id: "RSI_DIVERGENCE",
        name: "RSI Divergence",
        description: "RSI shows divergence from price",
        color: "#10b981",
    },
    StrategyDescriptor {
        id: "MACD_SIGNAL",
        name: "MACD Signal",
        description: "MACD crosses signal line",
        color: "#f59e0b",
    },
    StrategyDescriptor {
        id: "BOLLINGER_BOUNCE",
        name: "Bollinger Bounce",
        description: "Price bounces off Bollinger bands",
        color: "#8b5cf6",
    },
    StrategyDescriptor {
        id: "SUPPORT_RESISTANCE",
        name: "Support/Resistance",
        description: "Key level breakout or bounce",
        color: "#ec4899",
    },
    StrategyDescriptor {
        id: "TREND_FOLLOW",
        name: "Trend Following",
        description: "Follow the dominant trend",
        color: "#06b6d4",
    },
];

/// Looks up a strategy by its exact id.
pub fn find(id: &str) -> Option<&'static StrategyDescriptor> {
    STRATEGIES.iter().find(|s| s.id == id)
}

/// Resolves a configured list of strategy ids into catalog entries.
///
/// Order is preserved and duplicates are collapsed. Any id that is not in the
/// catalog fails the whole selection.
pub fn resolve_selection(ids: &[String]) -> Result<Vec<&'static StrategyDescriptor>> {
    let mut selected: Vec<&'static StrategyDescriptor> = Vec::with_capacity(ids.len());

    for id in ids {
        let strategy = find(id).ok_or_else(|| Error::UnknownStrategy(id.clone()))?;
        if selected.iter().any(|s| s.id == strategy.id) {
            tracing::warn!(id = %id, "Strategy listed twice in selection, ignoring duplicate.");
            continue;
        }
        selected.push(strategy);
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_six_unique_ids() {
        let mut ids: Vec<_> = STRATEGIES.iter().map(|s| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
        assert!(find(DEFAULT_STRATEGY_ID).is_some());
    }

    #[test]
    fn find_is_exact_match() {
        assert_eq!(find("MACD_SIGNAL").map(|s| s.name), Some("MACD Signal"));
        assert!(find("macd_signal").is_none());
    }

    #[test]
    fn resolve_selection_keeps_order_and_drops_duplicates() {
        let ids = vec![
            "TREND_FOLLOW".to_string(),
            "EMA_CROSSOVER".to_string(),
            "TREND_FOLLOW".to_string(),
        ];
        let resolved = resolve_selection(&ids).unwrap();
        let names: Vec<_> = resolved.iter().map(|s| s.id).collect();
        assert_eq!(names, vec!["TREND_FOLLOW", "EMA_CROSSOVER"]);
    }

    #[test]
    fn resolve_selection_rejects_unknown_ids() {
        let ids = vec!["EMA_CROSSOVER".to_string(), "ICHIMOKU".to_string()];
        assert_eq!(
            resolve_selection(&ids),
            Err(Error::UnknownStrategy("ICHIMOKU".into()))
        );
    }
}
