use crate::instrument::TradingPair;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zigquant_decimal::Decimal;

/// Trailing-stop parameters: once price has moved `activation` in the
/// position's favour, the stop trails `distance` behind the best price seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStopConfig {
    pub activation: Decimal,
    pub distance: Decimal,
}

/// Per-strategy-instance configuration. `params` is an opaque bag of
/// strategy-specific tuning values (periods, thresholds) the host never
/// interprets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub pair: TradingPair,
    pub timeframe_ms: i64,
    /// Minimum required return to exit, keyed by position age in candles.
    /// Looked up by the greatest key not exceeding the current age.
    pub min_roi: Option<BTreeMap<u32, Decimal>>,
    pub trailing_stop: Option<TrailingStopConfig>,
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl StrategyConfig {
    pub fn new(pair: TradingPair, timeframe_ms: i64) -> Self {
        Self {
            pair,
            timeframe_ms,
            min_roi: None,
            trailing_stop: None,
            params: serde_json::Map::new(),
        }
    }

    /// The minimum ROI required to exit at the given position age, or `None`
    /// if no schedule is configured or the age precedes the first entry.
    pub fn min_roi_at(&self, age_in_candles: u32) -> Option<Decimal> {
        self.min_roi
            .as_ref()?
            .range(..=age_in_candles)
            .next_back()
            .map(|(_, roi)| *roi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_roi_schedule_picks_the_most_recent_applicable_entry() {
        let mut config = StrategyConfig::new(TradingPair::new("BTC", "USD"), 60_000);
        let mut schedule = BTreeMap::new();
        schedule.insert(0, Decimal::from_string("0.05").unwrap());
        schedule.insert(30, Decimal::from_string("0.02").unwrap());
        schedule.insert(60, Decimal::from_string("0.01").unwrap());
        config.min_roi = Some(schedule);

        assert_eq!(config.min_roi_at(10), Some(Decimal::from_string("0.05").unwrap()));
        assert_eq!(config.min_roi_at(30), Some(Decimal::from_string("0.02").unwrap()));
        assert_eq!(config.min_roi_at(100), Some(Decimal::from_string("0.01").unwrap()));
    }

    #[test]
    fn no_schedule_means_no_roi_floor() {
        let config = StrategyConfig::new(TradingPair::new("BTC", "USD"), 60_000);
        assert_eq!(config.min_roi_at(10), None);
    }
}
