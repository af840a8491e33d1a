use crate::strategy::Strategy;
use zigquant_core::candle::Candles;
use zigquant_core::instrument::Side;
use zigquant_core::position::Position;
use zigquant_core::signal::{Signal, SignalType};
use zigquant_core::strategy_config::StrategyConfig;
use zigquant_decimal::Decimal;
use zigquant_indicator::{hash_params, IndicatorCache, Sma};

/// Enters long only when three SMAs of increasing period are fully stacked
/// fast > medium > slow (a trend-strength filter absent from the plain
/// dual-MA cross), exits when the stack breaks.
pub struct TripleMovingAverageStrategy {
    config: StrategyConfig,
    fast: Sma,
    medium: Sma,
    slow: Sma,
}

impl TripleMovingAverageStrategy {
    pub fn new(config: StrategyConfig, fast_period: usize, medium_period: usize, slow_period: usize) -> Self {
        Self {
            config,
            fast: Sma { period: fast_period },
            medium: Sma { period: medium_period },
            slow: Sma { period: slow_period },
        }
    }

    fn at(&self, candles: &Candles, name: &str, index: usize) -> Option<Decimal> {
        candles.indicator(name)?.get(index)?.as_ref().copied()
    }

    fn stacked_bullish(&self, candles: &Candles, index: usize) -> Option<bool> {
        let fast = self.at(candles, "triple_ma_fast", index)?;
        let medium = self.at(candles, "triple_ma_medium", index)?;
        let slow = self.at(candles, "triple_ma_slow", index)?;
        Some(fast > medium && medium > slow)
    }
}

impl Strategy for TripleMovingAverageStrategy {
    fn name(&self) -> &'static str {
        "triple_moving_average"
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }

    fn populate_indicators(&self, candles: &mut Candles, cache: &IndicatorCache) {
        let fingerprint = candles.fingerprint();
        let fast = cache.get_or_compute(&self.fast, hash_params(&self.fast), candles.as_slice(), fingerprint);
        let medium = cache.get_or_compute(&self.medium, hash_params(&self.medium), candles.as_slice(), fingerprint);
        let slow = cache.get_or_compute(&self.slow, hash_params(&self.slow), candles.as_slice(), fingerprint);
        candles.set_indicator("triple_ma_fast", fast[0].1.clone());
        candles.set_indicator("triple_ma_medium", medium[0].1.clone());
        candles.set_indicator("triple_ma_slow", slow[0].1.clone());
    }

    fn generate_entry_signal(&self, candles: &Candles, index: usize) -> Option<Signal> {
        if self.stacked_bullish(candles, index)? {
            let candle = candles.get(index)?;
            return Some(Signal::new(
                SignalType::EntryLong,
                self.config.pair.clone(),
                Side::Buy,
                candle.close,
                Decimal::ONE,
                candle.timestamp,
            ));
        }
        None
    }

    fn generate_exit_signal(&self, candles: &Candles, index: usize, _position: &Position) -> Option<Signal> {
        if !self.stacked_bullish(candles, index)? {
            let candle = candles.get(index)?;
            return Some(Signal::new(
                SignalType::ExitLong,
                self.config.pair.clone(),
                Side::Sell,
                candle.close,
                Decimal::ONE,
                candle.timestamp,
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zigquant_core::candle::Candle;
    use zigquant_core::instrument::TradingPair;
    use zigquant_core::time::Timestamp;

    fn candle(ts: i64, close: i64) -> Candle {
        Candle {
            timestamp: Timestamp(ts),
            open: Decimal::from_int(close),
            high: Decimal::from_int(close),
            low: Decimal::from_int(close),
            close: Decimal::from_int(close),
            volume: Decimal::ZERO,
        }
    }

    #[test]
    fn a_steady_uptrend_eventually_stacks_bullish_and_emits_entry() {
        let strategy = TripleMovingAverageStrategy::new(
            StrategyConfig::new(TradingPair::new("BTC", "USD"), 60_000),
            2,
            4,
            6,
        );
        let cache = IndicatorCache::new(16);
        let mut candles = Candles::new();
        for i in 0..20i64 {
            candles.push_or_update(candle(i, 100 + i * 2));
        }
        strategy.populate_indicators(&mut candles, &cache);

        let last = candles.len() - 1;
        assert!(strategy.generate_entry_signal(&candles, last).is_some());
    }
}
