use crate::strategy::Strategy;
use zigquant_core::candle::Candles;
use zigquant_core::instrument::Side;
use zigquant_core::position::Position;
use zigquant_core::signal::{Signal, SignalType};
use zigquant_core::strategy_config::StrategyConfig;
use zigquant_core::time::Timestamp;
use zigquant_indicator::{hash_params, IndicatorCache, Sma};
use zigquant_decimal::Decimal;

/// Enters long on a fast/slow SMA golden cross, exits on the corresponding
/// death cross. The simplest of the moving-average family (§4.F).
pub struct DualMovingAverageStrategy {
    config: StrategyConfig,
    fast: Sma,
    slow: Sma,
}

impl DualMovingAverageStrategy {
    pub fn new(config: StrategyConfig, fast_period: usize, slow_period: usize) -> Self {
        Self {
            config,
            fast: Sma { period: fast_period },
            slow: Sma { period: slow_period },
        }
    }

    fn crossed_above(&self, candles: &Candles, index: usize) -> Option<bool> {
        if index == 0 {
            return None;
        }
        let fast = candles.indicator("dual_ma_fast")?;
        let slow = candles.indicator("dual_ma_slow")?;
        let (fast_prev, fast_now) = (fast.get(index - 1)?.as_ref()?, fast.get(index)?.as_ref()?);
        let (slow_prev, slow_now) = (slow.get(index - 1)?.as_ref()?, slow.get(index)?.as_ref()?);
        Some(fast_prev <= slow_prev && fast_now > slow_now)
    }

    fn crossed_below(&self, candles: &Candles, index: usize) -> Option<bool> {
        if index == 0 {
            return None;
        }
        let fast = candles.indicator("dual_ma_fast")?;
        let slow = candles.indicator("dual_ma_slow")?;
        let (fast_prev, fast_now) = (fast.get(index - 1)?.as_ref()?, fast.get(index)?.as_ref()?);
        let (slow_prev, slow_now) = (slow.get(index - 1)?.as_ref()?, slow.get(index)?.as_ref()?);
        Some(fast_prev >= slow_prev && fast_now < slow_now)
    }
}

impl Strategy for DualMovingAverageStrategy {
    fn name(&self) -> &'static str {
        "dual_moving_average"
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }

    fn populate_indicators(&self, candles: &mut Candles, cache: &IndicatorCache) {
        let fingerprint = candles.fingerprint();
        let fast = cache.get_or_compute(&self.fast, hash_params(&self.fast), candles.as_slice(), fingerprint);
        let slow = cache.get_or_compute(&self.slow, hash_params(&self.slow), candles.as_slice(), fingerprint);
        candles.set_indicator("dual_ma_fast", fast[0].1.clone());
        candles.set_indicator("dual_ma_slow", slow[0].1.clone());
    }

    fn generate_entry_signal(&self, candles: &Candles, index: usize) -> Option<Signal> {
        if self.crossed_above(candles, index)? {
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
        if self.crossed_below(candles, index)? {
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
