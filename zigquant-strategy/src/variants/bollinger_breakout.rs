use crate::strategy::Strategy;
use zigquant_core::candle::Candles;
use zigquant_core::instrument::Side;
use zigquant_core::position::Position;
use zigquant_core::signal::{Signal, SignalType};
use zigquant_core::strategy_config::StrategyConfig;
use zigquant_decimal::Decimal;
use zigquant_indicator::{hash_params, BollingerBands, IndicatorCache};

/// Enters long when price closes above the upper band (a breakout) and
/// exits when it closes back below the middle band (§4.F).
pub struct BollingerBreakoutStrategy {
    config: StrategyConfig,
    bands: BollingerBands,
}

impl BollingerBreakoutStrategy {
    pub fn new(config: StrategyConfig, period: usize, multiplier: Decimal) -> Self {
        Self {
            config,
            bands: BollingerBands { period, multiplier },
        }
    }
}

impl Strategy for BollingerBreakoutStrategy {
    fn name(&self) -> &'static str {
        "bollinger_breakout"
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }

    fn populate_indicators(&self, candles: &mut Candles, cache: &IndicatorCache) {
        let fingerprint = candles.fingerprint();
        let bands = cache.get_or_compute(&self.bands, hash_params(&self.bands), candles.as_slice(), fingerprint);
        for (name, series) in bands.iter() {
            candles.set_indicator(*name, series.clone());
        }
    }

    fn generate_entry_signal(&self, candles: &Candles, index: usize) -> Option<Signal> {
        let upper = candles.indicator("bb_upper")?.get(index)?.as_ref()?;
        let candle = candles.get(index)?;
        if candle.close > *upper {
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
        let middle = candles.indicator("bb_middle")?.get(index)?.as_ref()?;
        let candle = candles.get(index)?;
        if candle.close < *middle {
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
