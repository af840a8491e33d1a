use crate::strategy::Strategy;
use zigquant_core::candle::Candles;
use zigquant_core::instrument::Side;
use zigquant_core::position::Position;
use zigquant_core::signal::{Signal, SignalType};
use zigquant_core::strategy_config::StrategyConfig;
use zigquant_decimal::Decimal;
use zigquant_indicator::{hash_params, IndicatorCache, Macd};

/// Enters long when the MACD line crosses above its signal line, exits on
/// the reverse cross (§4.F).
pub struct MacdDivergenceStrategy {
    config: StrategyConfig,
    macd: Macd,
}

impl MacdDivergenceStrategy {
    pub fn new(config: StrategyConfig, fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            config,
            macd: Macd { fast, slow, signal },
        }
    }

    fn line_minus_signal(&self, candles: &Candles, index: usize) -> Option<Decimal> {
        let line = candles.indicator("macd_line")?.get(index)?.as_ref()?;
        let signal = candles.indicator("macd_signal")?.get(index)?.as_ref()?;
        Some(*line - *signal)
    }
}

impl Strategy for MacdDivergenceStrategy {
    fn name(&self) -> &'static str {
        "macd_divergence"
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }

    fn populate_indicators(&self, candles: &mut Candles, cache: &IndicatorCache) {
        let fingerprint = candles.fingerprint();
        let result = cache.get_or_compute(&self.macd, hash_params(&self.macd), candles.as_slice(), fingerprint);
        for (name, series) in result.iter() {
            candles.set_indicator(*name, series.clone());
        }
    }

    fn generate_entry_signal(&self, candles: &Candles, index: usize) -> Option<Signal> {
        if index == 0 {
            return None;
        }
        let prev = self.line_minus_signal(candles, index - 1)?;
        let now = self.line_minus_signal(candles, index)?;
        if prev <= Decimal::ZERO && now > Decimal::ZERO {
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
        if index == 0 {
            return None;
        }
        let prev = self.line_minus_signal(candles, index - 1)?;
        let now = self.line_minus_signal(candles, index)?;
        if prev >= Decimal::ZERO && now < Decimal::ZERO {
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
