use crate::strategy::Strategy;
use zigquant_core::candle::Candles;
use zigquant_core::instrument::Side;
use zigquant_core::position::Position;
use zigquant_core::signal::{Signal, SignalType};
use zigquant_core::strategy_config::StrategyConfig;
use zigquant_decimal::Decimal;
use zigquant_indicator::{hash_params, IndicatorCache, Rsi};

/// Enters long when RSI falls below `oversold` and exits when it rises
/// above `overbought` (§4.F).
pub struct RsiMeanReversionStrategy {
    config: StrategyConfig,
    rsi: Rsi,
    oversold: Decimal,
    overbought: Decimal,
}

impl RsiMeanReversionStrategy {
    pub fn new(config: StrategyConfig, period: usize, oversold: Decimal, overbought: Decimal) -> Self {
        Self {
            config,
            rsi: Rsi { period },
            oversold,
            overbought,
        }
    }

    fn rsi_at(&self, candles: &Candles, index: usize) -> Option<Decimal> {
        candles.indicator("rsi_mean_reversion")?.get(index)?.as_ref().copied()
    }
}

impl Strategy for RsiMeanReversionStrategy {
    fn name(&self) -> &'static str {
        "rsi_mean_reversion"
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }

    fn populate_indicators(&self, candles: &mut Candles, cache: &IndicatorCache) {
        let fingerprint = candles.fingerprint();
        let rsi = cache.get_or_compute(&self.rsi, hash_params(&self.rsi), candles.as_slice(), fingerprint);
        candles.set_indicator("rsi_mean_reversion", rsi[0].1.clone());
    }

    fn generate_entry_signal(&self, candles: &Candles, index: usize) -> Option<Signal> {
        let rsi = self.rsi_at(candles, index)?;
        if rsi < self.oversold {
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
        let rsi = self.rsi_at(candles, index)?;
        if rsi > self.overbought {
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
