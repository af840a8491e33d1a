use crate::strategy::Strategy;
use zigquant_core::candle::Candles;
use zigquant_core::instrument::Side;
use zigquant_core::position::Position;
use zigquant_core::signal::{Signal, SignalType};
use zigquant_core::strategy_config::StrategyConfig;
use zigquant_decimal::Decimal;
use zigquant_indicator::{hash_params, Ema, IndicatorCache, Macd, Rsi};

/// A feature vector summarising one candle's indicator state, handed to a
/// [`SignalModel`] for a prediction. Deliberately plain `Decimal`s rather
/// than the indicator objects themselves, so a model implementation does
/// not need to depend on `zigquant-indicator`.
#[derive(Debug, Clone, Copy)]
pub struct Features {
    pub close: Decimal,
    pub rsi: Decimal,
    pub ema_fast: Decimal,
    pub ema_slow: Decimal,
    pub macd_line: Decimal,
    pub macd_signal: Decimal,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PredictedAction {
    Buy,
    Sell,
    Hold,
}

/// Pluggable prediction seam (§9 Design Notes: the core exposes the
/// interface, not a bundled ML runtime). A real model sits behind this
/// trait out-of-process or in an adapter crate; [`RuleBasedModel`] is a
/// deterministic placeholder exercised by tests.
pub trait SignalModel: Send {
    fn predict(&self, features: &Features) -> PredictedAction;
}

/// Deterministic scoring model: accumulates a score from RSI extremes, an
/// EMA cross, and MACD-over-signal, then thresholds it. Not a trained
/// model — a stand-in showing the seam works end to end.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedModel;

impl SignalModel for RuleBasedModel {
    fn predict(&self, features: &Features) -> PredictedAction {
        let mut score = Decimal::ZERO;

        if features.rsi < Decimal::from_int(30) {
            score = score + Decimal::from_int(2);
        } else if features.rsi > Decimal::from_int(70) {
            score = score - Decimal::from_int(2);
        }

        if features.ema_fast > features.ema_slow {
            score = score + Decimal::ONE;
        } else if features.ema_fast < features.ema_slow {
            score = score - Decimal::ONE;
        }

        if features.macd_line > features.macd_signal {
            score = score + Decimal::ONE;
        } else if features.macd_line < features.macd_signal {
            score = score - Decimal::ONE;
        }

        if score > Decimal::from_int(1) {
            PredictedAction::Buy
        } else if score < Decimal::from_int(-1) {
            PredictedAction::Sell
        } else {
            PredictedAction::Hold
        }
    }
}

/// Delegates entry/exit decisions to a [`SignalModel`] fed by a fixed
/// indicator basis (§4.F "hybrid AI").
pub struct HybridAiStrategy {
    config: StrategyConfig,
    rsi: Rsi,
    ema_fast: Ema,
    ema_slow: Ema,
    macd: Macd,
    model: Box<dyn SignalModel>,
}

impl HybridAiStrategy {
    pub fn new(config: StrategyConfig, model: Box<dyn SignalModel>) -> Self {
        Self {
            config,
            rsi: Rsi { period: 14 },
            ema_fast: Ema { period: 12 },
            ema_slow: Ema { period: 26 },
            macd: Macd { fast: 12, slow: 26, signal: 9 },
            model,
        }
    }

    fn features_at(&self, candles: &Candles, index: usize) -> Option<Features> {
        Some(Features {
            close: candles.get(index)?.close,
            rsi: candles.indicator("hybrid_rsi")?.get(index)?.as_ref().copied()?,
            ema_fast: candles.indicator("hybrid_ema_fast")?.get(index)?.as_ref().copied()?,
            ema_slow: candles.indicator("hybrid_ema_slow")?.get(index)?.as_ref().copied()?,
            macd_line: candles.indicator("macd_line")?.get(index)?.as_ref().copied()?,
            macd_signal: candles.indicator("macd_signal")?.get(index)?.as_ref().copied()?,
        })
    }
}

impl Strategy for HybridAiStrategy {
    fn name(&self) -> &'static str {
        "hybrid_ai"
    }

    fn config(&self) -> &StrategyConfig {
        &self.config
    }

    fn populate_indicators(&self, candles: &mut Candles, cache: &IndicatorCache) {
        let fingerprint = candles.fingerprint();
        let rsi = cache.get_or_compute(&self.rsi, hash_params(&self.rsi), candles.as_slice(), fingerprint);
        let ema_fast = cache.get_or_compute(&self.ema_fast, hash_params(&self.ema_fast), candles.as_slice(), fingerprint);
        let ema_slow = cache.get_or_compute(&self.ema_slow, hash_params(&self.ema_slow), candles.as_slice(), fingerprint);
        let macd = cache.get_or_compute(&self.macd, hash_params(&self.macd), candles.as_slice(), fingerprint);

        candles.set_indicator("hybrid_rsi", rsi[0].1.clone());
        candles.set_indicator("hybrid_ema_fast", ema_fast[0].1.clone());
        candles.set_indicator("hybrid_ema_slow", ema_slow[0].1.clone());
        for (name, series) in macd.iter() {
            candles.set_indicator(*name, series.clone());
        }
    }

    fn generate_entry_signal(&self, candles: &Candles, index: usize) -> Option<Signal> {
        let features = self.features_at(candles, index)?;
        if self.model.predict(&features) == PredictedAction::Buy {
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
        let features = self.features_at(candles, index)?;
        if self.model.predict(&features) == PredictedAction::Sell {
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
