use crate::indicator::{padded, Indicator, Series};
use zigquant_core::candle::Candle;
use zigquant_decimal::Decimal;

/// Simple moving average of closing price.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Sma {
    pub period: usize,
}

impl Indicator for Sma {
    fn name(&self) -> &'static str {
        "sma"
    }

    fn required_warm_up(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        if candles.is_empty() || self.period == 0 {
            return vec![(self.name(), Vec::new())];
        }

        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let divisor = Decimal::from_int(self.period as i64);
        let values = closes.windows(self.period).map(move |window| {
            window
                .iter()
                .fold(Decimal::ZERO, |acc, v| acc + *v)
                / divisor
        });

        vec![(self.name(), padded(self.required_warm_up(), candles.len(), values))]
    }
}

/// Exponential moving average with smoothing factor `alpha = 2 / (period+1)`,
/// seeded with the simple average of the first `period` closes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Ema {
    pub period: usize,
}

impl Indicator for Ema {
    fn name(&self) -> &'static str {
        "ema"
    }

    fn required_warm_up(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        vec![(self.name(), ema_series(&closes, self.period))]
    }
}

/// Raw EMA over an arbitrary `Decimal` series (not necessarily closes),
/// seeded with the simple average of the first `period` values. Shared by
/// [`Ema`] and by MACD's signal-line smoothing of the MACD line.
pub(crate) fn ema_series(values: &[Decimal], period: usize) -> Series {
    let len = values.len();
    if len == 0 || period == 0 || len < period {
        return vec![None; len];
    }

    let alpha = Decimal::from_int(2) / Decimal::from_int(period as i64 + 1);
    let one_minus_alpha = Decimal::from_int(1) - alpha;

    let seed = values[..period].iter().fold(Decimal::ZERO, |acc, v| acc + *v) / Decimal::from_int(period as i64);

    let mut series = Vec::with_capacity(len - period + 1);
    let mut prev = seed;
    series.push(prev);
    for value in &values[period..] {
        prev = *value * alpha + prev * one_minus_alpha;
        series.push(prev);
    }

    padded(period - 1, len, series.into_iter())
}
