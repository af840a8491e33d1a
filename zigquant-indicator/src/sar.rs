use crate::indicator::{Indicator, Series};
use zigquant_core::candle::Candle;
use zigquant_decimal::Decimal;

/// Parabolic Stop-And-Reverse: a trailing stop that accelerates toward price
/// as a trend extends, flipping direction whenever price crosses it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ParabolicSar {
    pub af_start: Decimal,
    pub af_step: Decimal,
    pub af_max: Decimal,
}

impl Default for ParabolicSar {
    fn default() -> Self {
        Self {
            af_start: Decimal::from_string("0.02").expect("valid literal"),
            af_step: Decimal::from_string("0.02").expect("valid literal"),
            af_max: Decimal::from_string("0.2").expect("valid literal"),
        }
    }
}

impl Indicator for ParabolicSar {
    fn name(&self) -> &'static str {
        "parabolic_sar"
    }

    fn required_warm_up(&self) -> usize {
        1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let len = candles.len();
        if len < 2 {
            return vec![(self.name(), vec![None; len])];
        }

        // Seed the trend from the first two candles: if the second candle's
        // close is higher, assume an initial uptrend, otherwise a downtrend.
        let mut rising = candles[1].close >= candles[0].close;
        let mut extreme_point = if rising { candles[0].high } else { candles[0].low };
        let mut sar = if rising { candles[0].low } else { candles[0].high };
        let mut af = self.af_start;

        let mut values: Series = vec![None];
        values.push(Some(sar));

        for i in 1..len - 1 {
            let current = &candles[i];
            let next = &candles[i + 1];

            let mut next_sar = sar + af * (extreme_point - sar);

            if rising {
                // SAR never rises above either of the prior two periods' lows.
                let floor = candles[i.saturating_sub(1)].low.min(current.low);
                if next_sar > floor {
                    next_sar = floor;
                }
                if next.low < next_sar {
                    rising = false;
                    next_sar = extreme_point;
                    extreme_point = next.low;
                    af = self.af_start;
                } else if current.high > extreme_point {
                    extreme_point = current.high;
                    af = (af + self.af_step).min(self.af_max);
                }
            } else {
                let ceiling = candles[i.saturating_sub(1)].high.max(current.high);
                if next_sar < ceiling {
                    next_sar = ceiling;
                }
                if next.high > next_sar {
                    rising = true;
                    next_sar = extreme_point;
                    extreme_point = next.high;
                    af = self.af_start;
                } else if current.low < extreme_point {
                    extreme_point = current.low;
                    af = (af + self.af_step).min(self.af_max);
                }
            }

            sar = next_sar;
            values.push(Some(sar));
        }

        vec![(self.name(), values)]
    }
}

trait MinMax: Sized {
    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;
}

impl MinMax for Decimal {
    fn min(self, other: Self) -> Self {
        if self < other {
            self
        } else {
            other
        }
    }

    fn max(self, other: Self) -> Self {
        if self > other {
            self
        } else {
            other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zigquant_core::time::Timestamp;

    fn candle(high: i64, low: i64, close: i64) -> Candle {
        Candle {
            timestamp: Timestamp(close),
            open: Decimal::from_int(close),
            high: Decimal::from_int(high),
            low: Decimal::from_int(low),
            close: Decimal::from_int(close),
            volume: Decimal::ZERO,
        }
    }

    #[test]
    fn short_sequences_are_all_none_without_panic() {
        let sar = ParabolicSar::default();
        let (_name, series) = &sar.compute(&[])[0];
        assert!(series.is_empty());

        let one = [candle(10, 9, 10)];
        let (_name, series) = &sar.compute(&one)[0];
        assert_eq!(series.len(), 1);
        assert!(series[0].is_none());
    }

    #[test]
    fn uptrend_keeps_sar_below_price() {
        let candles: Vec<_> = (0..10).map(|i| candle(110 + i * 2, 100 + i * 2, 105 + i * 2)).collect();
        let sar = ParabolicSar::default();
        let (_name, series) = &sar.compute(&candles)[0];
        for (candle, value) in candles.iter().zip(series.iter()).skip(2) {
            if let Some(value) = value {
                assert!(*value <= candle.high);
            }
        }
    }
}
