use crate::indicator::{padded, Indicator, Series};
use zigquant_core::candle::Candle;
use zigquant_decimal::Decimal;

/// Relative Strength Index using Wilder's smoothing (not a simple moving
/// average of gains/losses).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Rsi {
    pub period: usize,
}

impl Indicator for Rsi {
    fn name(&self) -> &'static str {
        "rsi"
    }

    fn required_warm_up(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let len = candles.len();
        if len == 0 || self.period == 0 || len <= self.period {
            return vec![(self.name(), vec![None; len])];
        }

        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let changes: Vec<Decimal> = closes.windows(2).map(|w| w[1] - w[0]).collect();

        let period_dec = Decimal::from_int(self.period as i64);
        let (mut avg_gain, mut avg_loss) = changes[..self.period].iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(gain, loss), change| {
                if change.is_positive() {
                    (gain + *change, loss)
                } else {
                    (gain, loss + change.abs())
                }
            },
        );
        avg_gain = avg_gain / period_dec;
        avg_loss = avg_loss / period_dec;

        let mut values = Vec::with_capacity(len - self.period);
        values.push(rsi_from_averages(avg_gain, avg_loss));

        for change in &changes[self.period..] {
            let (gain, loss) = if change.is_positive() {
                (*change, Decimal::ZERO)
            } else {
                (Decimal::ZERO, change.abs())
            };
            avg_gain = (avg_gain * (period_dec - Decimal::from_int(1)) + gain) / period_dec;
            avg_loss = (avg_loss * (period_dec - Decimal::from_int(1)) + loss) / period_dec;
            values.push(rsi_from_averages(avg_gain, avg_loss));
        }

        vec![(self.name(), padded(self.required_warm_up(), len, values.into_iter()))]
    }
}

fn rsi_from_averages(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        return Decimal::from_int(100);
    }
    let rs = avg_gain / avg_loss;
    Decimal::from_int(100) - Decimal::from_int(100) / (Decimal::from_int(1) + rs)
}

/// Williams %R: distance of the close from the high/low range over `period`,
/// expressed as a negative percentage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WilliamsR {
    pub period: usize,
}

impl Indicator for WilliamsR {
    fn name(&self) -> &'static str {
        "williams_r"
    }

    fn required_warm_up(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let len = candles.len();
        if len == 0 || self.period == 0 || len < self.period {
            return vec![(self.name(), vec![None; len])];
        }

        let values = candles.windows(self.period).map(|window| {
            let highest = window.iter().map(|c| c.high).fold(window[0].high, |a, b| if b > a { b } else { a });
            let lowest = window.iter().map(|c| c.low).fold(window[0].low, |a, b| if b < a { b } else { a });
            let range = highest - lowest;
            let close = window.last().expect("window is never empty").close;
            if range.is_zero() {
                Decimal::ZERO
            } else {
                (highest - close) / range * Decimal::from_int(-100)
            }
        });

        vec![(self.name(), padded(self.required_warm_up(), len, values))]
    }
}

/// Commodity Channel Index over `period`, using the typical price
/// `(high+low+close)/3` and mean absolute deviation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Cci {
    pub period: usize,
}

impl Indicator for Cci {
    fn name(&self) -> &'static str {
        "cci"
    }

    fn required_warm_up(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let len = candles.len();
        if len == 0 || self.period == 0 || len < self.period {
            return vec![(self.name(), vec![None; len])];
        }

        let three = Decimal::from_int(3);
        let typical: Vec<Decimal> = candles
            .iter()
            .map(|c| (c.high + c.low + c.close) / three)
            .collect();
        let constant = Decimal::from_string("0.015").expect("valid literal");
        let period_dec = Decimal::from_int(self.period as i64);

        let values = typical.windows(self.period).map(move |window| {
            let mean = window.iter().fold(Decimal::ZERO, |acc, v| acc + *v) / period_dec;
            let mean_deviation =
                window.iter().fold(Decimal::ZERO, |acc, v| acc + (*v - mean).abs()) / period_dec;
            let current = *window.last().expect("window is never empty");
            if mean_deviation.is_zero() {
                Decimal::ZERO
            } else {
                (current - mean) / (constant * mean_deviation)
            }
        });

        vec![(self.name(), padded(self.required_warm_up(), len, values))]
    }
}

/// Rate of change: percentage change versus the close `period` bars ago.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Roc {
    pub period: usize,
}

impl Indicator for Roc {
    fn name(&self) -> &'static str {
        "roc"
    }

    fn required_warm_up(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let len = candles.len();
        if len == 0 || self.period == 0 || len <= self.period {
            return vec![(self.name(), vec![None; len])];
        }

        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let values = (self.period..len).map(|i| {
            let past = closes[i - self.period];
            if past.is_zero() {
                Decimal::ZERO
            } else {
                (closes[i] - past) / past * Decimal::from_int(100)
            }
        });

        vec![(self.name(), padded(self.required_warm_up(), len, values))]
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
    fn rsi_is_100_when_every_change_is_a_gain() {
        let candles: Vec<_> = [10, 11, 12, 13, 14, 15]
            .into_iter()
            .map(|c| candle(c, c, c))
            .collect();
        let rsi = Rsi { period: 3 };
        let (_name, series) = &rsi.compute(&candles)[0];
        assert_eq!(series[3], Some(Decimal::from_int(100)));
    }

    #[test]
    fn rsi_warm_up_region_is_none() {
        let candles: Vec<_> = [10, 11, 12].into_iter().map(|c| candle(c, c, c)).collect();
        let rsi = Rsi { period: 5 };
        let (_name, series) = &rsi.compute(&candles)[0];
        assert!(series.iter().all(Option::is_none));
        assert_eq!(series.len(), candles.len());
    }

    #[test]
    fn williams_r_is_zero_at_the_top_of_the_range() {
        let candles = vec![candle(100, 90, 100), candle(100, 90, 100)];
        let w = WilliamsR { period: 2 };
        let (_name, series) = &w.compute(&candles)[0];
        assert_eq!(series[1], Some(Decimal::ZERO));
    }

    #[test]
    fn roc_reflects_percentage_change() {
        let candles: Vec<_> = [100, 110].into_iter().map(|c| candle(c, c, c)).collect();
        let roc = Roc { period: 1 };
        let (_name, series) = &roc.compute(&candles)[0];
        assert_eq!(series[1], Some(Decimal::from_int(10)));
    }
}
