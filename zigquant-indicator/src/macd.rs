use crate::indicator::{Indicator, Series};
use crate::moving_average::ema_series;
use zigquant_core::candle::Candle;
use zigquant_decimal::Decimal;

/// Moving Average Convergence/Divergence: the difference of a fast and slow
/// EMA of closing price (`macd_line`), smoothed again by `signal` periods
/// (`macd_signal`), with their difference (`macd_histogram`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Macd {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Indicator for Macd {
    fn name(&self) -> &'static str {
        "macd"
    }

    fn required_warm_up(&self) -> usize {
        self.slow.saturating_sub(1) + self.signal.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let len = candles.len();
        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();

        let fast_ema = ema_series(&closes, self.fast);
        let slow_ema = ema_series(&closes, self.slow);

        let macd_line: Series = fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| match (f, s) {
                (Some(f), Some(s)) => Some(*f - *s),
                _ => None,
            })
            .collect();

        let macd_values: Vec<Decimal> = macd_line.iter().filter_map(|v| *v).collect();
        let signal_tail = ema_series(&macd_values, self.signal);

        let macd_present_from = macd_line.iter().position(Option::is_some).unwrap_or(len);
        let mut macd_signal = vec![None; len];
        for (offset, value) in signal_tail.into_iter().enumerate() {
            if let Some(slot) = macd_signal.get_mut(macd_present_from + offset) {
                *slot = value;
            }
        }

        let macd_histogram: Series = macd_line
            .iter()
            .zip(macd_signal.iter())
            .map(|(m, s)| match (m, s) {
                (Some(m), Some(s)) => Some(*m - *s),
                _ => None,
            })
            .collect();

        vec![
            ("macd_line", macd_line),
            ("macd_signal", macd_signal),
            ("macd_histogram", macd_histogram),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zigquant_core::time::Timestamp;

    fn candle(close: i64) -> Candle {
        Candle {
            timestamp: Timestamp(close),
            open: Decimal::from_int(close),
            high: Decimal::from_int(close),
            low: Decimal::from_int(close),
            close: Decimal::from_int(close),
            volume: Decimal::ZERO,
        }
    }

    #[test]
    fn all_three_lines_share_the_input_length() {
        let candles: Vec<_> = (1..=40).map(candle).collect();
        let macd = Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        for (_name, series) in macd.compute(&candles) {
            assert_eq!(series.len(), candles.len());
        }
    }

    #[test]
    fn histogram_is_only_present_once_both_lines_warm_up() {
        let candles: Vec<_> = (1..=40).map(candle).collect();
        let macd = Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        let result = macd.compute(&candles);
        let histogram = &result[2].1;
        let signal = &result[1].1;
        for (h, s) in histogram.iter().zip(signal.iter()) {
            assert_eq!(h.is_some(), s.is_some());
        }
    }
}
