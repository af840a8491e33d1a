use crate::indicator::{padded, Indicator, Series};
use zigquant_core::candle::Candle;
use zigquant_decimal::Decimal;

/// Average True Range: Wilder-smoothed true range over `period`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Atr {
    pub period: usize,
}

impl Indicator for Atr {
    fn name(&self) -> &'static str {
        "atr"
    }

    fn required_warm_up(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let len = candles.len();
        if len == 0 || self.period == 0 || len <= self.period {
            return vec![(self.name(), vec![None; len])];
        }

        let true_ranges: Vec<Decimal> = true_range_series(candles);
        let period_dec = Decimal::from_int(self.period as i64);

        let mut atr = true_ranges[..self.period]
            .iter()
            .fold(Decimal::ZERO, |acc, v| acc + *v)
            / period_dec;

        let mut values = Vec::with_capacity(true_ranges.len() - self.period + 1);
        values.push(atr);
        for tr in &true_ranges[self.period..] {
            atr = (atr * (period_dec - Decimal::from_int(1)) + *tr) / period_dec;
            values.push(atr);
        }

        vec![(self.name(), padded(self.required_warm_up(), len, values.into_iter()))]
    }
}

/// True range per candle after the first: `max(h-l, |h-prev_close|, |l-prev_close|)`.
/// One entry shorter than `candles` since the first candle has no prior close.
pub(crate) fn true_range_series(candles: &[Candle]) -> Vec<Decimal> {
    candles
        .windows(2)
        .map(|pair| {
            let prev_close = pair[0].close;
            let current = &pair[1];
            let hl = current.high - current.low;
            let hc = (current.high - prev_close).abs();
            let lc = (current.low - prev_close).abs();
            let mut max = hl;
            if hc > max {
                max = hc;
            }
            if lc > max {
                max = lc;
            }
            max
        })
        .collect()
}
