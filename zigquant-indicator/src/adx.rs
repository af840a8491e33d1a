use crate::atr::true_range_series;
use crate::indicator::{padded, Indicator, Series};
use zigquant_core::candle::Candle;
use zigquant_decimal::Decimal;

/// Average Directional Index: trend strength derived from Wilder-smoothed
/// directional movement. Also exposes the `di_plus`/`di_minus` lines it is
/// built from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Adx {
    pub period: usize,
}

impl Indicator for Adx {
    fn name(&self) -> &'static str {
        "adx"
    }

    fn required_warm_up(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let len = candles.len();
        if len == 0 || self.period == 0 || len <= self.required_warm_up() {
            return vec![
                ("adx", vec![None; len]),
                ("di_plus", vec![None; len]),
                ("di_minus", vec![None; len]),
            ];
        }

        let true_ranges = true_range_series(candles);
        let (plus_dm, minus_dm): (Vec<Decimal>, Vec<Decimal>) = candles
            .windows(2)
            .map(|pair| {
                let up_move = pair[1].high - pair[0].high;
                let down_move = pair[0].low - pair[1].low;
                let plus = if up_move.is_positive() && up_move > down_move {
                    up_move
                } else {
                    Decimal::ZERO
                };
                let minus = if down_move.is_positive() && down_move > up_move {
                    down_move
                } else {
                    Decimal::ZERO
                };
                (plus, minus)
            })
            .unzip();

        let smoothed_tr = wilder_smooth(&true_ranges, self.period);
        let smoothed_plus = wilder_smooth(&plus_dm, self.period);
        let smoothed_minus = wilder_smooth(&minus_dm, self.period);

        let hundred = Decimal::from_int(100);
        let di_plus: Vec<Decimal> = smoothed_plus
            .iter()
            .zip(smoothed_tr.iter())
            .map(|(dm, tr)| if tr.is_zero() { Decimal::ZERO } else { *dm / *tr * hundred })
            .collect();
        let di_minus: Vec<Decimal> = smoothed_minus
            .iter()
            .zip(smoothed_tr.iter())
            .map(|(dm, tr)| if tr.is_zero() { Decimal::ZERO } else { *dm / *tr * hundred })
            .collect();

        let dx: Vec<Decimal> = di_plus
            .iter()
            .zip(di_minus.iter())
            .map(|(plus, minus)| {
                let sum = *plus + *minus;
                if sum.is_zero() {
                    Decimal::ZERO
                } else {
                    (*plus - *minus).abs() / sum * hundred
                }
            })
            .collect();

        let period_dec = Decimal::from_int(self.period as i64);
        let mut adx_value = dx[..self.period]
            .iter()
            .fold(Decimal::ZERO, |acc, v| acc + *v)
            / period_dec;
        let mut adx_values = Vec::with_capacity(dx.len() - self.period + 1);
        adx_values.push(adx_value);
        for value in &dx[self.period..] {
            adx_value = (adx_value * (period_dec - Decimal::from_int(1)) + *value) / period_dec;
            adx_values.push(adx_value);
        }

        let warm_up = self.required_warm_up();
        let di_warm_up = self.period;
        vec![
            ("adx", padded(warm_up, len, adx_values.into_iter())),
            ("di_plus", padded(di_warm_up, len, di_plus.into_iter())),
            ("di_minus", padded(di_warm_up, len, di_minus.into_iter())),
        ]
    }
}

/// Wilder smoothing: seed with the simple sum of the first `period` values,
/// then recursively `smoothed[i] = smoothed[i-1] - smoothed[i-1]/period + value[i]`.
fn wilder_smooth(values: &[Decimal], period: usize) -> Vec<Decimal> {
    let period_dec = Decimal::from_int(period as i64);
    let mut smoothed = values[..period].iter().fold(Decimal::ZERO, |acc, v| acc + *v);
    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(smoothed);
    for value in &values[period..] {
        smoothed = smoothed - smoothed / period_dec + *value;
        out.push(smoothed);
    }
    out
}
