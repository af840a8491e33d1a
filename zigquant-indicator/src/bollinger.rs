use crate::indicator::{padded, Indicator, Series};
use zigquant_core::candle::Candle;
use zigquant_decimal::Decimal;

/// Bollinger Bands: a moving average (`bb_middle`) plus/minus `multiplier`
/// sample standard deviations of closing price (`bb_upper`, `bb_lower`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BollingerBands {
    pub period: usize,
    pub multiplier: Decimal,
}

impl Indicator for BollingerBands {
    fn name(&self) -> &'static str {
        "bollinger"
    }

    fn required_warm_up(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let len = candles.len();
        if len == 0 || self.period < 2 || len < self.period {
            return vec![
                ("bb_upper", vec![None; len]),
                ("bb_middle", vec![None; len]),
                ("bb_lower", vec![None; len]),
            ];
        }

        let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
        let period_dec = Decimal::from_int(self.period as i64);
        let sample_divisor = Decimal::from_int(self.period as i64 - 1);

        let mut middle = Vec::with_capacity(len - self.period + 1);
        let mut upper = Vec::with_capacity(len - self.period + 1);
        let mut lower = Vec::with_capacity(len - self.period + 1);

        for window in closes.windows(self.period) {
            let mean = window.iter().fold(Decimal::ZERO, |acc, v| acc + *v) / period_dec;
            let variance = window
                .iter()
                .fold(Decimal::ZERO, |acc, v| acc + (*v - mean) * (*v - mean))
                / sample_divisor;
            let stdev = variance.sqrt();
            let band = stdev * self.multiplier;

            middle.push(mean);
            upper.push(mean + band);
            lower.push(mean - band);
        }

        let warm_up = self.required_warm_up();
        vec![
            ("bb_upper", padded(warm_up, len, upper.into_iter())),
            ("bb_middle", padded(warm_up, len, middle.into_iter())),
            ("bb_lower", padded(warm_up, len, lower.into_iter())),
        ]
    }
}
