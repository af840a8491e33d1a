use crate::indicator::{padded, Indicator, Series};
use zigquant_core::candle::Candle;
use zigquant_decimal::Decimal;

/// Ichimoku Kinko Hyo: conversion/base lines plus a displaced leading cloud
/// and a displaced lagging span. `tenkan`/`kijun` periods are the
/// conversion/base line lookbacks, `senkou_b_period` the leading span B
/// lookback, and `displacement` how many candles the cloud and lagging span
/// are shifted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Ichimoku {
    pub tenkan_period: usize,
    pub kijun_period: usize,
    pub senkou_b_period: usize,
    pub displacement: usize,
}

impl Default for Ichimoku {
    fn default() -> Self {
        Self {
            tenkan_period: 9,
            kijun_period: 26,
            senkou_b_period: 52,
            displacement: 26,
        }
    }
}

fn midpoint_series(candles: &[Candle], period: usize) -> Series {
    let len = candles.len();
    if period == 0 || len < period {
        return vec![None; len];
    }
    let values = candles.windows(period).map(|window| {
        let highest = window.iter().map(|c| c.high).fold(window[0].high, |a, b| if b > a { b } else { a });
        let lowest = window.iter().map(|c| c.low).fold(window[0].low, |a, b| if b < a { b } else { a });
        (highest + lowest) / Decimal::from_int(2)
    });
    padded(period - 1, len, values)
}

impl Indicator for Ichimoku {
    fn name(&self) -> &'static str {
        "ichimoku"
    }

    fn required_warm_up(&self) -> usize {
        self.senkou_b_period.max(self.kijun_period).saturating_sub(1) + self.displacement
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let len = candles.len();
        if len == 0 {
            return vec![
                ("ichimoku_tenkan", Vec::new()),
                ("ichimoku_kijun", Vec::new()),
                ("ichimoku_senkou_a", Vec::new()),
                ("ichimoku_senkou_b", Vec::new()),
                ("ichimoku_chikou", Vec::new()),
            ];
        }

        let tenkan = midpoint_series(candles, self.tenkan_period);
        let kijun = midpoint_series(candles, self.kijun_period);

        // Senkou spans are projected `displacement` candles forward: the
        // value landing at index `i` was computed from data as of
        // `i - displacement`.
        let mut senkou_a = vec![None; len];
        let mut senkou_b = vec![None; len];
        for i in 0..len {
            if i < self.displacement {
                continue;
            }
            let source = i - self.displacement;
            senkou_a[i] = match (tenkan.get(source).copied().flatten(), kijun.get(source).copied().flatten()) {
                (Some(t), Some(k)) => Some((t + k) / Decimal::from_int(2)),
                _ => None,
            };
            senkou_b[i] = span_b_at(candles, source, self.senkou_b_period);
        }

        // Chikou span: the closing price plotted `displacement` candles in
        // the past, so the value landing at index `i` is the close observed
        // `displacement` candles later.
        let mut chikou = vec![None; len];
        for i in 0..len {
            if i + self.displacement < len {
                chikou[i] = Some(candles[i + self.displacement].close);
            }
        }

        vec![
            ("ichimoku_tenkan", tenkan),
            ("ichimoku_kijun", kijun),
            ("ichimoku_senkou_a", senkou_a),
            ("ichimoku_senkou_b", senkou_b),
            ("ichimoku_chikou", chikou),
        ]
    }
}

fn span_b_at(candles: &[Candle], end_inclusive: usize, period: usize) -> Option<Decimal> {
    if period == 0 || end_inclusive + 1 < period {
        return None;
    }
    let window = &candles[end_inclusive + 1 - period..=end_inclusive];
    let highest = window.iter().map(|c| c.high).fold(window[0].high, |a, b| if b > a { b } else { a });
    let lowest = window.iter().map(|c| c.low).fold(window[0].low, |a, b| if b < a { b } else { a });
    Some((highest + lowest) / Decimal::from_int(2))
}
