use crate::indicator::{Indicator, Series};
use zigquant_core::candle::Candle;
use zigquant_decimal::Decimal;

/// On-Balance Volume: a running total of volume, added when close rises,
/// subtracted when close falls, unchanged on a flat close. No warm-up: the
/// first candle contributes zero change and every index has a value.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Obv;

impl Indicator for Obv {
    fn name(&self) -> &'static str {
        "obv"
    }

    fn required_warm_up(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        if candles.is_empty() {
            return vec![(self.name(), Vec::new())];
        }

        let mut running = Decimal::ZERO;
        let mut values = Vec::with_capacity(candles.len());
        values.push(Some(running));

        for pair in candles.windows(2) {
            let (prev, current) = (&pair[0], &pair[1]);
            if current.close > prev.close {
                running = running + current.volume;
            } else if current.close < prev.close {
                running = running - current.volume;
            }
            values.push(Some(running));
        }

        vec![(self.name(), values)]
    }
}

/// Volume-Weighted Average Price: the running ratio of cumulative
/// `typical_price * volume` to cumulative volume. `None` only while
/// cumulative volume is still zero.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Vwap;

impl Indicator for Vwap {
    fn name(&self) -> &'static str {
        "vwap"
    }

    fn required_warm_up(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle]) -> Vec<(&'static str, Series)> {
        let three = Decimal::from_int(3);
        let mut cumulative_pv = Decimal::ZERO;
        let mut cumulative_volume = Decimal::ZERO;

        let values = candles
            .iter()
            .map(|c| {
                let typical = (c.high + c.low + c.close) / three;
                cumulative_pv = cumulative_pv + typical * c.volume;
                cumulative_volume = cumulative_volume + c.volume;
                if cumulative_volume.is_zero() {
                    None
                } else {
                    Some(cumulative_pv / cumulative_volume)
                }
            })
            .collect();

        vec![(self.name(), values)]
    }
}

/// One price bucket of a [`VolumeProfile`]: total traded volume whose
/// typical price falls within `[low, high)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBucket {
    pub low: Decimal,
    pub high: Decimal,
    pub volume: Decimal,
}

/// Traded-volume histogram bucketed by price, not by time. Its output is a
/// small set of price buckets rather than one value per input candle, so it
/// does not implement [`Indicator`]: that contract guarantees a per-candle
/// aligned series, which a price histogram cannot provide.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VolumeProfile {
    pub bucket_size: Decimal,
}

impl VolumeProfile {
    pub fn compute(&self, candles: &[Candle]) -> Vec<PriceBucket> {
        if candles.is_empty() || self.bucket_size.is_zero() {
            return Vec::new();
        }

        let three = Decimal::from_int(3);
        let mut buckets: Vec<PriceBucket> = Vec::new();

        for candle in candles {
            let typical = (candle.high + candle.low + candle.close) / three;
            let bucket_index = (typical / self.bucket_size).floor();
            let low = bucket_index * self.bucket_size;
            let high = low + self.bucket_size;

            match buckets.iter_mut().find(|b| b.low == low) {
                Some(bucket) => bucket.volume = bucket.volume + candle.volume,
                None => buckets.push(PriceBucket {
                    low,
                    high,
                    volume: candle.volume,
                }),
            }
        }

        buckets.sort_by(|a, b| a.low.cmp(&b.low));
        buckets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zigquant_core::time::Timestamp;

    fn candle(high: i64, low: i64, close: i64, volume: i64) -> Candle {
        Candle {
            timestamp: Timestamp(close),
            open: Decimal::from_int(close),
            high: Decimal::from_int(high),
            low: Decimal::from_int(low),
            close: Decimal::from_int(close),
            volume: Decimal::from_int(volume),
        }
    }

    #[test]
    fn obv_accumulates_on_rising_close_and_subtracts_on_falling() {
        let candles = vec![
            candle(101, 99, 100, 10),
            candle(103, 100, 102, 20),
            candle(102, 98, 99, 5),
        ];
        let obv = Obv;
        let (_name, series) = &obv.compute(&candles)[0];
        assert_eq!(series[0], Some(Decimal::ZERO));
        assert_eq!(series[1], Some(Decimal::from_int(20)));
        assert_eq!(series[2], Some(Decimal::from_int(15)));
    }

    #[test]
    fn vwap_is_none_while_cumulative_volume_is_zero() {
        let candles = vec![candle(101, 99, 100, 0), candle(103, 100, 102, 10)];
        let vwap = Vwap;
        let (_name, series) = &vwap.compute(&candles)[0];
        assert_eq!(series[0], None);
        assert!(series[1].is_some());
    }

    #[test]
    fn volume_profile_groups_trades_into_price_buckets() {
        let candles = vec![
            candle(101, 99, 100, 10),
            candle(101, 99, 100, 5),
            candle(111, 109, 110, 7),
        ];
        let profile = VolumeProfile {
            bucket_size: Decimal::from_int(10),
        };
        let buckets = profile.compute(&candles);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].volume, Decimal::from_int(15));
        assert_eq!(buckets[1].volume, Decimal::from_int(7));
    }
}
