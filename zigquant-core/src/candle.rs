use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use zigquant_decimal::Decimal;

/// A single OHLCV bar.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: Timestamp,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// An ordered sequence of [`Candle`]s plus a side table of indicator outputs,
/// one parallel `Vec<Option<Decimal>>` per indicator name, each the same
/// length as `candles`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candles {
    candles: Vec<Candle>,
    indicators: HashMap<String, Vec<Option<Decimal>>>,
}

impl Candles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(candles: Vec<Candle>) -> Self {
        debug_assert!(
            candles.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
            "candles must be ordered by timestamp"
        );
        Self {
            candles,
            indicators: HashMap::new(),
        }
    }

    /// Appends a candle, or replaces the last one if it shares the same
    /// timestamp (an in-progress bar being updated tick-by-tick).
    pub fn push_or_update(&mut self, candle: Candle) {
        match self.candles.last_mut() {
            Some(last) if last.timestamp == candle.timestamp => *last = candle,
            _ => {
                self.candles.push(candle);
                for series in self.indicators.values_mut() {
                    series.push(None);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.candles.iter().map(|c| c.close)
    }

    /// Identity fingerprint used to key the indicator cache (§4.E):
    /// length plus last timestamp is sufficient since candles are only ever
    /// appended or have their last element replaced.
    pub fn fingerprint(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.candles.len().hash(&mut hasher);
        if let Some(last) = self.candles.last() {
            last.timestamp.hash(&mut hasher);
        }
        hasher.finish()
    }

    pub fn indicator(&self, name: &str) -> Option<&[Option<Decimal>]> {
        self.indicators.get(name).map(Vec::as_slice)
    }

    pub fn set_indicator(&mut self, name: impl Into<String>, values: Vec<Option<Decimal>>) {
        self.indicators.insert(name.into(), values);
    }
}
