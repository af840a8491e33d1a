use crate::account::Balance;
use crate::bus::Quote;
use crate::error::CoreError;
use crate::time::{DurationMs, Timestamp};
use parking_lot::RwLock;
use smol_str::SmolStr;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Stamped<T> {
    value: T,
    observed_at: Timestamp,
}

/// Latest-value cache for market data: one writer (the Data Engine), many
/// readers (strategies), per-symbol locking (§4.C, §5).
#[derive(Default)]
pub struct MarketDataCache {
    quotes: RwLock<HashMap<SmolStr, Stamped<Quote>>>,
    bars: RwLock<HashMap<(SmolStr, i64), Stamped<crate::candle::Candle>>>,
    balance: RwLock<Option<Stamped<Balance>>>,
}

impl MarketDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_quote(&self, symbol: impl Into<SmolStr>, quote: Quote, now: Timestamp) {
        self.quotes.write().insert(
            symbol.into(),
            Stamped {
                value: quote,
                observed_at: now,
            },
        );
    }

    pub fn update_bar(&self, symbol: impl Into<SmolStr>, timeframe_ms: i64, bar: crate::candle::Candle, now: Timestamp) {
        self.bars.write().insert(
            (symbol.into(), timeframe_ms),
            Stamped {
                value: bar,
                observed_at: now,
            },
        );
    }

    pub fn update_balance(&self, balance: Balance, now: Timestamp) {
        *self.balance.write() = Some(Stamped {
            value: balance,
            observed_at: now,
        });
    }

    /// Returns the latest quote for `symbol`, failing with [`CoreError::Stale`]
    /// if it was observed further than `max_age` in the past, relative to
    /// `now`.
    pub fn latest_quote(&self, symbol: &str, max_age: DurationMs, now: Timestamp) -> Result<Quote, CoreError> {
        let guard = self.quotes.read();
        let entry = guard
            .get(symbol)
            .ok_or_else(|| CoreError::UnknownSymbol(symbol.to_string()))?;
        if now - entry.observed_at > max_age {
            return Err(CoreError::Stale);
        }
        Ok(entry.value.clone())
    }

    pub fn latest_bar(
        &self,
        symbol: &str,
        timeframe_ms: i64,
        max_age: DurationMs,
        now: Timestamp,
    ) -> Result<crate::candle::Candle, CoreError> {
        let guard = self.bars.read();
        let entry = guard
            .get(&(SmolStr::new(symbol), timeframe_ms))
            .ok_or_else(|| CoreError::UnknownSymbol(symbol.to_string()))?;
        if now - entry.observed_at > max_age {
            return Err(CoreError::Stale);
        }
        Ok(entry.value)
    }

    pub fn latest_balance(&self, max_age: DurationMs, now: Timestamp) -> Result<Balance, CoreError> {
        let guard = self.balance.read();
        let entry = guard
            .as_ref()
            .ok_or_else(|| CoreError::Precondition("no balance observed yet".into()))?;
        if now - entry.observed_at > max_age {
            return Err(CoreError::Stale);
        }
        Ok(entry.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(symbol: &str) -> Quote {
        Quote {
            symbol: symbol.into(),
            bid: zigquant_decimal::Decimal::from_int(100),
            ask: zigquant_decimal::Decimal::from_int(101),
        }
    }

    #[test]
    fn unknown_symbol_is_an_error_not_a_panic() {
        let cache = MarketDataCache::new();
        let err = cache
            .latest_quote("BTC-PERP", DurationMs(1_000), Timestamp(0))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn stale_read_past_the_bound_is_rejected() {
        let cache = MarketDataCache::new();
        cache.update_quote("BTC-PERP", quote("BTC-PERP"), Timestamp(0));

        let fresh = cache.latest_quote("BTC-PERP", DurationMs(1_000), Timestamp(500));
        assert!(fresh.is_ok());

        let stale = cache.latest_quote("BTC-PERP", DurationMs(1_000), Timestamp(5_000));
        assert!(matches!(stale, Err(CoreError::Stale)));
    }
}
