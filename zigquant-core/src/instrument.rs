use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::{self, Formatter};

/// Side of a trade or position.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// A base/quote asset pair, e.g. `TradingPair::new("BTC", "USD")`.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize, Display)]
#[display("{base}-{quote}")]
pub struct TradingPair {
    pub base: SmolStr,
    pub quote: SmolStr,
}

impl TradingPair {
    pub fn new(base: impl Into<SmolStr>, quote: impl Into<SmolStr>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// The exchange-specific symbol this pair maps to, e.g. `"BTC-USD"`
    /// mapping to Hyperliquid's `"BTC"` perpetual symbol. The mapping itself
    /// is adapter-owned (see §4.K); this is the caller-supplied override.
    pub fn as_exchange_symbol(&self, mapping: &ExchangeSymbolMap) -> Option<SmolStr> {
        mapping.get(self)
    }
}

/// Per-adapter mapping from [`TradingPair`] to the exchange's native symbol
/// string. Owned by whichever adapter implements `IDataProvider`/
/// `IExecutionClient`; the core only consumes it.
#[derive(Debug, Clone, Default)]
pub struct ExchangeSymbolMap {
    entries: std::collections::HashMap<TradingPair, SmolStr>,
}

impl ExchangeSymbolMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pair: TradingPair, symbol: impl Into<SmolStr>) {
        self.entries.insert(pair, symbol.into());
    }

    pub fn get(&self, pair: &TradingPair) -> Option<SmolStr> {
        self.entries.get(pair).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trading_pair_displays_as_base_dash_quote() {
        let pair = TradingPair::new("BTC", "USD");
        assert_eq!(pair.to_string(), "BTC-USD");
    }

    #[test]
    fn symbol_map_resolves_registered_pairs_only() {
        let mut map = ExchangeSymbolMap::new();
        let pair = TradingPair::new("ETH", "USD");
        map.insert(pair.clone(), "ETH");
        assert_eq!(pair.as_exchange_symbol(&map).as_deref(), Some("ETH"));

        let unknown = TradingPair::new("SOL", "USD");
        assert!(unknown.as_exchange_symbol(&map).is_none());
    }
}
