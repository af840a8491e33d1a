use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SubscriptionKind {
    Quote,
    Orderbook,
    Trade,
    Candle,
    All,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    pub symbol: SmolStr,
    pub kind: SubscriptionKind,
}

impl Subscription {
    pub fn new(symbol: impl Into<SmolStr>, kind: SubscriptionKind) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
        }
    }
}
