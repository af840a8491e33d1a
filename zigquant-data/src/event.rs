use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use zigquant_core::bus::Quote;
use zigquant_core::candle::Candle;
use zigquant_core::orderbook::Orderbook;
use zigquant_core::trade::Trade;

/// A normalised message emitted by an [`crate::provider::IDataProvider`]. One
/// variant per connection-lifecycle event plus one per data kind (§4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataMessage {
    Connected,
    Disconnected,
    Quote { symbol: SmolStr, quote: Quote },
    Orderbook { symbol: SmolStr, book: Orderbook },
    Trade { symbol: SmolStr, trade: Trade },
    Candle { symbol: SmolStr, candle: Candle },
    Error { reason: String },
}

impl DataMessage {
    pub fn symbol(&self) -> Option<&str> {
        match self {
            DataMessage::Quote { symbol, .. }
            | DataMessage::Orderbook { symbol, .. }
            | DataMessage::Trade { symbol, .. }
            | DataMessage::Candle { symbol, .. } => Some(symbol.as_str()),
            DataMessage::Connected | DataMessage::Disconnected | DataMessage::Error { .. } => None,
        }
    }

    /// Orderbook full-refresh snapshots are never dropped under
    /// back-pressure (§4.D); every other message kind is droppable.
    pub fn is_snapshot(&self) -> bool {
        matches!(self, DataMessage::Orderbook { .. })
    }
}
