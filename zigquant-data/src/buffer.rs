use crate::event::DataMessage;
use std::collections::VecDeque;
use tracing::warn;

/// A bounded per-symbol staging queue (§4.D). On overflow the oldest
/// non-snapshot message is dropped; orderbook snapshots are never dropped.
/// If every queued message is a snapshot, the newest message is dropped
/// instead, since unbounded growth is worse than a stale read.
pub struct SymbolBuffer {
    symbol: String,
    depth: usize,
    messages: VecDeque<DataMessage>,
    dropped: u64,
}

impl SymbolBuffer {
    pub fn new(symbol: impl Into<String>, depth: usize) -> Self {
        assert!(depth > 0, "buffer depth must be positive");
        Self {
            symbol: symbol.into(),
            depth,
            messages: VecDeque::with_capacity(depth),
            dropped: 0,
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: DataMessage) {
        if self.messages.len() >= self.depth {
            if let Some(index) = self.messages.iter().position(|m| !m.is_snapshot()) {
                self.messages.remove(index);
                self.dropped += 1;
                warn!(symbol = %self.symbol, dropped_total = self.dropped, "back-pressure: dropped oldest non-snapshot message");
            } else if !message.is_snapshot() {
                self.dropped += 1;
                warn!(symbol = %self.symbol, dropped_total = self.dropped, "back-pressure: buffer full of snapshots, dropping incoming message");
                return;
            }
        }
        self.messages.push_back(message);
    }

    pub fn drain(&mut self) -> Vec<DataMessage> {
        self.messages.drain(..).collect()
    }

    pub fn pop_front(&mut self) -> Option<DataMessage> {
        self.messages.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zigquant_core::candle::Candle;
    use zigquant_core::orderbook::Orderbook;
    use zigquant_core::time::Timestamp;

    fn trade_message() -> DataMessage {
        DataMessage::Candle {
            symbol: "BTC-PERP".into(),
            candle: Candle {
                timestamp: Timestamp(0),
                open: zigquant_decimal::Decimal::ZERO,
                high: zigquant_decimal::Decimal::ZERO,
                low: zigquant_decimal::Decimal::ZERO,
                close: zigquant_decimal::Decimal::ZERO,
                volume: zigquant_decimal::Decimal::ZERO,
            },
        }
    }

    fn snapshot_message() -> DataMessage {
        DataMessage::Orderbook {
            symbol: "BTC-PERP".into(),
            book: Orderbook::new(Timestamp(0), vec![], vec![]),
        }
    }

    #[test]
    fn overflow_drops_oldest_non_snapshot() {
        let mut buffer = SymbolBuffer::new("BTC-PERP", 2);
        buffer.push(trade_message());
        buffer.push(trade_message());
        buffer.push(trade_message());

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.dropped_count(), 1);
    }

    #[test]
    fn snapshots_are_never_dropped() {
        let mut buffer = SymbolBuffer::new("BTC-PERP", 2);
        buffer.push(snapshot_message());
        buffer.push(snapshot_message());
        buffer.push(trade_message());

        assert_eq!(buffer.dropped_count(), 1);
        let drained = buffer.drain();
        assert_eq!(drained.len(), 2);
        assert!(drained.iter().all(DataMessage::is_snapshot));
    }
}
