use crate::instrument::{Side, TradingPair};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use zigquant_decimal::Decimal;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SignalType {
    EntryLong,
    EntryShort,
    ExitLong,
    ExitShort,
    Adjust,
}

/// A strategy's recommendation to the Execution Engine, not itself an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub signal_type: SignalType,
    pub pair: TradingPair,
    pub side: Side,
    pub price: Decimal,
    /// Confidence in `[0, 1]`.
    pub strength: Decimal,
    pub timestamp: Timestamp,
    pub metadata: Option<serde_json::Value>,
}

impl Signal {
    pub fn new(
        signal_type: SignalType,
        pair: TradingPair,
        side: Side,
        price: Decimal,
        strength: Decimal,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            signal_type,
            pair,
            side,
            price,
            strength,
            timestamp,
            metadata: None,
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self.signal_type, SignalType::EntryLong | SignalType::EntryShort)
    }

    pub fn is_exit(&self) -> bool {
        matches!(self.signal_type, SignalType::ExitLong | SignalType::ExitShort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_entry_and_exit_signals() {
        let pair = TradingPair::new("BTC", "USD");
        let entry = Signal::new(
            SignalType::EntryLong,
            pair.clone(),
            Side::Buy,
            Decimal::from_int(100),
            Decimal::from_int(1),
            Timestamp(0),
        );
        assert!(entry.is_entry());
        assert!(!entry.is_exit());

        let exit = Signal::new(
            SignalType::ExitLong,
            pair,
            Side::Sell,
            Decimal::from_int(100),
            Decimal::from_int(1),
            Timestamp(0),
        );
        assert!(exit.is_exit());
        assert!(!exit.is_entry());
    }
}
