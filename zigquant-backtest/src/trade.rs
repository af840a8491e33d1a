use serde::{Deserialize, Serialize};
use zigquant_core::instrument::{Side, TradingPair};
use zigquant_core::time::Timestamp;
use zigquant_decimal::Decimal;

/// One completed round trip: an entry fill followed by the exit fill that
/// flattened it (§4.H trade log).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub pair: TradingPair,
    pub side: Side,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub entry_timestamp: Timestamp,
    pub exit_timestamp: Timestamp,
    pub realised_pnl: Decimal,
    pub fees: Decimal,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.realised_pnl.is_positive()
    }
}

/// Equity observed at one candle's close: cash plus mark-to-market value of
/// any open position (§4.H).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EquitySnapshot {
    pub timestamp: Timestamp,
    pub equity: Decimal,
}
