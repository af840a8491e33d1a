use crate::instrument::Side;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use zigquant_decimal::Decimal;

/// A single executed trade tick, either observed on the market-data feed or
/// produced by a fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: SmolStr,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp: Timestamp,
}
