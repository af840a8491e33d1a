use serde::{Deserialize, Serialize};
use zigquant_decimal::Decimal;

/// Margin summary for one margin mode (cross or per-symbol isolated).
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarginSummary {
    pub account_value: Decimal,
    pub total_margin_used: Decimal,
    pub total_notional_position: Decimal,
    pub total_raw_usd: Decimal,
}

/// Account-wide balance and margin state, as returned by
/// `IExecutionClient::get_balance`.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub margin_summary: MarginSummary,
    pub cross_margin_summary: MarginSummary,
    pub withdrawable: Decimal,
    pub cross_maintenance_margin_used: Decimal,
    pub cumulative_realised_pnl: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_balance_is_all_zero() {
        let balance = Balance::default();
        assert!(balance.withdrawable.is_zero());
        assert!(balance.margin_summary.account_value.is_zero());
    }
}
