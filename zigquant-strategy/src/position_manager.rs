use std::collections::HashMap;
use zigquant_core::instrument::TradingPair;
use zigquant_core::position::Position;
use zigquant_decimal::Decimal;

/// Strategy-local view of open positions keyed by pair (§4.F). Unrealised
/// P&L is derived from the cache's mark price; the authoritative position
/// still lives in the Execution Engine, reconciled here on every
/// order-update event.
#[derive(Debug, Default)]
pub struct PositionManager {
    positions: HashMap<TradingPair, Position>,
}

impl PositionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pair: &TradingPair) -> Option<&Position> {
        self.positions.get(pair)
    }

    pub fn is_flat(&self, pair: &TradingPair) -> bool {
        self.positions
            .get(pair)
            .map(|position| position.is_flat())
            .unwrap_or(true)
    }

    /// Overwrites the local view with the Execution Engine's authoritative
    /// position, called on every order-update event.
    pub fn reconcile(&mut self, pair: TradingPair, position: Position) {
        self.positions.insert(pair, position);
    }

    pub fn set_mark_price(&mut self, pair: &TradingPair, mark_price: Decimal, now: zigquant_core::time::Timestamp) {
        if let Some(position) = self.positions.get_mut(pair) {
            position.set_mark_price(mark_price, now);
        }
    }

    pub fn unrealised_pnl(&self, pair: &TradingPair) -> Option<Decimal> {
        self.positions.get(pair)?.unrealised_pnl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zigquant_core::position::{Leverage, MarginMode};
    use zigquant_core::time::Timestamp;

    fn leverage() -> Leverage {
        Leverage {
            mode: MarginMode::Cross,
            multiplier: Decimal::from_int(1),
            notional: Decimal::ZERO,
        }
    }

    #[test]
    fn unknown_pair_is_reported_flat() {
        let manager = PositionManager::new();
        assert!(manager.is_flat(&TradingPair::new("BTC", "USD")));
    }

    #[test]
    fn reconcile_replaces_the_local_view_and_set_mark_price_updates_pnl() {
        let mut manager = PositionManager::new();
        let pair = TradingPair::new("BTC", "USD");
        let mut position = Position::flat(pair.clone().to_string(), leverage(), Timestamp(0));
        position.apply_fill(Decimal::from_int(1), Decimal::from_int(100), Timestamp(1));
        manager.reconcile(pair.clone(), position);

        assert!(!manager.is_flat(&pair));
        manager.set_mark_price(&pair, Decimal::from_int(110), Timestamp(2));
        assert_eq!(manager.unrealised_pnl(&pair), Some(Decimal::from_int(10)));
    }
}
