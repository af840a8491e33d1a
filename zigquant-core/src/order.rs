use crate::instrument::Side;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use zigquant_decimal::Decimal;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
    Trigger,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-till-cancelled.
    Gtc,
    /// Immediate-or-cancel.
    Ioc,
    /// Add-liquidity-only (post-only).
    Alo,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
    Both,
}

/// Status machine: `Pending -> Submitted -> {Open, Rejected} ->
/// {Filled, Cancelled, MarginCancelled, Triggered -> ...}`. Terminal states
/// are `Filled`, `Cancelled`, `Rejected`, `MarginCancelled`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Submitted,
    Open,
    Triggered,
    Filled,
    Cancelled,
    Rejected,
    MarginCancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled
                | OrderStatus::Rejected
                | OrderStatus::MarginCancelled
        )
    }

    /// Whether `self -> next` is a permitted edge in the status machine.
    /// Transitions must be monotonic: a terminal status accepts no further
    /// transitions.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Pending, Submitted)
                | (Submitted, Open)
                | (Submitted, Rejected)
                | (Submitted, Filled)
                | (Open, Triggered)
                | (Open, Filled)
                | (Open, Cancelled)
                | (Open, MarginCancelled)
                | (Triggered, Filled)
                | (Triggered, Cancelled)
                | (Triggered, MarginCancelled)
        )
    }
}

/// A caller's request to submit an order, before a `client_order_id` has
/// necessarily been assigned by the caller (the Execution Engine assigns one
/// if absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub client_order_id: Option<SmolStr>,
    pub symbol: SmolStr,
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    pub trigger_price: Option<Decimal>,
    pub reduce_only: bool,
    pub position_side: PositionSide,
}

/// A tracked order, identified by `client_order_id` and, once acknowledged,
/// by `exchange_order_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub client_order_id: SmolStr,
    pub exchange_order_id: Option<SmolStr>,
    pub symbol: SmolStr,
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub trigger_price: Option<Decimal>,
    pub reduce_only: bool,
    pub position_side: PositionSide,
    pub status: OrderStatus,
    pub average_fill_price: Option<Decimal>,
    pub accumulated_fees: Decimal,
    pub created_at: Timestamp,
    pub submitted_at: Option<Timestamp>,
    pub updated_at: Timestamp,
    pub filled_at: Option<Timestamp>,
}

impl Order {
    pub fn new(client_order_id: SmolStr, request: OrderRequest, now: Timestamp) -> Self {
        Self {
            client_order_id,
            exchange_order_id: None,
            symbol: request.symbol,
            side: request.side,
            order_type: request.order_type,
            time_in_force: request.time_in_force,
            price: request.price,
            quantity: request.quantity,
            filled_quantity: Decimal::ZERO,
            remaining_quantity: request.quantity,
            trigger_price: request.trigger_price,
            reduce_only: request.reduce_only,
            position_side: request.position_side,
            status: OrderStatus::Pending,
            average_fill_price: None,
            accumulated_fees: Decimal::ZERO,
            created_at: now,
            submitted_at: None,
            updated_at: now,
            filled_at: None,
        }
    }

    /// Attempts the transition, returning `false` and leaving state
    /// unchanged if the edge is not permitted.
    pub fn transition_to(&mut self, next: OrderStatus, now: Timestamp) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = now;
        if next == OrderStatus::Filled {
            self.filled_at = Some(now);
        }
        true
    }

    /// Applies a partial or full fill: updates filled/remaining quantity,
    /// size-weighted average fill price, and accumulated fees.
    pub fn apply_fill(&mut self, fill_quantity: Decimal, fill_price: Decimal, fee: Decimal, now: Timestamp) {
        let prior_notional = self.average_fill_price.unwrap_or(Decimal::ZERO) * self.filled_quantity;
        let fill_notional = fill_price * fill_quantity;
        let new_filled = self.filled_quantity + fill_quantity;

        self.average_fill_price = if new_filled.is_zero() {
            None
        } else {
            Some((prior_notional + fill_notional) / new_filled)
        };
        self.filled_quantity = new_filled;
        self.remaining_quantity = self.quantity - self.filled_quantity;
        self.accumulated_fees = self.accumulated_fees + fee;

        if self.remaining_quantity.is_zero() {
            self.transition_to(OrderStatus::Filled, now);
        } else {
            self.updated_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OrderRequest {
        OrderRequest {
            client_order_id: None,
            symbol: "BTC-PERP".into(),
            side: Side::Buy,
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Gtc,
            price: Some(Decimal::from_int(2000)),
            quantity: Decimal::from_int(2),
            trigger_price: None,
            reduce_only: false,
            position_side: PositionSide::Both,
        }
    }

    #[test]
    fn new_order_starts_pending_with_full_remaining_quantity() {
        let order = Order::new("A".into(), request(), Timestamp(0));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.remaining_quantity, order.quantity);
    }

    #[test]
    fn status_transitions_are_monotonic_and_illegal_edges_rejected() {
        let mut order = Order::new("A".into(), request(), Timestamp(0));
        assert!(order.transition_to(OrderStatus::Submitted, Timestamp(1)));
        assert!(order.transition_to(OrderStatus::Open, Timestamp(2)));
        assert!(order.transition_to(OrderStatus::Filled, Timestamp(3)));
        assert!(order.status.is_terminal());
        assert!(!order.transition_to(OrderStatus::Open, Timestamp(4)));
        assert_eq!(order.status, OrderStatus::Filled);
    }

    #[test]
    fn partial_then_full_fill_updates_average_price_and_terminal_status() {
        let mut order = Order::new("A".into(), request(), Timestamp(0));
        order.transition_to(OrderStatus::Submitted, Timestamp(1));
        order.transition_to(OrderStatus::Open, Timestamp(2));

        order.apply_fill(Decimal::from_int(1), Decimal::from_int(1990), Decimal::ZERO, Timestamp(3));
        assert_eq!(order.filled_quantity, Decimal::from_int(1));
        assert_eq!(order.remaining_quantity, Decimal::from_int(1));
        assert_eq!(order.status, OrderStatus::Open);

        order.apply_fill(Decimal::from_int(1), Decimal::from_int(2010), Decimal::ZERO, Timestamp(4));
        assert_eq!(order.filled_quantity, order.quantity);
        assert!(order.remaining_quantity.is_zero());
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.average_fill_price, Some(Decimal::from_int(2000)));
    }

    #[test]
    fn filled_plus_remaining_always_equals_quantity() {
        let mut order = Order::new("A".into(), request(), Timestamp(0));
        order.apply_fill(Decimal::from_string("0.75").unwrap(), Decimal::from_int(2000), Decimal::ZERO, Timestamp(1));
        assert_eq!(order.filled_quantity + order.remaining_quantity, order.quantity);
    }
}
