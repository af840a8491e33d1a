use indexmap::IndexMap;
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::collections::HashMap;
use zigquant_core::order::{Order, OrderStatus};

/// Live order book keyed by `client_order_id`, with a reverse index from
/// `exchange_order_id` so cancellations and fill events can resolve against
/// either identifier (§4.G). One mutex guards both maps; order-rate is far
/// below data-rate so contention is not a concern (§5).
#[derive(Default)]
pub struct OrderTracker {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    orders: IndexMap<SmolStr, Order>,
    exchange_to_client: HashMap<SmolStr, SmolStr>,
}

impl OrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: Order) {
        let mut inner = self.inner.lock();
        if let Some(exchange_id) = order.exchange_order_id.clone() {
            inner
                .exchange_to_client
                .insert(exchange_id, order.client_order_id.clone());
        }
        inner.orders.insert(order.client_order_id.clone(), order);
    }

    pub fn contains_client_id(&self, client_order_id: &SmolStr) -> bool {
        self.inner.lock().orders.contains_key(client_order_id)
    }

    /// Records the exchange's acknowledgement of `client_order_id` under
    /// `exchange_order_id`, adding the reverse-lookup entry.
    pub fn record_exchange_id(&self, client_order_id: &SmolStr, exchange_order_id: SmolStr) {
        let mut inner = self.inner.lock();
        inner
            .exchange_to_client
            .insert(exchange_order_id.clone(), client_order_id.clone());
        if let Some(order) = inner.orders.get_mut(client_order_id) {
            order.exchange_order_id = Some(exchange_order_id);
        }
    }

    /// Resolves `id` as either a client or exchange order id to the owning
    /// `client_order_id`.
    pub fn resolve(&self, id: &SmolStr) -> Option<SmolStr> {
        let inner = self.inner.lock();
        if inner.orders.contains_key(id) {
            return Some(id.clone());
        }
        inner.exchange_to_client.get(id).cloned()
    }

    pub fn status(&self, client_order_id: &SmolStr) -> Option<OrderStatus> {
        self.inner
            .lock()
            .orders
            .get(client_order_id)
            .map(|order| order.status)
    }

    pub fn get(&self, client_order_id: &SmolStr) -> Option<Order> {
        self.inner.lock().orders.get(client_order_id).cloned()
    }

    /// Applies `f` to the tracked order for `client_order_id`, if present,
    /// and returns its result.
    pub fn update<R>(&self, client_order_id: &SmolStr, f: impl FnOnce(&mut Order) -> R) -> Option<R> {
        let mut inner = self.inner.lock();
        inner.orders.get_mut(client_order_id).map(f)
    }

    /// Client order ids of every tracked order not yet in a terminal status,
    /// used by the kill-switch to cancel all working orders (§4.J).
    pub fn open_client_order_ids(&self) -> Vec<SmolStr> {
        self.inner
            .lock()
            .orders
            .values()
            .filter(|order| !order.status.is_terminal())
            .map(|order| order.client_order_id.clone())
            .collect()
    }

    pub fn recent_submissions_for_symbol(&self, symbol: &str, since_ms: i64) -> usize {
        self.inner
            .lock()
            .orders
            .values()
            .filter(|order| {
                order.symbol.as_str() == symbol
                    && order.submitted_at.map(|ts| ts.0).unwrap_or(i64::MIN) >= since_ms
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zigquant_core::instrument::Side;
    use zigquant_core::order::{OrderRequest, OrderType, PositionSide, TimeInForce};
    use zigquant_core::time::Timestamp;
    use zigquant_decimal::Decimal;

    fn order(client_id: &str) -> Order {
        Order::new(
            SmolStr::new(client_id),
            OrderRequest {
                client_order_id: None,
                symbol: "BTC-PERP".into(),
                side: Side::Buy,
                order_type: OrderType::Market,
                time_in_force: TimeInForce::Ioc,
                price: None,
                quantity: Decimal::from_int(1),
                trigger_price: None,
                reduce_only: false,
                position_side: PositionSide::Both,
            },
            Timestamp(0),
        )
    }

    #[test]
    fn resolves_by_either_identifier() {
        let tracker = OrderTracker::new();
        tracker.insert(order("A"));
        tracker.record_exchange_id(&SmolStr::new("A"), SmolStr::new("EX-1"));

        assert_eq!(tracker.resolve(&SmolStr::new("A")), Some(SmolStr::new("A")));
        assert_eq!(tracker.resolve(&SmolStr::new("EX-1")), Some(SmolStr::new("A")));
        assert_eq!(tracker.resolve(&SmolStr::new("missing")), None);
    }

    #[test]
    fn update_mutates_the_tracked_order_in_place() {
        let tracker = OrderTracker::new();
        tracker.insert(order("A"));
        tracker.update(&SmolStr::new("A"), |order| {
            order.transition_to(zigquant_core::order::OrderStatus::Submitted, Timestamp(1));
        });
        assert_eq!(tracker.status(&SmolStr::new("A")), Some(zigquant_core::order::OrderStatus::Submitted));
    }
}
