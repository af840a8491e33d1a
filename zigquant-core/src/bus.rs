use crate::account::Balance;
use crate::candle::Candle;
use crate::channel::{mpsc_unbounded, ChannelTxDroppable, UnboundedRx, UnboundedTx};
use crate::order::Order;
use crate::orderbook::Orderbook;
use crate::position::Position;
use crate::trade::Trade;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::Arc;
use zigquant_decimal::Decimal;

/// Topics the bus carries. Fixed per the data model rather than open
/// strings, so publishers and subscribers cannot typo a topic name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Topic {
    MarketData,
    Orderbook,
    Trade,
    Candle,
    Order,
    OrderFill,
    Position,
    Account,
    Tick,
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: SmolStr,
    pub bid: Decimal,
    pub ask: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFillEvent {
    pub client_order_id: SmolStr,
    pub fill_quantity: Decimal,
    pub fill_price: Decimal,
    pub fee: Decimal,
}

/// Every message the bus can carry, one variant per [`Topic`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BusEvent {
    MarketData(Quote),
    Orderbook(Orderbook),
    Trade(Trade),
    Candle(Candle),
    Order(Order),
    OrderFill(OrderFillEvent),
    Position(Position),
    Account(Balance),
    Tick { timestamp: crate::time::Timestamp },
    Shutdown { reason: SmolStr },
}

impl BusEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::MarketData(_) => Topic::MarketData,
            BusEvent::Orderbook(_) => Topic::Orderbook,
            BusEvent::Trade(_) => Topic::Trade,
            BusEvent::Candle(_) => Topic::Candle,
            BusEvent::Order(_) => Topic::Order,
            BusEvent::OrderFill(_) => Topic::OrderFill,
            BusEvent::Position(_) => Topic::Position,
            BusEvent::Account(_) => Topic::Account,
            BusEvent::Tick { .. } => Topic::Tick,
            BusEvent::Shutdown { .. } => Topic::Shutdown,
        }
    }
}

struct TopicChannel {
    ingress: std::sync::mpsc::Sender<BusEvent>,
    subscribers: Arc<Mutex<Vec<ChannelTxDroppable<UnboundedTx<BusEvent>>>>>,
}

impl TopicChannel {
    /// Spawns the per-topic dispatcher thread (§5: the bus is
    /// single-threaded per topic). The dispatcher blocks on the ingress
    /// queue plainly, with no async runtime involved.
    fn new() -> Self {
        let (ingress, ingress_rx) = std::sync::mpsc::channel::<BusEvent>();
        let subscribers = Arc::new(Mutex::new(Vec::new()));
        let dispatch_subscribers = Arc::clone(&subscribers);

        std::thread::spawn(move || {
            for event in ingress_rx {
                let mut subs = dispatch_subscribers.lock();
                for sub in subs.iter_mut() {
                    sub.send(event.clone());
                }
                subs.retain(ChannelTxDroppable::is_active);
            }
        });

        Self {
            ingress,
            subscribers,
        }
    }
}

/// In-process typed publish-subscribe bus: one-to-many, same-thread delivery
/// per topic ordered by publish order (§4.B).
#[derive(Default)]
pub struct MessageBus {
    topics: Mutex<HashMap<Topic, TopicChannel>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
        }
    }

    pub fn publish(&self, event: BusEvent) {
        let topic = event.topic();
        let mut topics = self.topics.lock();
        let channel = topics.entry(topic).or_insert_with(TopicChannel::new);
        let _ = channel.ingress.send(event);
    }

    /// Registers a new subscriber for `topic`; the returned receiver observes
    /// every message published after this call, in publish order.
    pub fn subscribe(&self, topic: Topic) -> UnboundedRx<BusEvent> {
        let (tx, rx) = mpsc_unbounded();
        let mut topics = self.topics.lock();
        let channel = topics.entry(topic).or_insert_with(TopicChannel::new);
        channel.subscribers.lock().push(ChannelTxDroppable::new(tx));
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Timestamp;

    #[test]
    fn subscriber_receives_messages_in_publish_order() {
        let bus = MessageBus::new();
        let mut rx = bus.subscribe(Topic::Tick);

        bus.publish(BusEvent::Tick {
            timestamp: Timestamp(1),
        });
        bus.publish(BusEvent::Tick {
            timestamp: Timestamp(2),
        });

        std::thread::sleep(std::time::Duration::from_millis(50));
        let received: Vec<_> = rx.try_recv_all();
        assert_eq!(received.len(), 2);
        match (&received[0], &received[1]) {
            (BusEvent::Tick { timestamp: a }, BusEvent::Tick { timestamp: b }) => {
                assert_eq!(a.0, 1);
                assert_eq!(b.0, 2);
            }
            _ => panic!("unexpected event kind"),
        }
    }

    #[test]
    fn only_subscribers_of_the_right_topic_observe_an_event() {
        let bus = MessageBus::new();
        let mut tick_rx = bus.subscribe(Topic::Tick);
        let mut shutdown_rx = bus.subscribe(Topic::Shutdown);

        bus.publish(BusEvent::Tick {
            timestamp: Timestamp(1),
        });

        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(tick_rx.try_recv_all().len(), 1);
        assert_eq!(shutdown_rx.try_recv_all().len(), 0);
    }
}
