use crate::buffer::SymbolBuffer;
use crate::event::DataMessage;
use crate::provider::IDataProvider;
use crate::subscription::Subscription;
use parking_lot::{Condvar, Mutex};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProviderStatus {
    Connected,
    /// Disconnected and mid-reconnect; reads against this provider's data
    /// should be treated as stale (§4.D).
    Stale,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct DataEngineConfig {
    pub buffer_depth_per_symbol: usize,
    pub max_reconnect_attempts: u32,
    pub reconnect_window: Duration,
    pub idle_poll_interval: Duration,
}

impl Default for DataEngineConfig {
    fn default() -> Self {
        Self {
            buffer_depth_per_symbol: 1_024,
            max_reconnect_attempts: 5,
            reconnect_window: Duration::from_secs(60),
            idle_poll_interval: Duration::from_millis(5),
        }
    }
}

enum ProviderCommand {
    Subscribe(Subscription),
    Unsubscribe(SmolStr),
    Shutdown,
}

struct ProviderEntry {
    status: Arc<Mutex<ProviderStatus>>,
    command_tx: std::sync::mpsc::Sender<ProviderCommand>,
    thread: Option<std::thread::JoinHandle<()>>,
}

/// A consumer's bounded per-symbol queue: the same [`SymbolBuffer`] the
/// provider thread pushes into, so the drop-oldest-non-snapshot policy is
/// what a consumer actually observes rather than a side metric (§4.D, §5
/// "delivers via bounded queues to consumer threads").
struct BufferedQueue {
    buffer: Mutex<SymbolBuffer>,
    condvar: Condvar,
}

/// Consumer handle for one symbol subscription, returned by
/// [`DataEngine::subscribe_consumer`].
pub struct BufferedReceiver {
    queue: Arc<BufferedQueue>,
}

impl BufferedReceiver {
    /// Drains every currently-buffered message without blocking.
    pub fn try_recv_all(&self) -> Vec<DataMessage> {
        self.queue.buffer.lock().drain()
    }

    /// Blocks up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<DataMessage> {
        let mut guard = self.queue.buffer.lock();
        if guard.is_empty() {
            self.queue.condvar.wait_for(&mut guard, timeout);
        }
        guard.pop_front()
    }

    /// Messages this subscription's queue has dropped under back-pressure.
    pub fn dropped_count(&self) -> u64 {
        self.queue.buffer.lock().dropped_count()
    }
}

/// Binds to one or more [`IDataProvider`] implementations, multiplexes their
/// subscriptions, and fans out normalised messages to consumers (§4.D).
#[derive(Default)]
pub struct DataEngine {
    config: DataEngineConfig,
    providers: Mutex<HashMap<SmolStr, ProviderEntry>>,
    symbol_subscribers: Arc<Mutex<HashMap<SmolStr, Vec<Weak<BufferedQueue>>>>>,
}

impl DataEngine {
    pub fn new(config: DataEngineConfig) -> Self {
        Self {
            config,
            providers: Mutex::new(HashMap::new()),
            symbol_subscribers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers and starts a provider on its own dedicated thread (§5).
    pub fn add_provider(
        &self,
        id: impl Into<SmolStr>,
        provider: Box<dyn IDataProvider>,
        initial_subscriptions: Vec<Subscription>,
    ) {
        let id = id.into();
        let (command_tx, command_rx) = std::sync::mpsc::channel();
        let status = Arc::new(Mutex::new(ProviderStatus::Stale));

        let thread_status = Arc::clone(&status);
        let thread_symbol_subscribers = Arc::clone(&self.symbol_subscribers);
        let config = self.config;
        let thread_id = id.clone();

        let thread = std::thread::spawn(move || {
            run_provider_loop(
                thread_id,
                provider,
                initial_subscriptions,
                command_rx,
                thread_status,
                thread_symbol_subscribers,
                config,
            );
        });

        self.providers.lock().insert(
            id,
            ProviderEntry {
                status,
                command_tx,
                thread: Some(thread),
            },
        );
    }

    pub fn status(&self, provider_id: &str) -> Option<ProviderStatus> {
        self.providers.lock().get(provider_id).map(|p| *p.status.lock())
    }

    pub fn subscribe(&self, provider_id: &str, subscription: Subscription) {
        if let Some(entry) = self.providers.lock().get(provider_id) {
            let _ = entry.command_tx.send(ProviderCommand::Subscribe(subscription));
        }
    }

    pub fn unsubscribe(&self, provider_id: &str, symbol: impl Into<SmolStr>) {
        if let Some(entry) = self.providers.lock().get(provider_id) {
            let _ = entry.command_tx.send(ProviderCommand::Unsubscribe(symbol.into()));
        }
    }

    pub fn shutdown_provider(&self, provider_id: &str) {
        let thread = {
            let mut providers = self.providers.lock();
            providers.get_mut(provider_id).and_then(|entry| {
                let _ = entry.command_tx.send(ProviderCommand::Shutdown);
                entry.thread.take()
            })
        };
        if let Some(thread) = thread {
            let _ = thread.join();
        }
    }

    /// Registers a consumer for every message concerning `symbol`, across
    /// every provider. Messages are forwarded in each provider's emission
    /// order (§8, testable property 7) through a queue bounded to
    /// `buffer_depth_per_symbol`, applying the drop-oldest-non-snapshot
    /// policy (§4.D) when this consumer falls behind.
    pub fn subscribe_consumer(&self, symbol: impl Into<SmolStr>) -> BufferedReceiver {
        let symbol = symbol.into();
        let queue = Arc::new(BufferedQueue {
            buffer: Mutex::new(SymbolBuffer::new(symbol.as_str(), self.config.buffer_depth_per_symbol)),
            condvar: Condvar::new(),
        });
        self.symbol_subscribers
            .lock()
            .entry(symbol)
            .or_default()
            .push(Arc::downgrade(&queue));
        BufferedReceiver { queue }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_provider_loop(
    provider_id: SmolStr,
    mut provider: Box<dyn IDataProvider>,
    initial_subscriptions: Vec<Subscription>,
    command_rx: std::sync::mpsc::Receiver<ProviderCommand>,
    status: Arc<Mutex<ProviderStatus>>,
    symbol_subscribers: Arc<Mutex<HashMap<SmolStr, Vec<Weak<BufferedQueue>>>>>,
    config: DataEngineConfig,
) {
    let mut active_subscriptions = initial_subscriptions;
    let mut failure_timestamps: Vec<Instant> = Vec::new();

    if let Err(err) = provider.connect() {
        error!(provider = %provider_id, %err, "initial connect failed");
        *status.lock() = ProviderStatus::Failed;
        return;
    }
    for subscription in &active_subscriptions {
        let _ = provider.subscribe(subscription.clone());
    }
    *status.lock() = ProviderStatus::Connected;

    loop {
        match command_rx.try_recv() {
            Ok(ProviderCommand::Subscribe(subscription)) => {
                if !active_subscriptions.contains(&subscription) {
                    if provider.subscribe(subscription.clone()).is_ok() {
                        active_subscriptions.push(subscription);
                    }
                }
            }
            Ok(ProviderCommand::Unsubscribe(symbol)) => {
                let _ = provider.unsubscribe(&symbol);
                active_subscriptions.retain(|s| s.symbol != symbol);
            }
            Ok(ProviderCommand::Shutdown) => {
                provider.disconnect();
                return;
            }
            Err(std::sync::mpsc::TryRecvError::Disconnected) => return,
            Err(std::sync::mpsc::TryRecvError::Empty) => {}
        }

        match provider.poll() {
            Some(DataMessage::Connected) => {
                *status.lock() = ProviderStatus::Connected;
            }
            Some(DataMessage::Disconnected) => {
                *status.lock() = ProviderStatus::Stale;
                if !reconnect(&provider_id, provider.as_mut(), &active_subscriptions, &mut failure_timestamps, &config) {
                    *status.lock() = ProviderStatus::Failed;
                    warn!(provider = %provider_id, "provider failed persistently, stopping subscriptions");
                    for subscription in &active_subscriptions {
                        let _ = provider.unsubscribe(&subscription.symbol);
                    }
                    return;
                }
                *status.lock() = ProviderStatus::Connected;
            }
            Some(DataMessage::Error { reason }) => {
                warn!(provider = %provider_id, reason, "data provider surfaced an error, continuing");
            }
            Some(message) => {
                if let Some(symbol) = message.symbol() {
                    let symbol = SmolStr::new(symbol);
                    dispatch(&symbol, message, &symbol_subscribers);
                }
            }
            None => std::thread::sleep(config.idle_poll_interval),
        }
    }
}

/// Re-issues every active subscription (mandatory replay, §4.D / §9).
/// Returns `false` once `max_reconnect_attempts` failures have occurred
/// within `reconnect_window`.
fn reconnect(
    provider_id: &str,
    provider: &mut dyn IDataProvider,
    active_subscriptions: &[Subscription],
    failure_timestamps: &mut Vec<Instant>,
    config: &DataEngineConfig,
) -> bool {
    let now = Instant::now();
    failure_timestamps.retain(|t| now.duration_since(*t) <= config.reconnect_window);
    failure_timestamps.push(now);

    if failure_timestamps.len() as u32 > config.max_reconnect_attempts {
        return false;
    }

    if provider.connect().is_err() {
        return true; // transient; will retry on next Disconnected observation
    }

    for subscription in active_subscriptions {
        let _ = provider.subscribe(subscription.clone());
    }
    info!(provider = %provider_id, count = active_subscriptions.len(), "replayed subscriptions after reconnect");
    true
}

/// Pushes `message` into every live subscriber's own bounded buffer,
/// applying the drop-oldest-non-snapshot policy per subscriber (§4.D) rather
/// than forwarding around it, and prunes subscribers whose [`BufferedReceiver`]
/// has been dropped.
fn dispatch(symbol: &SmolStr, message: DataMessage, symbol_subscribers: &Mutex<HashMap<SmolStr, Vec<Weak<BufferedQueue>>>>) {
    let mut subscribers = symbol_subscribers.lock();
    if let Some(subs) = subscribers.get_mut(symbol) {
        subs.retain(|weak| {
            let Some(queue) = weak.upgrade() else {
                return false;
            };
            queue.buffer.lock().push(message.clone());
            queue.condvar.notify_all();
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockDataProvider;
    use crate::subscription::SubscriptionKind;
    use zigquant_core::candle::Candle;
    use zigquant_core::time::Timestamp;
    use zigquant_decimal::Decimal;

    fn candle_message(symbol: &str, close: i64) -> DataMessage {
        DataMessage::Candle {
            symbol: symbol.into(),
            candle: Candle {
                timestamp: Timestamp(close),
                open: Decimal::from_int(close),
                high: Decimal::from_int(close),
                low: Decimal::from_int(close),
                close: Decimal::from_int(close),
                volume: Decimal::ZERO,
            },
        }
    }

    #[test]
    fn consumer_observes_messages_in_provider_emission_order() {
        let mut mock = MockDataProvider::new();
        mock.push(candle_message("BTC-PERP", 1));
        mock.push(candle_message("BTC-PERP", 2));
        mock.push(candle_message("BTC-PERP", 3));

        let engine = DataEngine::new(DataEngineConfig::default());
        let rx = engine.subscribe_consumer("BTC-PERP");
        engine.add_provider(
            "mock",
            Box::new(mock),
            vec![Subscription::new("BTC-PERP", SubscriptionKind::Candle)],
        );

        std::thread::sleep(Duration::from_millis(100));
        engine.shutdown_provider("mock");

        let received = rx.try_recv_all();
        let closes: Vec<Decimal> = received
            .into_iter()
            .filter_map(|m| match m {
                DataMessage::Candle { candle, .. } => Some(candle.close),
                _ => None,
            })
            .collect();
        assert_eq!(
            closes,
            vec![Decimal::from_int(1), Decimal::from_int(2), Decimal::from_int(3)]
        );
    }

    #[test]
    fn a_consumer_that_never_drains_observes_the_back_pressure_policy() {
        let mut mock = MockDataProvider::new();
        for close in 1..=5 {
            mock.push(candle_message("BTC-PERP", close));
        }

        let config = DataEngineConfig {
            buffer_depth_per_symbol: 2,
            ..DataEngineConfig::default()
        };
        let engine = DataEngine::new(config);
        let rx = engine.subscribe_consumer("BTC-PERP");
        engine.add_provider(
            "mock",
            Box::new(mock),
            vec![Subscription::new("BTC-PERP", SubscriptionKind::Candle)],
        );

        std::thread::sleep(Duration::from_millis(100));
        engine.shutdown_provider("mock");

        assert_eq!(rx.dropped_count(), 3);
        let received = rx.try_recv_all();
        let closes: Vec<Decimal> = received
            .into_iter()
            .filter_map(|m| match m {
                DataMessage::Candle { candle, .. } => Some(candle.close),
                _ => None,
            })
            .collect();
        assert_eq!(closes, vec![Decimal::from_int(4), Decimal::from_int(5)]);
    }

    #[test]
    fn reconnect_replays_active_subscriptions() {
        let mut mock = MockDataProvider::new();
        mock.push(DataMessage::Disconnected);
        let engine = DataEngine::new(DataEngineConfig::default());
        engine.add_provider(
            "mock",
            Box::new(mock),
            vec![Subscription::new("BTC-PERP", SubscriptionKind::Quote)],
        );

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(engine.status("mock"), Some(ProviderStatus::Connected));
        engine.shutdown_provider("mock");
    }
}
