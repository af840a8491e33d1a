//! Strategy Runner: owns one long-running strategy instance on a dedicated
//! worker thread, driven by commands over a channel and exposing a stats
//! snapshot (§4.I, §5).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use zigquant_core::bus::{BusEvent, MessageBus, Topic};
use zigquant_core::candle::Candle;
use zigquant_core::channel::UnboundedRx;
use zigquant_core::error::CoreError;
use zigquant_core::order::{OrderRequest, OrderType, PositionSide, TimeInForce};
use zigquant_core::position::{Leverage, MarginMode, Position};
use zigquant_core::signal::Signal;
use zigquant_core::time::Timestamp;
use zigquant_decimal::Decimal;
use zigquant_execution::engine::ExecutionEngine;
use zigquant_strategy::{SignalSink, Strategy, StrategyHost};

/// Pull source of new candles for one strategy's pair/timeframe. Mirrors
/// `zigquant_data::provider::IDataProvider::poll`'s pull shape (rather than
/// a push callback) so the runner thread alone decides when it reads, which
/// is what keeps "tick k completes before tick k+1 begins" (§5) trivially
/// true: the thread never receives a new candle while mid-tick.
pub trait CandleFeed: Send {
    /// Blocks up to `timeout` for the next candle. `None` means nothing
    /// arrived within the timeout, not end-of-stream; the runner keeps
    /// polling until told to stop.
    fn poll(&mut self, timeout: Duration) -> Option<Candle>;
}

impl CandleFeed for std::sync::mpsc::Receiver<Candle> {
    fn poll(&mut self, timeout: Duration) -> Option<Candle> {
        self.recv_timeout(timeout).ok()
    }
}

/// Commands consumed at tick boundaries, so the hosted strategy never
/// observes partial state (Design Note: "Runner → strategy communication").
#[derive(Debug, Clone)]
pub enum RunnerCommand {
    Pause,
    Resume,
    Stop,
    UpdateParams(serde_json::Map<String, serde_json::Value>),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum RunnerStatus {
    Queued,
    Running,
    Paused,
    Stopping,
    Stopped,
    Failed,
}

impl RunnerStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunnerStatus::Stopped | RunnerStatus::Failed)
    }
}

/// Point-in-time statistics, read by `get_stats` through an atomic pointer
/// swap: the worker publishes a fresh `Arc<RunnerStats>` under a lock held
/// only long enough to replace the pointer, so a reader never blocks behind
/// a tick in progress (§5: "a stats snapshot read through an atomic pointer
/// swap").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerStats {
    pub ticks_processed: u64,
    pub signals_emitted: u64,
    pub orders_submitted: u64,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StrategyRunnerConfig {
    /// How long `CandleFeed::poll` and the command drain may block per
    /// iteration; also the idle-loop interval while paused.
    pub tick_poll_timeout: Duration,
    /// Hard deadline `stop` waits for cooperative shutdown before detaching
    /// the worker thread (§5, default 5s).
    pub stop_deadline: Duration,
    pub signal_history_limit: usize,
    /// Fixed unit quantity traded for every entry/exit signal, since a
    /// [`Signal`] carries only a confidence `strength`, not a concrete size
    /// (mirrors `zigquant_backtest::BacktestConfig::position_size`).
    pub order_size: Decimal,
}

impl Default for StrategyRunnerConfig {
    fn default() -> Self {
        Self {
            tick_poll_timeout: Duration::from_millis(200),
            stop_deadline: Duration::from_secs(5),
            signal_history_limit: 256,
            order_size: Decimal::ONE,
        }
    }
}

/// Bridges strategy signals to the Execution Engine: submits a market
/// order sized by `quantity` for every emitted [`Signal`] and records it
/// into the bounded signal history `get_signal_history` reads from.
struct RecordingSink {
    execution: Arc<ExecutionEngine>,
    quantity: Decimal,
    history: Arc<Mutex<VecDeque<Signal>>>,
    history_limit: usize,
    emitted: Arc<AtomicU64>,
    submitted: Arc<AtomicU64>,
}

impl SignalSink for RecordingSink {
    fn forward(&self, signal: Signal) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = self.history.lock();
            history.push_back(signal.clone());
            while history.len() > self.history_limit {
                history.pop_front();
            }
        }

        let request = OrderRequest {
            client_order_id: None,
            symbol: SmolStr::new(signal.pair.to_string()),
            side: signal.side,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Ioc,
            price: None,
            quantity: self.quantity,
            trigger_price: None,
            reduce_only: signal.is_exit(),
            position_side: PositionSide::Both,
        };

        let result = self.execution.submit_order(request);
        if result.success {
            self.submitted.fetch_add(1, Ordering::Relaxed);
        } else {
            warn!(reason = ?result.reason, "strategy runner order submission failed");
        }
    }
}

fn flat_position(symbol: SmolStr) -> Position {
    Position::flat(
        symbol,
        Leverage {
            mode: MarginMode::Cross,
            multiplier: Decimal::ONE,
            notional: Decimal::ZERO,
        },
        Timestamp::now(),
    )
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "strategy runner panicked with a non-string payload".to_string()
    }
}

/// Owns one long-running strategy instance (§4.I). State machine: `queued ->
/// running <-> paused -> stopping -> stopped`, plus `failed` on an
/// unrecoverable worker panic.
pub struct StrategyRunner {
    id: SmolStr,
    command_tx: std::sync::mpsc::Sender<RunnerCommand>,
    status: Arc<Mutex<RunnerStatus>>,
    stats: Arc<Mutex<Arc<RunnerStats>>>,
    signal_history: Arc<Mutex<VecDeque<Signal>>>,
    execution: Arc<ExecutionEngine>,
    stop_deadline: Duration,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl StrategyRunner {
    /// Spawns the worker thread and begins ticking immediately (the
    /// `queued` state is transient: it lasts only until the thread's first
    /// loop iteration, mirroring `zigquant_data::DataEngine::add_provider`
    /// not exposing a separate post-construction "start").
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        id: impl Into<SmolStr>,
        strategy: Box<dyn Strategy>,
        feed: Box<dyn CandleFeed>,
        execution: Arc<ExecutionEngine>,
        bus: Option<Arc<MessageBus>>,
        indicator_cache_capacity: usize,
        config: StrategyRunnerConfig,
    ) -> Self {
        let id = id.into();
        let (command_tx, command_rx) = std::sync::mpsc::channel();
        let status = Arc::new(Mutex::new(RunnerStatus::Queued));
        let stats = Arc::new(Mutex::new(Arc::new(RunnerStats::default())));
        let signal_history = Arc::new(Mutex::new(VecDeque::new()));
        let emitted = Arc::new(AtomicU64::new(0));
        let submitted = Arc::new(AtomicU64::new(0));

        let sink = Box::new(RecordingSink {
            execution: Arc::clone(&execution),
            quantity: config.order_size,
            history: Arc::clone(&signal_history),
            history_limit: config.signal_history_limit.max(1),
            emitted: Arc::clone(&emitted),
            submitted: Arc::clone(&submitted),
        });
        let host = StrategyHost::new(strategy, indicator_cache_capacity, sink);
        let order_rx = bus.map(|bus| bus.subscribe(Topic::Order));

        let thread_id = id.clone();
        let thread_status = Arc::clone(&status);
        let thread_stats = Arc::clone(&stats);
        let thread_execution = Arc::clone(&execution);

        let thread = std::thread::spawn(move || {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                run_strategy_loop(
                    &thread_id,
                    host,
                    feed,
                    command_rx,
                    Arc::clone(&thread_status),
                    Arc::clone(&thread_stats),
                    emitted,
                    submitted,
                    order_rx,
                    thread_execution,
                    config,
                )
            }));

            if let Err(payload) = result {
                let reason = panic_message(&payload);
                error!(id = %thread_id, reason, "strategy runner panicked, marking failed");
                *thread_status.lock() = RunnerStatus::Failed;
                let mut snapshot = thread_stats.lock();
                *snapshot = Arc::new(RunnerStats {
                    last_error: Some(reason),
                    ..(**snapshot).clone()
                });
            }
        });

        Self {
            id,
            command_tx,
            status,
            stats,
            signal_history,
            execution,
            stop_deadline: config.stop_deadline,
            thread: Some(thread),
        }
    }

    pub fn id(&self) -> &SmolStr {
        &self.id
    }

    pub fn status(&self) -> RunnerStatus {
        *self.status.lock()
    }

    pub fn stats(&self) -> Arc<RunnerStats> {
        Arc::clone(&self.stats.lock())
    }

    /// The most recent `limit` signals emitted, oldest first.
    pub fn signal_history(&self, limit: usize) -> Vec<Signal> {
        let history = self.signal_history.lock();
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    pub fn pause(&self) -> Result<(), CoreError> {
        if self.status() != RunnerStatus::Running {
            return Err(CoreError::Precondition("strategy is not running".into()));
        }
        self.command_tx
            .send(RunnerCommand::Pause)
            .map_err(|_| CoreError::Internal("strategy worker thread is gone".into()))
    }

    pub fn resume(&self) -> Result<(), CoreError> {
        if self.status() != RunnerStatus::Paused {
            return Err(CoreError::Precondition("strategy is not paused".into()));
        }
        self.command_tx
            .send(RunnerCommand::Resume)
            .map_err(|_| CoreError::Internal("strategy worker thread is gone".into()))
    }

    /// Safe only while paused (§4.I); rejected with `Precondition`
    /// otherwise so a live tick never observes a partial parameter update.
    pub fn update_params(&self, params: serde_json::Map<String, serde_json::Value>) -> Result<(), CoreError> {
        if self.status() != RunnerStatus::Paused {
            return Err(CoreError::Precondition("update_params is only safe while paused".into()));
        }
        self.command_tx
            .send(RunnerCommand::UpdateParams(params))
            .map_err(|_| CoreError::Internal("strategy worker thread is gone".into()))
    }

    /// Cooperative stop (§5): signals the worker, waits up to
    /// `stop_deadline` for the current tick to finish and the thread to
    /// exit, then gives up and detaches it (dropped without joining; it
    /// keeps running until its own loop notices the channel is closed).
    pub fn stop(&mut self) -> Result<(), CoreError> {
        {
            let mut status = self.status.lock();
            if status.is_terminal() {
                return Ok(());
            }
            *status = RunnerStatus::Stopping;
        }
        let _ = self.command_tx.send(RunnerCommand::Stop);

        let deadline = Instant::now() + self.stop_deadline;
        while Instant::now() < deadline {
            if self.status.lock().is_terminal() {
                if let Some(thread) = self.thread.take() {
                    let _ = thread.join();
                }
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        warn!(id = %self.id, "strategy runner stop deadline exceeded, detaching worker thread");
        self.thread.take();
        Ok(())
    }

    /// Every currently non-flat position for this strategy's Execution
    /// Engine, used by the kill-switch's `close_positions` accounting.
    pub fn execution(&self) -> &Arc<ExecutionEngine> {
        &self.execution
    }
}

#[allow(clippy::too_many_arguments)]
fn run_strategy_loop(
    id: &SmolStr,
    mut host: StrategyHost,
    mut feed: Box<dyn CandleFeed>,
    command_rx: std::sync::mpsc::Receiver<RunnerCommand>,
    status: Arc<Mutex<RunnerStatus>>,
    stats: Arc<Mutex<Arc<RunnerStats>>>,
    emitted: Arc<AtomicU64>,
    submitted: Arc<AtomicU64>,
    mut order_rx: Option<UnboundedRx<BusEvent>>,
    execution: Arc<ExecutionEngine>,
    config: StrategyRunnerConfig,
) {
    *status.lock() = RunnerStatus::Running;
    let symbol = SmolStr::new(host.config().pair.to_string());
    let mut ticks_processed = 0u64;

    loop {
        match command_rx.try_recv() {
            Ok(RunnerCommand::Pause) => *status.lock() = RunnerStatus::Paused,
            Ok(RunnerCommand::Resume) => {
                let mut guard = status.lock();
                if *guard == RunnerStatus::Paused {
                    *guard = RunnerStatus::Running;
                }
            }
            Ok(RunnerCommand::Stop) => break,
            Ok(RunnerCommand::UpdateParams(params)) => host.update_params(&params),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => break,
            Err(std::sync::mpsc::TryRecvError::Empty) => {}
        }

        if *status.lock() == RunnerStatus::Paused {
            std::thread::sleep(config.tick_poll_timeout);
            continue;
        }

        if let Some(rx) = order_rx.as_mut() {
            for event in rx.try_recv_all() {
                match event {
                    BusEvent::Order(order) if order.symbol == symbol => {
                        let position = execution
                            .get_position(&symbol)
                            .unwrap_or_else(|| flat_position(symbol.clone()));
                        host.handle_order_update(&order, position);
                    }
                    BusEvent::OrderFill(fill) => host.handle_fill(&fill),
                    _ => {}
                }
            }
        }

        if let Some(candle) = feed.poll(config.tick_poll_timeout) {
            host.on_candle(candle);
            ticks_processed += 1;

            let mut snapshot = stats.lock();
            *snapshot = Arc::new(RunnerStats {
                ticks_processed,
                signals_emitted: emitted.load(Ordering::Relaxed),
                orders_submitted: submitted.load(Ordering::Relaxed),
                last_error: snapshot.last_error.clone(),
            });
        }
    }

    host.deinit();
    *status.lock() = RunnerStatus::Stopped;
    info!(id = %id, ticks_processed, "strategy runner stopped");
}
