use crate::client::IExecutionClient;
use crate::id::ClientOrderIdGenerator;
use crate::order_tracker::OrderTracker;
use crate::risk::{self, RiskContext, RiskLimits};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use zigquant_core::account::Balance;
use zigquant_core::bus::{BusEvent, MessageBus, OrderFillEvent};
use zigquant_core::error::CoreError;
use zigquant_core::instrument::Side;
use zigquant_core::order::{Order, OrderRequest, OrderStatus, OrderType};
use zigquant_core::position::{Leverage, MarginMode, Position};
use zigquant_core::time::Timestamp;
use zigquant_decimal::Decimal;

/// Submission retry protocol (§4.G): the same `client_order_id` is reused on
/// every attempt so the adapter can deduplicate, with exponential backoff
/// capped at `backoff_cap_ms`.
#[derive(Debug, Copy, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub backoff_cap_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 1_000,
            backoff_cap_ms: 8_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionEngineConfig {
    pub risk_limits: RiskLimits,
    pub retry: RetryConfig,
    pub rate_limit_window: Duration,
}

impl Default for ExecutionEngineConfig {
    fn default() -> Self {
        Self {
            risk_limits: RiskLimits::default(),
            retry: RetryConfig::default(),
            rate_limit_window: Duration::from_secs(60),
        }
    }
}

/// Outcome of [`ExecutionEngine::submit_order`] (§4.G).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub client_order_id: SmolStr,
    pub success: bool,
    pub exchange_order_id: Option<SmolStr>,
    pub status: Option<OrderStatus>,
    pub reason: Option<String>,
}

/// Order lifecycle management: pre-trade risk gates, submission with
/// same-identifier retry, cancellation, and fill reconciliation into the
/// position book (§4.G).
pub struct ExecutionEngine {
    config: ExecutionEngineConfig,
    client: Mutex<Box<dyn IExecutionClient>>,
    tracker: OrderTracker,
    id_generator: ClientOrderIdGenerator,
    positions: Mutex<HashMap<SmolStr, Position>>,
    bus: Option<Arc<MessageBus>>,
    daily_pnl: Mutex<Decimal>,
}

impl ExecutionEngine {
    pub fn new(
        config: ExecutionEngineConfig,
        client: Box<dyn IExecutionClient>,
        bus: Option<Arc<MessageBus>>,
    ) -> Self {
        Self {
            config,
            client: Mutex::new(client),
            tracker: OrderTracker::new(),
            id_generator: ClientOrderIdGenerator::new(),
            positions: Mutex::new(HashMap::new()),
            bus,
            daily_pnl: Mutex::new(Decimal::ZERO),
        }
    }

    fn publish(&self, event: BusEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }

    fn risk_context(&self, request: &OrderRequest) -> RiskContext {
        let positions = self.positions.lock();
        let position = positions.get(request.symbol.as_str());
        RiskContext {
            mark_price: position.and_then(|p| p.mark_price).or(request.price),
            current_position_size: position.map(|p| p.size).unwrap_or(Decimal::ZERO),
            current_leverage: position.map(|p| p.leverage.multiplier),
            daily_pnl: *self.daily_pnl.lock(),
        }
    }

    /// Validates `request` against the configured risk gates, assigns a
    /// `client_order_id` if absent, and submits it with same-identifier
    /// retry on transport failure (§4.G steps 1-5).
    pub fn submit_order(&self, mut request: OrderRequest) -> OrderResult {
        let now = Timestamp::now();
        let client_order_id = request
            .client_order_id
            .take()
            .unwrap_or_else(|| self.id_generator.next(now));

        if self.tracker.contains_client_id(&client_order_id) {
            return OrderResult {
                client_order_id,
                success: false,
                exchange_order_id: None,
                status: None,
                reason: Some(CoreError::DuplicateClientOrderId(client_order_id.to_string()).to_string()),
            };
        }

        let recent = self
            .tracker
            .recent_submissions_for_symbol(&request.symbol, now.0 - self.config.rate_limit_window.as_millis() as i64);
        let context = self.risk_context(&request);
        if let Err(err) = risk::evaluate(&self.config.risk_limits, &request, &context, recent) {
            warn!(client_order_id = %client_order_id, %err, "order rejected by pre-trade risk gates");
            return OrderResult {
                client_order_id,
                success: false,
                exchange_order_id: None,
                status: None,
                reason: Some(err.to_string()),
            };
        }

        let mut order = Order::new(client_order_id.clone(), request.clone(), now);
        order.transition_to(OrderStatus::Submitted, now);
        order.submitted_at = Some(now);
        self.tracker.insert(order);

        let mut attempt = 0u32;
        loop {
            let outcome = self.client.lock().submit_order(&client_order_id, &request);
            match outcome {
                Ok(exchange_order_id) => {
                    self.tracker.record_exchange_id(&client_order_id, exchange_order_id.clone());
                    self.tracker.update(&client_order_id, |order| {
                        order.transition_to(OrderStatus::Open, Timestamp::now());
                    });
                    if let Some(order) = self.tracker.get(&client_order_id) {
                        self.publish(BusEvent::Order(order));
                    }
                    return OrderResult {
                        client_order_id,
                        success: true,
                        exchange_order_id: Some(exchange_order_id),
                        status: Some(OrderStatus::Open),
                        reason: None,
                    };
                }
                Err(err) if err.is_retriable() && attempt < self.config.retry.max_retries => {
                    attempt += 1;
                    let backoff_ms = self
                        .config
                        .retry
                        .base_backoff_ms
                        .saturating_mul(1u64 << (attempt - 1))
                        .min(self.config.retry.backoff_cap_ms);
                    warn!(client_order_id = %client_order_id, attempt, backoff_ms, %err, "retrying order submission");
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                }
                Err(err) => {
                    self.tracker.update(&client_order_id, |order| {
                        order.transition_to(OrderStatus::Rejected, Timestamp::now());
                    });
                    return OrderResult {
                        client_order_id,
                        success: false,
                        exchange_order_id: None,
                        status: Some(OrderStatus::Rejected),
                        reason: Some(err.to_string()),
                    };
                }
            }
        }
    }

    /// No-op if the order has already reached a terminal status; otherwise
    /// issues an adapter cancel and transitions to `Cancelled` (§4.G).
    pub fn cancel_order(&self, id: &SmolStr) -> Result<(), CoreError> {
        let client_order_id = self
            .tracker
            .resolve(id)
            .ok_or_else(|| CoreError::UnknownSymbol(id.to_string()))?;

        if self
            .tracker
            .status(&client_order_id)
            .map(|status| status.is_terminal())
            .unwrap_or(true)
        {
            return Ok(());
        }

        let exchange_order_id = self
            .tracker
            .get(&client_order_id)
            .and_then(|order| order.exchange_order_id);
        let Some(exchange_order_id) = exchange_order_id else {
            return Err(CoreError::Precondition(
                "order has no exchange_order_id to cancel against yet".into(),
            ));
        };

        self.client.lock().cancel_order(&exchange_order_id)?;
        self.tracker.update(&client_order_id, |order| {
            order.transition_to(OrderStatus::Cancelled, Timestamp::now());
        });
        if let Some(order) = self.tracker.get(&client_order_id) {
            self.publish(BusEvent::Order(order));
        }
        Ok(())
    }

    pub fn get_order_status(&self, client_order_id: &SmolStr) -> Option<OrderStatus> {
        self.tracker.status(client_order_id)
    }

    pub fn get_position(&self, symbol: &str) -> Option<Position> {
        self.positions.lock().get(symbol).cloned()
    }

    /// Every currently non-flat position, used by the kill-switch to decide
    /// which symbols need a reduce-only close (§4.J).
    pub fn list_open_positions(&self) -> Vec<Position> {
        self.positions
            .lock()
            .values()
            .filter(|position| !position.is_flat())
            .cloned()
            .collect()
    }

    /// Cancels every order not yet in a terminal status. Individual
    /// cancellation failures are logged and skipped rather than aborting the
    /// rest of the sweep, the behaviour the kill-switch needs (§4.J: "best
    /// effort, report counts").
    pub fn cancel_all_orders(&self) -> usize {
        let mut cancelled = 0;
        for client_order_id in self.tracker.open_client_order_ids() {
            match self.cancel_order(&client_order_id) {
                Ok(()) => cancelled += 1,
                Err(err) => warn!(client_order_id = %client_order_id, %err, "kill-switch order cancel failed"),
            }
        }
        cancelled
    }

    /// Submits a reduce-only market order against every non-flat position's
    /// full size, flattening it (§4.J kill-switch "close_positions"). Goes
    /// through the same `submit_order` path as any other order, so a
    /// misconfigured risk limit can still reject a close; callers that need
    /// an unconditional flatten should widen `risk_limits` before arming
    /// the kill-switch.
    pub fn close_all_positions(&self) -> usize {
        let mut closed = 0;
        for position in self.list_open_positions() {
            let side = if position.size.is_positive() { Side::Sell } else { Side::Buy };
            let request = OrderRequest {
                client_order_id: None,
                symbol: position.symbol.clone(),
                side,
                order_type: OrderType::Market,
                time_in_force: zigquant_core::order::TimeInForce::Ioc,
                price: None,
                quantity: position.size.abs(),
                trigger_price: None,
                reduce_only: true,
                position_side: zigquant_core::order::PositionSide::Both,
            };
            let result = self.submit_order(request);
            if result.success {
                closed += 1;
            } else {
                warn!(symbol = %position.symbol, reason = ?result.reason, "kill-switch position close failed");
            }
        }
        closed
    }

    pub fn get_balance(&self) -> Result<Balance, CoreError> {
        self.client.lock().balance()
    }

    /// Applies an adapter fill event: updates the order's fill state, moves
    /// the position book, accrues realised P&L, and publishes the fill
    /// (§4.G "Fill reconciliation").
    pub fn apply_fill(&self, event: OrderFillEvent) -> Result<(), CoreError> {
        let client_order_id = self
            .tracker
            .resolve(&event.client_order_id)
            .ok_or_else(|| CoreError::UnknownSymbol(event.client_order_id.to_string()))?;

        let now = Timestamp::now();
        let Some(order) = self.tracker.update(&client_order_id, |order| {
            order.apply_fill(event.fill_quantity, event.fill_price, event.fee, now);
            order.clone()
        }) else {
            return Err(CoreError::Internal("order disappeared mid-fill".into()));
        };

        let signed_fill = match order.side {
            Side::Buy => event.fill_quantity,
            Side::Sell => -event.fill_quantity,
        };

        let mut positions = self.positions.lock();
        let position = positions.entry(order.symbol.clone()).or_insert_with(|| {
            Position::flat(
                order.symbol.clone(),
                Leverage {
                    mode: MarginMode::Cross,
                    multiplier: Decimal::from_int(1),
                    notional: Decimal::ZERO,
                },
                now,
            )
        });
        let realised_before = position.realised_pnl;
        position.apply_fill(signed_fill, event.fill_price, now);
        *self.daily_pnl.lock() += position.realised_pnl - realised_before;
        drop(positions);

        info!(client_order_id = %client_order_id, status = ?order.status, "order fill reconciled");
        self.publish(BusEvent::OrderFill(event));
        self.publish(BusEvent::Order(order));
        Ok(())
    }
}
