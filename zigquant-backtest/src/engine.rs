use crate::fill::{try_fill, FillAt};
use crate::slippage::{SlippageModel, ZeroSlippage};
use crate::summary::TradingSummary;
use crate::trade::{EquitySnapshot, Trade};
use parking_lot::Mutex;
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::debug;
use zigquant_core::candle::Candle;
use zigquant_core::instrument::Side;
use zigquant_core::order::{Order, OrderRequest, OrderType, PositionSide, TimeInForce};
use zigquant_core::position::{Leverage, MarginMode, Position};
use zigquant_core::signal::Signal;
use zigquant_decimal::Decimal;
use zigquant_execution::risk::{self, RiskContext, RiskLimits};
use zigquant_strategy::{SignalSink, Strategy, StrategyHost};

/// Tunables for one backtest run (§4.H). `position_size` is the fixed unit
/// quantity every entry/exit signal trades, since a [`Signal`] carries only
/// a confidence `strength`, not a concrete order size.
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub initial_capital: Decimal,
    pub position_size: Decimal,
    /// Proportion of notional charged as a fee on every fill.
    pub fee_rate: Decimal,
    pub fill_at: FillAt,
    pub risk_limits: RiskLimits,
    pub periods_per_year: f64,
    pub indicator_cache_capacity: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: Decimal::from_int(10_000),
            position_size: Decimal::ONE,
            fee_rate: Decimal::ZERO,
            fill_at: FillAt::default(),
            risk_limits: RiskLimits::default(),
            periods_per_year: 252.0,
            indicator_cache_capacity: 256,
        }
    }
}

#[derive(Default)]
struct SignalCollector {
    signals: Mutex<Vec<Signal>>,
}

struct CollectorSink(Arc<SignalCollector>);

impl SignalSink for CollectorSink {
    fn forward(&self, signal: Signal) {
        self.0.signals.lock().push(signal);
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BacktestReport {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquitySnapshot>,
    pub summary: TradingSummary,
}

/// Deterministic historical-candle replay (§4.H). Drives a [`StrategyHost`]
/// one candle at a time, fills any signal it emits against the *next*
/// candle's OHLC range, and re-applies the Execution Engine's pre-trade
/// risk gates via `zigquant_execution::risk::evaluate` so a backtest and a
/// live run reject orders identically. Order flow is a deliberate
/// simplification of `ExecutionEngine::submit_order` (no retry, no
/// adapter round trip) since a backtest has no transport to retry against.
pub struct BacktestEngine {
    config: BacktestConfig,
    slippage: Box<dyn SlippageModel>,
    host: StrategyHost,
    collector: Arc<SignalCollector>,
    symbol: SmolStr,
    position: Position,
    cumulative_fees: Decimal,
    daily_pnl: Decimal,
    open_entry: Option<(zigquant_core::time::Timestamp, Decimal)>,
    orders_submitted_for_symbol: usize,
    trades: Vec<Trade>,
    equity_curve: Vec<EquitySnapshot>,
}

impl BacktestEngine {
    pub fn new(strategy: Box<dyn Strategy>, config: BacktestConfig) -> Self {
        Self::with_slippage(strategy, config, Box::new(ZeroSlippage))
    }

    pub fn with_slippage(strategy: Box<dyn Strategy>, config: BacktestConfig, slippage: Box<dyn SlippageModel>) -> Self {
        let collector = Arc::new(SignalCollector::default());
        let cache_capacity = config.indicator_cache_capacity;
        let host = StrategyHost::new(strategy, cache_capacity, Box::new(CollectorSink(collector.clone())));
        let symbol = SmolStr::new(host.config().pair.to_string());
        let leverage = Leverage {
            mode: MarginMode::Cross,
            multiplier: Decimal::ONE,
            notional: Decimal::ZERO,
        };
        let position = Position::flat(symbol.clone(), leverage, zigquant_core::time::Timestamp(0));

        Self {
            config,
            slippage,
            host,
            collector,
            symbol,
            position,
            cumulative_fees: Decimal::ZERO,
            daily_pnl: Decimal::ZERO,
            open_entry: None,
            orders_submitted_for_symbol: 0,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Replays `candles` in order, returning the accumulated trade log,
    /// equity curve and summary metrics.
    pub fn run(self, candles: &[Candle]) -> BacktestReport {
        self.run_with_progress(candles, |_, _| true)
    }

    /// Same replay as [`Self::run`], calling `on_progress(candles_done,
    /// candles_total)` after every candle so a supervising runner can
    /// report progress and cooperatively cancel. Returning `false` stops
    /// the replay early and the report is built from whatever candles
    /// were processed so far.
    pub fn run_with_progress(mut self, candles: &[Candle], mut on_progress: impl FnMut(usize, usize) -> bool) -> BacktestReport {
        let total = candles.len();
        for i in 0..total {
            self.collector.signals.lock().clear();
            self.host.on_candle(candles[i]);
            let signals: Vec<Signal> = self.collector.signals.lock().drain(..).collect();

            for signal in signals {
                if let Some(reference) = candles.get(i + 1) {
                    self.handle_signal(&signal, reference);
                } else {
                    debug!("signal emitted on the final candle has no next candle to fill against, dropped");
                }
            }

            let mark = candles[i].close;
            self.position.set_mark_price(mark, candles[i].timestamp);
            self.equity_curve.push(EquitySnapshot {
                timestamp: candles[i].timestamp,
                equity: self.equity(),
            });

            if !on_progress(i + 1, total) {
                break;
            }
        }

        let summary = TradingSummary::compute(
            self.config.initial_capital,
            &self.equity_curve,
            &self.trades,
            self.config.periods_per_year,
        );
        BacktestReport {
            trades: self.trades,
            equity_curve: self.equity_curve,
            summary,
        }
    }

    fn equity(&self) -> Decimal {
        let unrealised = self.position.unrealised_pnl().unwrap_or(Decimal::ZERO);
        self.config.initial_capital + self.position.realised_pnl + unrealised - self.cumulative_fees
    }

    fn handle_signal(&mut self, signal: &Signal, reference: &Candle) {
        let request = OrderRequest {
            client_order_id: None,
            symbol: self.symbol.clone(),
            side: signal.side,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Ioc,
            price: None,
            quantity: self.config.position_size,
            trigger_price: None,
            reduce_only: signal.is_exit(),
            position_side: PositionSide::Both,
        };

        let context = RiskContext {
            mark_price: self.position.mark_price.or(Some(reference.open)),
            current_position_size: self.position.size,
            current_leverage: Some(self.position.leverage.multiplier),
            daily_pnl: self.daily_pnl,
        };

        if let Err(err) = risk::evaluate(&self.config.risk_limits, &request, &context, self.orders_submitted_for_symbol) {
            debug!(%err, "backtest order rejected by pre-trade risk gates");
            return;
        }
        self.orders_submitted_for_symbol += 1;

        let Some(fill_price) = try_fill(&request, reference, self.config.fill_at, self.slippage.as_ref()) else {
            return;
        };

        let signed_fill = match signal.side {
            Side::Buy => request.quantity,
            Side::Sell => -request.quantity,
        };

        let was_flat = self.position.is_flat();
        let size_before = self.position.size;
        let realised_before = self.position.realised_pnl;

        self.position.apply_fill(signed_fill, fill_price, reference.timestamp);

        let fee = fill_price.abs() * request.quantity.abs() * self.config.fee_rate;
        self.cumulative_fees = self.cumulative_fees + fee;
        let realised_delta = self.position.realised_pnl - realised_before;
        self.daily_pnl = self.daily_pnl + realised_delta - fee;

        if was_flat && !self.position.is_flat() {
            self.open_entry = Some((reference.timestamp, fill_price));
        } else if !was_flat && self.position.is_flat() {
            if let Some((entry_timestamp, entry_price)) = self.open_entry.take() {
                self.trades.push(Trade {
                    pair: self.host.config().pair.clone(),
                    side: if size_before.is_positive() { Side::Buy } else { Side::Sell },
                    quantity: size_before.abs(),
                    entry_price,
                    exit_price: fill_price,
                    entry_timestamp,
                    exit_timestamp: reference.timestamp,
                    realised_pnl: realised_delta,
                    fees: fee,
                });
            }
        }

        let mut order = Order::new(SmolStr::new(format!("bt-{}", reference.timestamp.0)), request.clone(), reference.timestamp);
        order.transition_to(zigquant_core::order::OrderStatus::Submitted, reference.timestamp);
        order.transition_to(zigquant_core::order::OrderStatus::Open, reference.timestamp);
        order.apply_fill(request.quantity, fill_price, fee, reference.timestamp);
        self.host.handle_order_update(&order, self.position.clone());
    }
}
