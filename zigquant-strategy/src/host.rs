use crate::position_manager::PositionManager;
use crate::strategy::{Strategy, StrategyContext};
use zigquant_core::bus::OrderFillEvent;
use zigquant_core::candle::{Candle, Candles};
use zigquant_core::instrument::Side;
use zigquant_core::order::Order;
use zigquant_core::position::Position;
use zigquant_core::signal::{Signal, SignalType};
use zigquant_decimal::Decimal;
use zigquant_indicator::IndicatorCache;

/// Destination a [`StrategyHost`] forwards emitted signals to. Kept as an
/// interface rather than a direct dependency on the Execution Engine, the
/// same seam `IDataProvider`/`IExecutionClient` use elsewhere in the
/// workspace.
pub trait SignalSink: Send {
    fn forward(&self, signal: Signal);
}

/// Tracks the most favourable price seen since a trailing stop activated,
/// reset whenever the position returns to flat.
#[derive(Debug, Default, Clone, Copy)]
struct TrailingState {
    best_price: Option<Decimal>,
}

/// Drives one strategy instance through the per-tick orchestration in
/// §4.F: append/update candles, refresh indicators, evaluate exits ahead
/// of entries, forward emitted signals. One host per running strategy
/// instance, each owning its own indicator cache (Design Note: "owner of
/// the indicator cache").
pub struct StrategyHost {
    strategy: Box<dyn Strategy>,
    cache: IndicatorCache,
    candles: Candles,
    positions: PositionManager,
    sink: Box<dyn SignalSink>,
    position_opened_at_index: Option<usize>,
    trailing: TrailingState,
}

impl StrategyHost {
    pub fn new(strategy: Box<dyn Strategy>, cache_capacity: usize, sink: Box<dyn SignalSink>) -> Self {
        let cache = IndicatorCache::new(cache_capacity);
        let mut strategy = strategy;
        strategy.init(&StrategyContext { cache: &cache });
        Self {
            strategy,
            cache,
            candles: Candles::new(),
            positions: PositionManager::new(),
            sink,
            position_opened_at_index: None,
            trailing: TrailingState::default(),
        }
    }

    pub fn candles(&self) -> &Candles {
        &self.candles
    }

    pub fn positions(&self) -> &PositionManager {
        &self.positions
    }

    /// The hosted strategy's configuration, read-only (runners needing the
    /// traded pair, timeframe or ROI schedule without owning the strategy).
    pub fn config(&self) -> &zigquant_core::strategy_config::StrategyConfig {
        self.strategy.config()
    }

    /// Runs the five-step per-tick orchestration for one new or
    /// in-progress candle.
    pub fn on_candle(&mut self, candle: Candle) {
        self.candles.push_or_update(candle);
        self.strategy.populate_indicators(&mut self.candles, &self.cache);

        let pair = self.strategy.config().pair.clone();
        let index = self.candles.len() - 1;
        let close = candle.close;

        if let Some(position) = self.positions.get(&pair).cloned() {
            if !position.is_flat() {
                self.positions.set_mark_price(&pair, close, candle.timestamp);
                if let Some(signal) = self.evaluate_exit(&position, index, close) {
                    self.sink.forward(signal);
                    return;
                }
            }
        }

        if self.positions.is_flat(&pair) {
            if let Some(signal) = self.strategy.generate_entry_signal(&self.candles, index) {
                self.sink.forward(signal);
            }
        }
    }

    /// Applies the Execution Engine's authoritative position for this
    /// strategy's pair, called on every order-update event (§4.F "position
    /// manager responsibilities").
    pub fn handle_order_update(&mut self, order: &Order, authoritative_position: Position) {
        self.strategy.on_order_update(order);

        let pair = self.strategy.config().pair.clone();
        let was_flat = self.positions.is_flat(&pair);
        self.positions.reconcile(pair.clone(), authoritative_position);

        if self.positions.is_flat(&pair) {
            self.position_opened_at_index = None;
            self.trailing = TrailingState::default();
        } else if was_flat {
            self.position_opened_at_index = Some(self.candles.len().saturating_sub(1));
            self.trailing = TrailingState::default();
        }
    }

    pub fn handle_fill(&mut self, event: &OrderFillEvent) {
        self.strategy.on_fill(event);
    }

    /// Forwards a parameter update to the hosted strategy. Callers are
    /// responsible for only invoking this while the strategy is paused.
    pub fn update_params(&mut self, params: &serde_json::Map<String, serde_json::Value>) {
        self.strategy.update_params(params);
    }

    pub fn deinit(&mut self) {
        self.strategy.deinit();
    }

    fn evaluate_exit(&mut self, position: &Position, index: usize, close: Decimal) -> Option<Signal> {
        if let Some(opened_at) = self.position_opened_at_index {
            let age = index.saturating_sub(opened_at) as u32;
            if let Some(min_roi) = self.strategy.config().min_roi_at(age) {
                if self.roi(position, close) >= min_roi {
                    return Some(self.exit_signal(position, close));
                }
            }
        }

        if self.trailing_stop_triggered(position, close) {
            return Some(self.exit_signal(position, close));
        }

        self.strategy.generate_exit_signal(&self.candles, index, position)
    }

    fn roi(&self, position: &Position, close: Decimal) -> Decimal {
        if position.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        let direction = Decimal::from_int(position.size.signum() as i64);
        (close - position.entry_price) / position.entry_price * direction
    }

    fn trailing_stop_triggered(&mut self, position: &Position, close: Decimal) -> bool {
        let config = match &self.strategy.config().trailing_stop {
            Some(config) => *config,
            None => return false,
        };

        let roi = self.roi(position, close);
        if roi < config.activation && self.trailing.best_price.is_none() {
            return false;
        }

        let long = position.size.is_positive();
        let best = self.trailing.best_price.get_or_insert(close);
        if long {
            if close > *best {
                *best = close;
            }
        } else if close < *best {
            *best = close;
        }
        let best = *best;
        if best.is_zero() {
            return false;
        }

        let direction = Decimal::from_int(position.size.signum() as i64);
        let retracement = (best - close) / best * direction;
        retracement >= config.distance
    }

    fn exit_signal(&self, position: &Position, close: Decimal) -> Signal {
        let timestamp = self.candles.last().expect("candle pushed before exit evaluation").timestamp;
        let (signal_type, side) = if position.size.is_positive() {
            (SignalType::ExitLong, Side::Sell)
        } else {
            (SignalType::ExitShort, Side::Buy)
        };
        Signal::new(signal_type, self.strategy.config().pair.clone(), side, close, Decimal::ONE, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::dual_ma::DualMovingAverageStrategy;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use zigquant_core::instrument::TradingPair;
    use zigquant_core::position::{Leverage, MarginMode};
    use zigquant_core::strategy_config::{StrategyConfig, TrailingStopConfig};
    use zigquant_core::time::Timestamp;

    fn candle(ts: i64, close: i64) -> Candle {
        Candle {
            timestamp: Timestamp(ts),
            open: Decimal::from_int(close),
            high: Decimal::from_int(close),
            low: Decimal::from_int(close),
            close: Decimal::from_int(close),
            volume: Decimal::ZERO,
        }
    }

    fn leverage() -> Leverage {
        Leverage {
            mode: MarginMode::Cross,
            multiplier: Decimal::from_int(1),
            notional: Decimal::ZERO,
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        signals: Mutex<Vec<Signal>>,
    }

    impl SignalSink for RecordingSink {
        fn forward(&self, signal: Signal) {
            self.signals.lock().push(signal);
        }
    }

    fn host(config: StrategyConfig, sink: std::sync::Arc<RecordingSink>) -> StrategyHost {
        struct ArcSink(std::sync::Arc<RecordingSink>);
        impl SignalSink for ArcSink {
            fn forward(&self, signal: Signal) {
                self.0.forward(signal);
            }
        }
        let strategy = Box::new(DualMovingAverageStrategy::new(config, 2, 4));
        StrategyHost::new(strategy, 16, Box::new(ArcSink(sink)))
    }

    #[test]
    fn a_golden_cross_with_no_open_position_forwards_an_entry_signal() {
        let sink = std::sync::Arc::new(RecordingSink::default());
        let mut host = host(StrategyConfig::new(TradingPair::new("BTC", "USD"), 60_000), sink.clone());

        let closes = [10, 10, 10, 10, 20, 25, 30];
        for (i, close) in closes.iter().enumerate() {
            host.on_candle(candle(i as i64, *close));
        }

        let signals = sink.signals.lock();
        assert!(signals.iter().any(|s| s.is_entry()));
    }

    #[test]
    fn min_roi_schedule_exits_an_open_position_once_the_floor_is_reached() {
        let pair = TradingPair::new("BTC", "USD");
        let mut config = StrategyConfig::new(pair.clone(), 60_000);
        let mut schedule = BTreeMap::new();
        schedule.insert(0u32, Decimal::from_string("0.01").unwrap());
        config.min_roi = Some(schedule);

        let sink = std::sync::Arc::new(RecordingSink::default());
        let mut host = host(config, sink.clone());

        host.on_candle(candle(0, 100));

        let mut position = Position::flat(pair.to_string(), leverage(), Timestamp(0));
        position.apply_fill(Decimal::from_int(1), Decimal::from_int(100), Timestamp(0));
        let order = Order::new(
            "C-1".into(),
            zigquant_core::order::OrderRequest {
                client_order_id: Some("C-1".into()),
                symbol: "BTC-USD".into(),
                side: Side::Buy,
                order_type: zigquant_core::order::OrderType::Market,
                time_in_force: zigquant_core::order::TimeInForce::Ioc,
                price: None,
                quantity: Decimal::from_int(1),
                trigger_price: None,
                reduce_only: false,
                position_side: zigquant_core::order::PositionSide::Both,
            },
            Timestamp(0),
        );
        host.handle_order_update(&order, position);

        host.on_candle(candle(1, 105));

        let signals = sink.signals.lock();
        assert!(signals.iter().any(|s| s.is_exit()));
    }

    #[test]
    fn trailing_stop_exits_once_price_retraces_past_the_configured_distance() {
        let pair = TradingPair::new("BTC", "USD");
        let mut config = StrategyConfig::new(pair.clone(), 60_000);
        config.trailing_stop = Some(TrailingStopConfig {
            activation: Decimal::from_string("0.02").unwrap(),
            distance: Decimal::from_string("0.01").unwrap(),
        });

        let sink = std::sync::Arc::new(RecordingSink::default());
        let mut host = host(config, sink.clone());

        host.on_candle(candle(0, 100));

        let mut position = Position::flat(pair.to_string(), leverage(), Timestamp(0));
        position.apply_fill(Decimal::from_int(1), Decimal::from_int(100), Timestamp(0));
        let order = Order::new(
            "C-1".into(),
            zigquant_core::order::OrderRequest {
                client_order_id: Some("C-1".into()),
                symbol: "BTC-USD".into(),
                side: Side::Buy,
                order_type: zigquant_core::order::OrderType::Market,
                time_in_force: zigquant_core::order::TimeInForce::Ioc,
                price: None,
                quantity: Decimal::from_int(1),
                trigger_price: None,
                reduce_only: false,
                position_side: zigquant_core::order::PositionSide::Both,
            },
            Timestamp(0),
        );
        host.handle_order_update(&order, position);

        // Price runs up past the activation threshold, then retraces.
        host.on_candle(candle(1, 103));
        host.on_candle(candle(2, 101));

        let signals = sink.signals.lock();
        assert!(signals.iter().any(|s| s.is_exit()));
    }
}
