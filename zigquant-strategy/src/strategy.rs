use zigquant_core::candle::Candles;
use zigquant_core::order::Order;
use zigquant_core::position::Position;
use zigquant_core::signal::Signal;
use zigquant_core::strategy_config::StrategyConfig;
use zigquant_core::bus::OrderFillEvent;
use zigquant_indicator::IndicatorCache;

/// Context handed to a strategy on [`Strategy::init`]. A seam for whatever a
/// future strategy variant needs without widening every method's signature
/// (e.g. a reference to the Execution Engine's read-only position snapshot).
pub struct StrategyContext<'a> {
    pub cache: &'a IndicatorCache,
}

/// Polymorphic capability set a strategy variant implements (§4.F).
/// Object-safe so the host holds strategies as `Box<dyn Strategy>`,
/// generalised from `src/strategy/strategy.rs`'s single-method
/// `SignalGenerator` to the full lifecycle the host drives per tick.
pub trait Strategy: Send {
    fn name(&self) -> &'static str;

    fn config(&self) -> &StrategyConfig;

    fn init(&mut self, _context: &StrategyContext) {}

    /// Computes and installs every indicator series this strategy needs
    /// onto `candles`, via `cache.get_or_compute` (§4.E) so repeated calls
    /// for the same candle state are free.
    fn populate_indicators(&self, candles: &mut Candles, cache: &IndicatorCache);

    /// Evaluated only when the strategy is flat on `config().pair` (§4.F
    /// step 4).
    fn generate_entry_signal(&self, candles: &Candles, index: usize) -> Option<Signal>;

    /// Evaluated against an open position (§4.F step 3), ahead of entry
    /// evaluation in the same tick. The minimum-ROI schedule and trailing
    /// stop are evaluated by the host itself (they are configuration, not
    /// strategy logic); this method supplies the strategy-specific exit.
    fn generate_exit_signal(&self, candles: &Candles, index: usize, position: &Position) -> Option<Signal>;

    fn on_order_update(&mut self, _order: &Order) {}

    fn on_fill(&mut self, _event: &OrderFillEvent) {}

    /// Applies a partial parameter update, safe to call only while the
    /// hosting runner has the strategy paused. No built-in variant
    /// exercises this; the default is a no-op.
    fn update_params(&mut self, _params: &serde_json::Map<String, serde_json::Value>) {}

    fn deinit(&mut self) {}
}
