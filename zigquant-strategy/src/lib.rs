//! Strategy host, position manager and built-in strategy variants (§4.F).

pub mod host;
pub mod position_manager;
pub mod strategy;
pub mod variants;

pub use host::{SignalSink, StrategyHost};
pub use position_manager::PositionManager;
pub use strategy::{Strategy, StrategyContext};

pub use variants::bollinger_breakout::BollingerBreakoutStrategy;
pub use variants::dual_ma::DualMovingAverageStrategy;
pub use variants::hybrid_ai::{Features, HybridAiStrategy, PredictedAction, RuleBasedModel, SignalModel};
pub use variants::macd_divergence::MacdDivergenceStrategy;
pub use variants::rsi_mean_reversion::RsiMeanReversionStrategy;
pub use variants::triple_ma::TripleMovingAverageStrategy;
