pub mod bollinger_breakout;
pub mod dual_ma;
pub mod hybrid_ai;
pub mod macd_divergence;
pub mod rsi_mean_reversion;
pub mod triple_ma;
