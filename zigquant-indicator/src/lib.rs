//! Deterministic technical indicator kernels plus a fingerprint-keyed
//! memoisation cache (§4.E).

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod cache;
pub mod ichimoku;
pub mod indicator;
pub mod macd;
pub mod momentum;
pub mod moving_average;
pub mod sar;
pub mod volume;

pub use adx::Adx;
pub use atr::Atr;
pub use bollinger::BollingerBands;
pub use cache::{hash_params, IndicatorCache};
pub use ichimoku::Ichimoku;
pub use indicator::{Indicator, Series};
pub use macd::Macd;
pub use momentum::{Cci, Roc, Rsi, WilliamsR};
pub use moving_average::{Ema, Sma};
pub use sar::ParabolicSar;
pub use volume::{Obv, PriceBucket, VolumeProfile, Vwap};
