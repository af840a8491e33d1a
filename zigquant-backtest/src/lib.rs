//! Deterministic historical-candle replay, fill simulation and summary
//! metrics (§4.H).

pub mod engine;
pub mod exporter;
pub mod fill;
pub mod slippage;
pub mod summary;
pub mod trade;

pub use engine::{BacktestConfig, BacktestEngine, BacktestReport};
pub use exporter::{export_report_json, export_trades_csv, ExportError};
pub use fill::{try_fill, FillAt};
pub use slippage::{BasisPointSlippage, SlippageModel, ZeroSlippage};
pub use summary::TradingSummary;
pub use trade::{EquitySnapshot, Trade};
