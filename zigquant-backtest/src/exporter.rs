use crate::engine::BacktestReport;
use crate::trade::Trade;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Exporter-local failures (§4.H). Grounded on
/// `barter-strategy/src/backtest.rs::Backtester::export_results`'s
/// `StrategyError::Io` wrapping, given its own `thiserror` type here since
/// neither the csv nor serde_json failure modes are core-domain concerns.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes one CSV row per [`Trade`], the direct analogue of
/// `Backtester::export_results`.
pub fn export_trades_csv(trades: &[Trade], path: impl AsRef<Path>) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for trade in trades {
        writer.serialize(trade)?;
    }
    writer.flush()?;
    info!(path = %path.as_ref().display(), count = trades.len(), "wrote trade log to csv");
    Ok(())
}

/// Writes the full [`BacktestReport`] (trades, equity curve, summary) as a
/// single pretty-printed JSON document.
pub fn export_report_json(report: &BacktestReport, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;
    info!(path = %path.as_ref().display(), "wrote backtest report to json");
    Ok(())
}
