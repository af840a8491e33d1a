//! Backtest Runner: wraps one [`BacktestEngine`] job on a dedicated worker
//! thread with observable progress and cooperative cancellation (§4.I).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use zigquant_backtest::{BacktestConfig, BacktestEngine, BacktestReport};
use zigquant_core::candle::Candle;
use zigquant_core::error::CoreError;
use zigquant_strategy::Strategy;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum BacktestRunnerStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl BacktestRunnerStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, BacktestRunnerStatus::Queued | BacktestRunnerStatus::Running)
    }
}

/// Parameters for one backtest job, handed to [`crate::EngineManager::start_backtest`].
pub struct StartBacktestRequest {
    pub strategy: Box<dyn Strategy>,
    pub candles: Vec<Candle>,
    pub config: BacktestConfig,
}

/// Wraps a [`BacktestEngine`] run on its own worker thread. Progress
/// (`candles done / candles total`) and elapsed time are observable while
/// running (§4.I); `cancel` sets a cooperative flag checked between events,
/// matching `BacktestEngine::run_with_progress`'s callback contract.
pub struct BacktestRunner {
    id: SmolStr,
    status: Arc<Mutex<BacktestRunnerStatus>>,
    progress: Arc<AtomicU64>,
    cancelled: Arc<AtomicBool>,
    started_at: Instant,
    result: Arc<Mutex<Option<Result<BacktestReport, String>>>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl BacktestRunner {
    pub fn spawn(id: impl Into<SmolStr>, request: StartBacktestRequest) -> Self {
        let id = id.into();
        let status = Arc::new(Mutex::new(BacktestRunnerStatus::Queued));
        let progress = Arc::new(AtomicU64::new(0));
        let cancelled = Arc::new(AtomicBool::new(false));
        let result = Arc::new(Mutex::new(None));

        let thread_id = id.clone();
        let thread_status = Arc::clone(&status);
        let thread_progress = Arc::clone(&progress);
        let thread_cancelled = Arc::clone(&cancelled);
        let thread_result = Arc::clone(&result);

        let thread = std::thread::spawn(move || {
            *thread_status.lock() = BacktestRunnerStatus::Running;
            let total = request.candles.len().max(1) as u64;
            let engine = BacktestEngine::new(request.strategy, request.config);

            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                engine.run_with_progress(&request.candles, |done, total_candles| {
                    let total_candles = total_candles.max(1) as u64;
                    let scaled = (done as u64 * 1_000_000) / total_candles;
                    thread_progress.store(scaled, Ordering::Relaxed);
                    !thread_cancelled.load(Ordering::Relaxed)
                })
            }));

            let _ = total;
            match outcome {
                Ok(report) => {
                    let final_status = if thread_cancelled.load(Ordering::Relaxed) {
                        BacktestRunnerStatus::Cancelled
                    } else {
                        BacktestRunnerStatus::Completed
                    };
                    *thread_result.lock() = Some(Ok(report));
                    *thread_status.lock() = final_status;
                }
                Err(payload) => {
                    let reason = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "backtest runner panicked".to_string());
                    *thread_result.lock() = Some(Err(reason));
                    *thread_status.lock() = BacktestRunnerStatus::Failed;
                }
            }
            info!(id = %thread_id, "backtest runner finished");
        });

        Self {
            id,
            status,
            progress,
            cancelled,
            started_at: Instant::now(),
            result,
            thread: Some(thread),
        }
    }

    pub fn id(&self) -> &SmolStr {
        &self.id
    }

    pub fn status(&self) -> BacktestRunnerStatus {
        *self.status.lock()
    }

    /// Fraction of candles replayed so far, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Idempotent: cancelling an already-terminal job is a no-op.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// `Some` only once the job has reached a terminal status.
    pub fn result(&self) -> Option<Result<BacktestReport, CoreError>> {
        self.result.lock().clone().map(|outcome| outcome.map_err(CoreError::Internal))
    }

    /// Blocks the caller thread until the job finishes, consuming this
    /// handle. Used by callers needing a synchronous "run to completion".
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
