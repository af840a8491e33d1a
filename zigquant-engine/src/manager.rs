//! Engine Manager: a single process-wide supervisor owning the strategy and
//! backtest runner registries, plus the kill-switch (§4.J).

use crate::backtest_runner::{BacktestRunner, BacktestRunnerStatus, StartBacktestRequest};
use crate::runner::{CandleFeed, RunnerStats, RunnerStatus, StrategyRunner, StrategyRunnerConfig};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use zigquant_backtest::BacktestReport;
use zigquant_core::bus::MessageBus;
use zigquant_core::error::CoreError;
use zigquant_core::signal::Signal;
use zigquant_execution::engine::ExecutionEngine;
use zigquant_strategy::Strategy;

/// Parameters for one strategy, handed to [`EngineManager::start_strategy`].
pub struct StartStrategyRequest {
    pub strategy: Box<dyn Strategy>,
    pub feed: Box<dyn CandleFeed>,
    pub execution: Arc<ExecutionEngine>,
    pub bus: Option<Arc<MessageBus>>,
    pub indicator_cache_capacity: usize,
    pub runner_config: StrategyRunnerConfig,
}

/// Outcome of [`EngineManager::activate_kill_switch`] (§4.J, S4).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct KillSwitchReport {
    pub strategies_stopped: usize,
    pub orders_cancelled: usize,
    pub positions_closed: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthReport {
    pub strategies_running: usize,
    pub strategies_paused: usize,
    pub strategies_stopped: usize,
    pub backtests_running: usize,
    pub backtests_queued: usize,
    pub kill_switch_active: bool,
}

#[derive(Default)]
struct KillSwitch {
    active: AtomicBool,
    reason: Mutex<Option<String>>,
}

/// Registry + supervisor + kill-switch over every running strategy and
/// backtest job, behind one coarse lock (§4.J, §5: "registry operations are
/// infrequent relative to data traffic").
#[derive(Default)]
pub struct EngineManager {
    strategies: Mutex<HashMap<SmolStr, StrategyRunner>>,
    backtests: Mutex<HashMap<SmolStr, BacktestRunner>>,
    kill_switch: KillSwitch,
}

impl EngineManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_strategy(&self, id: impl Into<SmolStr>, request: StartStrategyRequest) -> Result<(), CoreError> {
        if self.is_kill_switch_active() {
            return Err(CoreError::KillSwitchActive);
        }

        let id = id.into();
        let mut strategies = self.strategies.lock();
        if strategies.contains_key(&id) {
            return Err(CoreError::Conflict(format!("strategy id already running: {id}")));
        }

        let runner = StrategyRunner::spawn(
            id.clone(),
            request.strategy,
            request.feed,
            request.execution,
            request.bus,
            request.indicator_cache_capacity,
            request.runner_config,
        );
        info!(id = %id, "strategy started");
        strategies.insert(id, runner);
        Ok(())
    }

    pub fn stop_strategy(&self, id: &str) -> Result<(), CoreError> {
        let mut strategies = self.strategies.lock();
        let runner = strategies
            .get_mut(id)
            .ok_or_else(|| CoreError::InvalidArgument(format!("unknown strategy id: {id}")))?;
        runner.stop()
    }

    pub fn pause_strategy(&self, id: &str) -> Result<(), CoreError> {
        self.with_strategy(id, StrategyRunner::pause)
    }

    pub fn resume_strategy(&self, id: &str) -> Result<(), CoreError> {
        self.with_strategy(id, StrategyRunner::resume)
    }

    pub fn update_strategy_params(&self, id: &str, params: serde_json::Map<String, serde_json::Value>) -> Result<(), CoreError> {
        self.with_strategy(id, |runner| runner.update_params(params.clone()))
    }

    pub fn get_strategy_status(&self, id: &str) -> Option<RunnerStatus> {
        self.strategies.lock().get(id).map(|runner| runner.status())
    }

    pub fn get_strategy_stats(&self, id: &str) -> Option<Arc<RunnerStats>> {
        self.strategies.lock().get(id).map(|runner| runner.stats())
    }

    pub fn get_signal_history(&self, id: &str, limit: usize) -> Option<Vec<Signal>> {
        self.strategies.lock().get(id).map(|runner| runner.signal_history(limit))
    }

    pub fn list_strategies(&self) -> Vec<SmolStr> {
        self.strategies.lock().keys().cloned().collect()
    }

    fn with_strategy(&self, id: &str, f: impl FnOnce(&StrategyRunner) -> Result<(), CoreError>) -> Result<(), CoreError> {
        let strategies = self.strategies.lock();
        let runner = strategies
            .get(id)
            .ok_or_else(|| CoreError::InvalidArgument(format!("unknown strategy id: {id}")))?;
        f(runner)
    }

    pub fn start_backtest(&self, id: impl Into<SmolStr>, request: StartBacktestRequest) -> Result<(), CoreError> {
        let id = id.into();
        let mut backtests = self.backtests.lock();
        if backtests.contains_key(&id) {
            return Err(CoreError::Conflict(format!("backtest id already exists: {id}")));
        }
        let runner = BacktestRunner::spawn(id.clone(), request);
        backtests.insert(id, runner);
        Ok(())
    }

    pub fn cancel_backtest(&self, id: &str) -> Result<(), CoreError> {
        let backtests = self.backtests.lock();
        let runner = backtests
            .get(id)
            .ok_or_else(|| CoreError::InvalidArgument(format!("unknown backtest id: {id}")))?;
        runner.cancel();
        Ok(())
    }

    /// Removes a completed/failed/cancelled backtest from the registry.
    /// Rejected with `Precondition` while the job is still running, since
    /// discarding a running job's handle would leak its result.
    pub fn remove_backtest(&self, id: &str) -> Result<(), CoreError> {
        let mut backtests = self.backtests.lock();
        match backtests.get(id).map(|runner| runner.status()) {
            None => Err(CoreError::InvalidArgument(format!("unknown backtest id: {id}"))),
            Some(status) if !status.is_terminal() => {
                Err(CoreError::Precondition("backtest is still running".into()))
            }
            Some(_) => {
                backtests.remove(id);
                Ok(())
            }
        }
    }

    pub fn get_backtest_status(&self, id: &str) -> Option<BacktestRunnerStatus> {
        self.backtests.lock().get(id).map(|runner| runner.status())
    }

    /// `(progress in [0, 1], elapsed)`.
    pub fn get_backtest_progress(&self, id: &str) -> Option<(f64, std::time::Duration)> {
        self.backtests
            .lock()
            .get(id)
            .map(|runner| (runner.progress(), runner.elapsed()))
    }

    pub fn get_backtest_result(&self, id: &str) -> Option<Result<BacktestReport, CoreError>> {
        self.backtests.lock().get(id).and_then(|runner| runner.result())
    }

    pub fn list_backtests(&self) -> Vec<SmolStr> {
        self.backtests.lock().keys().cloned().collect()
    }

    /// Stops every running/paused strategy, optionally cancels every
    /// working order and flattens every open position across their
    /// Execution Engines (§4.J, S4). Best-effort: a single strategy's stop
    /// or a single engine's cancel/close failure is logged and does not
    /// abort the sweep.
    pub fn activate_kill_switch(&self, reason: impl Into<String>, cancel_orders: bool, close_positions: bool) -> KillSwitchReport {
        let reason = reason.into();
        warn!(%reason, "kill switch activated");
        self.kill_switch.active.store(true, Ordering::SeqCst);
        *self.kill_switch.reason.lock() = Some(reason);

        let mut report = KillSwitchReport::default();
        let mut strategies = self.strategies.lock();
        for (id, runner) in strategies.iter_mut() {
            if matches!(runner.status(), RunnerStatus::Running | RunnerStatus::Paused) {
                if runner.stop().is_ok() {
                    report.strategies_stopped += 1;
                } else {
                    warn!(%id, "kill switch failed to stop strategy");
                }
            }
            if cancel_orders {
                report.orders_cancelled += runner.execution().cancel_all_orders();
            }
            if close_positions {
                report.positions_closed += runner.execution().close_all_positions();
            }
        }
        report
    }

    pub fn deactivate_kill_switch(&self) {
        self.kill_switch.active.store(false, Ordering::SeqCst);
        *self.kill_switch.reason.lock() = None;
    }

    pub fn is_kill_switch_active(&self) -> bool {
        self.kill_switch.active.load(Ordering::SeqCst)
    }

    pub fn kill_switch_reason(&self) -> Option<String> {
        self.kill_switch.reason.lock().clone()
    }

    pub fn get_system_health(&self) -> HealthReport {
        let strategies = self.strategies.lock();
        let backtests = self.backtests.lock();

        let mut health = HealthReport {
            kill_switch_active: self.is_kill_switch_active(),
            ..Default::default()
        };
        for runner in strategies.values() {
            match runner.status() {
                RunnerStatus::Running => health.strategies_running += 1,
                RunnerStatus::Paused => health.strategies_paused += 1,
                RunnerStatus::Stopped | RunnerStatus::Failed | RunnerStatus::Stopping | RunnerStatus::Queued => {
                    health.strategies_stopped += 1
                }
            }
        }
        for runner in backtests.values() {
            match runner.status() {
                BacktestRunnerStatus::Running => health.backtests_running += 1,
                BacktestRunnerStatus::Queued => health.backtests_queued += 1,
                _ => {}
            }
        }
        health
    }
}
