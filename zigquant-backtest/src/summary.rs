use crate::trade::{EquitySnapshot, Trade};
use serde::{Deserialize, Serialize};
use zigquant_decimal::{Decimal, SCALE};

/// Performance metrics computed once over a completed backtest's trade log
/// and equity curve (§4.H). Grounded on `src/statistic::summary`'s
/// `TradingSummary`/ratio types, collapsed from the source's rolling
/// per-position update model to a single batch computation since the whole
/// equity curve is already materialised by the time a backtest finishes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TradingSummary {
    pub total_return: Decimal,
    /// Peak-to-trough drawdown on the equity curve, as a fraction of the peak.
    pub max_drawdown: Decimal,
    /// Annualised by `sqrt(periods_per_year)`, matching `SharpeRatio::scale`'s
    /// IID scaling assumption.
    pub sharpe_ratio: f64,
    pub win_rate: Decimal,
    /// `None` when there have been no losing trades to divide by (and no
    /// winning trades either), matching `ProfitFactor::calculate`.
    pub profit_factor: Option<Decimal>,
    pub num_trades: usize,
}

impl TradingSummary {
    pub fn compute(
        initial_capital: Decimal,
        equity_curve: &[EquitySnapshot],
        trades: &[Trade],
        periods_per_year: f64,
    ) -> Self {
        let final_equity = equity_curve.last().map(|s| s.equity).unwrap_or(initial_capital);
        let total_return = if initial_capital.is_zero() {
            Decimal::ZERO
        } else {
            (final_equity - initial_capital) / initial_capital
        };

        let max_drawdown = max_drawdown(equity_curve);
        let sharpe_ratio = sharpe_ratio(&per_period_returns(equity_curve), periods_per_year);

        let wins = trades.iter().filter(|t| t.is_win()).count();
        let win_rate = if trades.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::from_int(wins as i64) / Decimal::from_int(trades.len() as i64)
        };

        let (gross_profit, gross_loss) = trades.iter().fold((Decimal::ZERO, Decimal::ZERO), |(profit, loss), trade| {
            if trade.realised_pnl.is_positive() {
                (profit + trade.realised_pnl, loss)
            } else {
                (profit, loss + trade.realised_pnl.abs())
            }
        });
        let profit_factor = if gross_profit.is_zero() && gross_loss.is_zero() {
            None
        } else if gross_loss.is_zero() {
            Some(Decimal::from_int(i64::MAX))
        } else {
            Some(gross_profit / gross_loss)
        };

        Self {
            total_return,
            max_drawdown,
            sharpe_ratio,
            win_rate,
            profit_factor,
            num_trades: trades.len(),
        }
    }
}

fn max_drawdown(curve: &[EquitySnapshot]) -> Decimal {
    let mut peak: Option<Decimal> = None;
    let mut worst = Decimal::ZERO;
    for snapshot in curve {
        let peak = peak.get_or_insert(snapshot.equity);
        if snapshot.equity > *peak {
            *peak = snapshot.equity;
        }
        if !peak.is_zero() {
            let drawdown = (*peak - snapshot.equity) / *peak;
            if drawdown > worst {
                worst = drawdown;
            }
        }
    }
    worst
}

fn per_period_returns(curve: &[EquitySnapshot]) -> Vec<f64> {
    curve
        .windows(2)
        .filter_map(|pair| {
            let prev = pair[0].equity;
            if prev.is_zero() {
                None
            } else {
                Some(decimal_to_f64((pair[1].equity - prev) / prev))
            }
        })
        .collect()
}

/// `(mean - risk_free) / std_dev`, risk-free fixed at zero since §4.H names
/// no risk-free input, annualised the way `SharpeRatio::scale` does.
fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return 0.0;
    }
    (mean / std_dev) * periods_per_year.sqrt()
}

fn decimal_to_f64(value: Decimal) -> f64 {
    value.raw() as f64 / 10f64.powi(SCALE as i32)
}
