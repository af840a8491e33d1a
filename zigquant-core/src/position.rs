use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use zigquant_decimal::Decimal;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MarginMode {
    Cross,
    Isolated,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leverage {
    pub mode: MarginMode,
    pub multiplier: Decimal,
    pub notional: Decimal,
}

/// Cumulative funding paid/received, tracked across three windows.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Funding {
    pub all_time: Decimal,
    pub since_change: Decimal,
    pub since_open: Decimal,
}

/// Per-symbol position record. `size` is signed: positive long, negative
/// short, zero flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: smol_str::SmolStr,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub mark_price: Option<Decimal>,
    pub liquidation_price: Option<Decimal>,
    pub leverage: Leverage,
    pub realised_pnl: Decimal,
    pub margin_used: Decimal,
    pub funding: Funding,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Position {
    pub fn flat(symbol: impl Into<smol_str::SmolStr>, leverage: Leverage, now: Timestamp) -> Self {
        Self {
            symbol: symbol.into(),
            size: Decimal::ZERO,
            entry_price: Decimal::ZERO,
            mark_price: None,
            liquidation_price: None,
            leverage,
            realised_pnl: Decimal::ZERO,
            margin_used: Decimal::ZERO,
            funding: Funding::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }

    /// `unrealised = size * (mark - entry)`, `None` unless a mark price is
    /// known.
    pub fn unrealised_pnl(&self) -> Option<Decimal> {
        let mark = self.mark_price?;
        Some(self.size * (mark - self.entry_price))
    }

    /// `position_value = |size| * mark_price`.
    pub fn position_value(&self) -> Option<Decimal> {
        let mark = self.mark_price?;
        Some(self.size.abs() * mark)
    }

    /// `return_on_equity = unrealised_pnl / margin_used`, `None` without a
    /// mark price or with no margin committed (§3 data model).
    pub fn return_on_equity(&self) -> Option<Decimal> {
        let unrealised = self.unrealised_pnl()?;
        unrealised.checked_div(self.margin_used).ok()
    }

    pub fn set_mark_price(&mut self, mark_price: Decimal, now: Timestamp) {
        self.mark_price = Some(mark_price);
        self.updated_at = now;
    }

    /// Applies a fill on this symbol: same-direction fills widen the
    /// position at a size-weighted entry price, opposite-direction fills
    /// realise P&L against the existing entry price. A fill that crosses
    /// through zero closes the position and opens a new one in the other
    /// direction at the fill price, resetting `entry_price`.
    pub fn apply_fill(&mut self, signed_fill_size: Decimal, fill_price: Decimal, now: Timestamp) {
        let new_size = self.size + signed_fill_size;
        let prior_signum = self.size.signum();

        let same_direction =
            self.size.is_zero() || signed_fill_size.is_zero() || prior_signum == signed_fill_size.signum();

        if same_direction {
            if !new_size.is_zero() {
                let prior_notional = self.entry_price * self.size.abs();
                let fill_notional = fill_price * signed_fill_size.abs();
                self.entry_price = (prior_notional + fill_notional) / new_size.abs();
            }
        } else {
            let fill_abs = signed_fill_size.abs();
            let position_abs = self.size.abs();
            let closing_size = if fill_abs < position_abs { fill_abs } else { position_abs };
            let realised =
                closing_size * (fill_price - self.entry_price) * Decimal::from_int(prior_signum as i64);
            self.realised_pnl = self.realised_pnl + realised;

            if new_size.signum() != prior_signum && !new_size.is_zero() {
                // crossed through zero: flip direction, reset entry price
                self.entry_price = fill_price;
            } else if new_size.is_zero() {
                self.entry_price = Decimal::ZERO;
            }
        }

        self.size = new_size;
        self.updated_at = now;
    }
}
