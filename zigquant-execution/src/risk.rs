use serde::{Deserialize, Serialize};
use zigquant_core::error::CoreError;
use zigquant_core::instrument::Side;
use zigquant_core::order::OrderRequest;
use zigquant_decimal::Decimal;

/// Configurable pre-trade risk limits (§4.G). Every field is optional; a
/// `None` limit is not evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_notional_per_order: Option<Decimal>,
    /// Maximum absolute aggregate position size per symbol, after the order
    /// under evaluation would be applied.
    pub max_position_per_symbol: Option<Decimal>,
    /// Floor on today's realised-plus-unrealised P&L; a more negative value
    /// than this rejects new risk-increasing orders.
    pub daily_loss_floor: Option<Decimal>,
    pub max_leverage: Option<Decimal>,
    /// At most `max_orders` submissions per symbol within `window_ms`.
    pub max_orders_per_symbol_rate: Option<(u32, i64)>,
}

/// Account and position state a gate needs that the order request itself
/// does not carry, supplied by the Execution Engine at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskContext {
    pub mark_price: Option<Decimal>,
    pub current_position_size: Decimal,
    pub current_leverage: Option<Decimal>,
    pub daily_pnl: Decimal,
}

/// Evaluates `limits` against `request`/`context` in the fixed order the
/// spec mandates: notional, aggregate position, daily loss, leverage, rate.
/// The first failing gate rejects without submission; gates after it are
/// not evaluated.
pub fn evaluate(
    limits: &RiskLimits,
    request: &OrderRequest,
    context: &RiskContext,
    recent_orders_for_symbol: usize,
) -> Result<(), CoreError> {
    if let (Some(max_notional), Some(mark_price)) = (limits.max_notional_per_order, context.mark_price) {
        let notional = request.quantity.abs() * mark_price;
        if notional > max_notional {
            return Err(CoreError::RiskRejected(format!(
                "order notional {} exceeds max_notional_per_order {}",
                notional, max_notional
            )));
        }
    }

    if let Some(max_position) = limits.max_position_per_symbol {
        let signed_delta = match request.side {
            Side::Buy => request.quantity,
            Side::Sell => -request.quantity,
        };
        let projected = (context.current_position_size + signed_delta).abs();
        if projected > max_position {
            return Err(CoreError::RiskRejected(format!(
                "projected position {} exceeds max_position_per_symbol {}",
                projected, max_position
            )));
        }
    }

    if let Some(floor) = limits.daily_loss_floor {
        if context.daily_pnl < floor {
            return Err(CoreError::RiskRejected(format!(
                "daily pnl {} is below daily_loss_floor {}",
                context.daily_pnl, floor
            )));
        }
    }

    if let (Some(max_leverage), Some(current_leverage)) = (limits.max_leverage, context.current_leverage) {
        if current_leverage > max_leverage {
            return Err(CoreError::RiskRejected(format!(
                "leverage {} exceeds max_leverage {}",
                current_leverage, max_leverage
            )));
        }
    }

    if let Some((max_orders, _window_ms)) = limits.max_orders_per_symbol_rate {
        if recent_orders_for_symbol as u32 >= max_orders {
            return Err(CoreError::RiskRejected(format!(
                "symbol has {} orders within the rate window, limit is {}",
                recent_orders_for_symbol, max_orders
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zigquant_core::order::{OrderType, PositionSide, TimeInForce};

    fn request(side: Side, quantity: i64) -> OrderRequest {
        OrderRequest {
            client_order_id: None,
            symbol: "BTC-PERP".into(),
            side,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Ioc,
            price: None,
            quantity: Decimal::from_int(quantity),
            trigger_price: None,
            reduce_only: false,
            position_side: PositionSide::Both,
        }
    }

    #[test]
    fn order_exceeding_max_notional_is_rejected() {
        let limits = RiskLimits {
            max_notional_per_order: Some(Decimal::from_int(1000)),
            ..Default::default()
        };
        let context = RiskContext {
            mark_price: Some(Decimal::from_int(100)),
            ..Default::default()
        };
        let err = evaluate(&limits, &request(Side::Buy, 20), &context, 0).unwrap_err();
        assert_eq!(err.kind(), zigquant_core::error::ErrorKind::RiskRejected);
    }

    #[test]
    fn order_within_limits_passes_every_gate() {
        let limits = RiskLimits {
            max_notional_per_order: Some(Decimal::from_int(10_000)),
            max_position_per_symbol: Some(Decimal::from_int(50)),
            daily_loss_floor: Some(Decimal::from_int(-1000)),
            max_leverage: Some(Decimal::from_int(10)),
            max_orders_per_symbol_rate: Some((5, 60_000)),
        };
        let context = RiskContext {
            mark_price: Some(Decimal::from_int(100)),
            current_position_size: Decimal::from_int(5),
            current_leverage: Some(Decimal::from_int(3)),
            daily_pnl: Decimal::from_int(50),
        };
        assert!(evaluate(&limits, &request(Side::Buy, 2), &context, 1).is_ok());
    }

    #[test]
    fn daily_loss_floor_breach_rejects() {
        let limits = RiskLimits {
            daily_loss_floor: Some(Decimal::from_int(-500)),
            ..Default::default()
        };
        let context = RiskContext {
            daily_pnl: Decimal::from_int(-600),
            ..Default::default()
        };
        assert!(evaluate(&limits, &request(Side::Sell, 1), &context, 0).is_err());
    }

    #[test]
    fn rate_limit_breach_rejects_independent_of_other_gates() {
        let limits = RiskLimits {
            max_orders_per_symbol_rate: Some((3, 1_000)),
            ..Default::default()
        };
        let context = RiskContext::default();
        assert!(evaluate(&limits, &request(Side::Buy, 1), &context, 3).is_err());
        assert!(evaluate(&limits, &request(Side::Buy, 1), &context, 2).is_ok());
    }

    #[test]
    fn projected_position_crossing_the_limit_is_rejected_even_when_reducing_risk_direction() {
        let limits = RiskLimits {
            max_position_per_symbol: Some(Decimal::from_int(10)),
            ..Default::default()
        };
        let context = RiskContext {
            current_position_size: Decimal::from_int(9),
            ..Default::default()
        };
        assert!(evaluate(&limits, &request(Side::Buy, 5), &context, 0).is_err());
        assert!(evaluate(&limits, &request(Side::Sell, 1), &context, 0).is_ok());
    }
}
