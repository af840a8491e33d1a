use crate::slippage::SlippageModel;
use zigquant_core::candle::Candle;
use zigquant_core::instrument::Side;
use zigquant_core::order::{OrderRequest, OrderType};
use zigquant_decimal::Decimal;

/// Which field of the reference candle prices a filled market order (§4.H
/// notes the source mixes "next open" and "current close" call sites; this
/// spec fixes "next open" as the default, both exercisable).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FillAt {
    NextOpen,
    NextClose,
}

impl Default for FillAt {
    fn default() -> Self {
        FillAt::NextOpen
    }
}

/// Whether, and at what price, `order` fills against `reference`'s OHLC
/// range (§4.H fill rules): market orders always fill, limit orders only if
/// the range crosses the limit price, trigger orders only if the range
/// crosses the trigger price.
pub fn try_fill(order: &OrderRequest, reference: &Candle, fill_at: FillAt, slippage: &dyn SlippageModel) -> Option<Decimal> {
    match order.order_type {
        OrderType::Market => {
            let raw = match fill_at {
                FillAt::NextOpen => reference.open,
                FillAt::NextClose => reference.close,
            };
            Some(slippage.adjust(raw, order.side))
        }
        OrderType::Limit => {
            let limit = order.price?;
            if limit_crossed(order.side, limit, reference) {
                Some(limit)
            } else {
                None
            }
        }
        OrderType::Trigger => {
            let trigger = order.trigger_price?;
            if reference.low <= trigger && reference.high >= trigger {
                Some(slippage.adjust(trigger, order.side))
            } else {
                None
            }
        }
    }
}

fn limit_crossed(side: Side, limit: Decimal, range: &Candle) -> bool {
    match side {
        Side::Buy => range.low <= limit,
        Side::Sell => range.high >= limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slippage::ZeroSlippage;
    use zigquant_core::order::{PositionSide, TimeInForce};
    use zigquant_core::time::Timestamp;

    fn candle(open: i64, high: i64, low: i64, close: i64) -> Candle {
        Candle {
            timestamp: Timestamp(0),
            open: Decimal::from_int(open),
            high: Decimal::from_int(high),
            low: Decimal::from_int(low),
            close: Decimal::from_int(close),
            volume: Decimal::ZERO,
        }
    }

    fn request(order_type: OrderType, side: Side, price: Option<i64>, trigger: Option<i64>) -> OrderRequest {
        OrderRequest {
            client_order_id: None,
            symbol: "BTC-PERP".into(),
            side,
            order_type,
            time_in_force: TimeInForce::Gtc,
            price: price.map(Decimal::from_int),
            quantity: Decimal::from_int(1),
            trigger_price: trigger.map(Decimal::from_int),
            reduce_only: false,
            position_side: PositionSide::Both,
        }
    }

    #[test]
    fn market_order_fills_at_the_reference_candles_open_by_default() {
        let order = request(OrderType::Market, Side::Buy, None, None);
        let reference = candle(105, 110, 100, 108);
        let fill = try_fill(&order, &reference, FillAt::NextOpen, &ZeroSlippage).unwrap();
        assert_eq!(fill, Decimal::from_int(105));
    }

    #[test]
    fn market_order_can_be_configured_to_fill_at_close() {
        let order = request(OrderType::Market, Side::Buy, None, None);
        let reference = candle(105, 110, 100, 108);
        let fill = try_fill(&order, &reference, FillAt::NextClose, &ZeroSlippage).unwrap();
        assert_eq!(fill, Decimal::from_int(108));
    }

    #[test]
    fn buy_limit_fills_only_when_the_range_trades_down_to_it() {
        let order = request(OrderType::Limit, Side::Buy, Some(95), None);
        let misses = candle(105, 110, 100, 108);
        assert!(try_fill(&order, &misses, FillAt::NextOpen, &ZeroSlippage).is_none());

        let crosses = candle(105, 110, 90, 108);
        assert_eq!(try_fill(&order, &crosses, FillAt::NextOpen, &ZeroSlippage), Some(Decimal::from_int(95)));
    }

    #[test]
    fn sell_limit_fills_only_when_the_range_trades_up_to_it() {
        let order = request(OrderType::Limit, Side::Sell, Some(115), None);
        let misses = candle(105, 110, 100, 108);
        assert!(try_fill(&order, &misses, FillAt::NextOpen, &ZeroSlippage).is_none());

        let crosses = candle(105, 120, 100, 108);
        assert_eq!(try_fill(&order, &crosses, FillAt::NextOpen, &ZeroSlippage), Some(Decimal::from_int(115)));
    }

    #[test]
    fn trigger_order_fires_once_the_range_crosses_the_trigger_price() {
        let order = request(OrderType::Trigger, Side::Sell, None, Some(95));
        let misses = candle(105, 110, 100, 108);
        assert!(try_fill(&order, &misses, FillAt::NextOpen, &ZeroSlippage).is_none());

        let crosses = candle(105, 110, 90, 108);
        assert_eq!(try_fill(&order, &crosses, FillAt::NextOpen, &ZeroSlippage), Some(Decimal::from_int(95)));
    }
}
