//! Order lifecycle management: pre-trade risk gates, a retrying submission
//! protocol, cancellation, and fill reconciliation into the position book
//! (§4.G).

pub mod client;
pub mod engine;
pub mod id;
pub mod order_tracker;
pub mod risk;

pub use client::IExecutionClient;
pub use engine::{ExecutionEngine, ExecutionEngineConfig, OrderResult, RetryConfig};
pub use order_tracker::OrderTracker;
pub use risk::{RiskContext, RiskLimits};

#[cfg(test)]
mod tests {
    use crate::client::mock::MockExecutionClient;
    use crate::engine::{ExecutionEngine, ExecutionEngineConfig};
    use zigquant_core::instrument::Side;
    use zigquant_core::order::{OrderRequest, OrderStatus, OrderType, PositionSide, TimeInForce};
    use zigquant_decimal::Decimal;

    fn request() -> OrderRequest {
        OrderRequest {
            client_order_id: Some("A".into()),
            symbol: "BTC-PERP".into(),
            side: Side::Buy,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Ioc,
            price: Some(Decimal::from_int(20_000)),
            quantity: Decimal::from_int(1),
            trigger_price: None,
            reduce_only: false,
            position_side: PositionSide::Both,
        }
    }

    #[test]
    fn s3_retry_with_the_same_client_order_id_succeeds_on_second_attempt() {
        let client = MockExecutionClient {
            fail_submits_before_success: 1,
            ..Default::default()
        };
        let engine = ExecutionEngine::new(
            ExecutionEngineConfig::default(),
            Box::new(client),
            None,
        );

        let result = engine.submit_order(request());

        assert!(result.success);
        assert_eq!(result.client_order_id.as_str(), "A");
        assert!(result.exchange_order_id.is_some());
        assert_eq!(engine.get_order_status(&"A".into()), Some(OrderStatus::Open));
    }

    #[test]
    fn duplicate_client_order_id_is_rejected_without_resubmission() {
        let client = MockExecutionClient::default();
        let engine = ExecutionEngine::new(ExecutionEngineConfig::default(), Box::new(client), None);

        let first = engine.submit_order(request());
        assert!(first.success);

        let second = engine.submit_order(request());
        assert!(!second.success);
        assert!(second.reason.unwrap().contains("duplicate"));
    }

    #[test]
    fn adapter_rejection_is_terminal_and_not_retried() {
        let client = MockExecutionClient {
            reject_all: true,
            ..Default::default()
        };
        let engine = ExecutionEngine::new(ExecutionEngineConfig::default(), Box::new(client), None);

        let result = engine.submit_order(request());
        assert!(!result.success);
        assert_eq!(result.status, Some(OrderStatus::Rejected));
    }

    #[test]
    fn cancel_on_an_order_that_exhausted_retries_is_a_no_op_since_it_is_already_terminal() {
        // fails on every attempt, exhausting retries without ever receiving
        // an exchange_order_id.
        let client = MockExecutionClient {
            fail_submits_before_success: 100,
            ..Default::default()
        };
        let engine = ExecutionEngine::new(
            ExecutionEngineConfig {
                retry: crate::engine::RetryConfig {
                    max_retries: 0,
                    base_backoff_ms: 1,
                    backoff_cap_ms: 1,
                },
                ..Default::default()
            },
            Box::new(client),
            None,
        );

        let result = engine.submit_order(request());
        assert!(!result.success);
        assert_eq!(result.status, Some(OrderStatus::Rejected));

        let cancel = engine.cancel_order(&"A".into());
        assert!(cancel.is_ok());
    }

    #[test]
    fn cancel_is_a_no_op_once_an_order_is_already_terminal() {
        let client = MockExecutionClient {
            reject_all: true,
            ..Default::default()
        };
        let engine = ExecutionEngine::new(ExecutionEngineConfig::default(), Box::new(client), None);
        engine.submit_order(request());

        assert!(engine.cancel_order(&"A".into()).is_ok());
    }

    #[test]
    fn max_notional_gate_rejects_before_any_submission_is_attempted() {
        let client = MockExecutionClient::default();
        let mut config = ExecutionEngineConfig::default();
        config.risk_limits.max_notional_per_order = Some(Decimal::from_int(1_000));
        let engine = ExecutionEngine::new(config, Box::new(client), None);

        let result = engine.submit_order(request());
        assert!(!result.success);
        assert!(result.exchange_order_id.is_none());
    }

    #[test]
    fn cancel_all_orders_sweeps_every_non_terminal_order() {
        let client = MockExecutionClient::default();
        let engine = ExecutionEngine::new(ExecutionEngineConfig::default(), Box::new(client), None);

        engine.submit_order(request());
        let mut second = request();
        second.client_order_id = Some("B".into());
        engine.submit_order(second);

        assert_eq!(engine.cancel_all_orders(), 2);
        assert_eq!(engine.get_order_status(&"A".into()), Some(OrderStatus::Cancelled));
        assert_eq!(engine.get_order_status(&"B".into()), Some(OrderStatus::Cancelled));
    }

    #[test]
    fn close_all_positions_flattens_every_open_position_via_a_reduce_only_order() {
        let client = MockExecutionClient::default();
        let engine = ExecutionEngine::new(ExecutionEngineConfig::default(), Box::new(client), None);

        let submitted = engine.submit_order(request());
        assert!(submitted.success);
        engine
            .apply_fill(zigquant_core::bus::OrderFillEvent {
                client_order_id: "A".into(),
                fill_quantity: Decimal::from_int(1),
                fill_price: Decimal::from_int(20_000),
                fee: Decimal::ZERO,
            })
            .unwrap();

        assert!(!engine.get_position("BTC-PERP").unwrap().is_flat());
        assert_eq!(engine.close_all_positions(), 1);
    }
}
