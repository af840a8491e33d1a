use smol_str::SmolStr;
use zigquant_core::account::Balance;
use zigquant_core::error::CoreError;
use zigquant_core::order::{OrderRequest, OrderStatus};

/// Exchange-agnostic order submission boundary (§4.G, §4.K). Implementations
/// are adapter plug-ins; the Execution Engine never inspects their wire
/// format. Mirrors [`zigquant_data::provider::IDataProvider`]'s poll-driven,
/// non-async shape rather than the request/response futures the original
/// client trait used, since the engine calls it from its own worker thread.
pub trait IExecutionClient: Send {
    /// Submits `request` under `client_order_id`, which the adapter must
    /// echo back on every subsequent event for this order. Returns the
    /// exchange-assigned identifier on acknowledgement.
    fn submit_order(
        &mut self,
        client_order_id: &SmolStr,
        request: &OrderRequest,
    ) -> Result<SmolStr, CoreError>;

    fn cancel_order(&mut self, exchange_order_id: &SmolStr) -> Result<(), CoreError>;

    fn order_status(&mut self, exchange_order_id: &SmolStr) -> Result<OrderStatus, CoreError>;

    fn balance(&mut self) -> Result<Balance, CoreError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;

    /// An [`IExecutionClient`] whose acknowledgement, failure, and rejection
    /// behaviour is scripted by the test, used to exercise
    /// [`crate::engine::ExecutionEngine`] without a real adapter.
    #[derive(Debug, Default)]
    pub struct MockExecutionClient {
        /// Number of `submit_order` calls (per distinct `client_order_id`)
        /// that fail with a transport error before succeeding.
        pub fail_submits_before_success: u32,
        pub reject_all: bool,
        pub cancels: Vec<SmolStr>,
        pub balance: Balance,
        attempts_by_client_id: std::collections::HashMap<SmolStr, u32>,
        next_exchange_id: u64,
        pub statuses: std::collections::HashMap<SmolStr, OrderStatus>,
        pub status_queue: VecDeque<OrderStatus>,
    }

    impl MockExecutionClient {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl IExecutionClient for MockExecutionClient {
        fn submit_order(
            &mut self,
            client_order_id: &SmolStr,
            _request: &OrderRequest,
        ) -> Result<SmolStr, CoreError> {
            if self.reject_all {
                return Err(CoreError::Protocol("adapter rejected order".into()));
            }

            let attempts = self
                .attempts_by_client_id
                .entry(client_order_id.clone())
                .or_insert(0);
            *attempts += 1;

            if *attempts <= self.fail_submits_before_success {
                return Err(CoreError::Transport("simulated transport failure".into()));
            }

            self.next_exchange_id += 1;
            let exchange_id = SmolStr::new(format!("EX-{}", self.next_exchange_id));
            self.statuses
                .insert(exchange_id.clone(), OrderStatus::Open);
            Ok(exchange_id)
        }

        fn cancel_order(&mut self, exchange_order_id: &SmolStr) -> Result<(), CoreError> {
            self.cancels.push(exchange_order_id.clone());
            self.statuses
                .insert(exchange_order_id.clone(), OrderStatus::Cancelled);
            Ok(())
        }

        fn order_status(&mut self, exchange_order_id: &SmolStr) -> Result<OrderStatus, CoreError> {
            if let Some(status) = self.status_queue.pop_front() {
                return Ok(status);
            }
            self.statuses
                .get(exchange_order_id)
                .copied()
                .ok_or_else(|| CoreError::UnknownSymbol(exchange_order_id.to_string()))
        }

        fn balance(&mut self) -> Result<Balance, CoreError> {
            Ok(self.balance)
        }
    }
}
