use crate::event::DataMessage;
use crate::subscription::Subscription;
use zigquant_core::error::CoreError;

/// Exchange-agnostic market data boundary (§4.D, §4.K). Implementations are
/// adapter plug-ins; the core never inspects their wire format.
pub trait IDataProvider: Send {
    fn connect(&mut self) -> Result<(), CoreError>;
    fn disconnect(&mut self);
    /// Idempotent: a duplicate `(symbol, kind)` subscription is a no-op.
    fn subscribe(&mut self, subscription: Subscription) -> Result<(), CoreError>;
    fn unsubscribe(&mut self, symbol: &str) -> Result<(), CoreError>;
    /// Non-blocking poll for the next queued message, if any.
    fn poll(&mut self) -> Option<DataMessage>;
}
