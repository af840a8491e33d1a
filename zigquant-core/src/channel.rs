use std::fmt::Debug;
use tracing::warn;

/// A sender that can fail, but whose failure is not itself fatal to the
/// caller (the paired receiver simply dropped).
pub trait Tx: Debug + Clone + Send {
    type Item;
    fn send(&self, item: Self::Item) -> Result<(), Self::Item>;
}

#[derive(Debug, Clone)]
pub struct UnboundedTx<T> {
    tx: tokio::sync::mpsc::UnboundedSender<T>,
}

impl<T: Debug + Clone + Send> Tx for UnboundedTx<T> {
    type Item = T;

    fn send(&self, item: T) -> Result<(), T> {
        self.tx.send(item).map_err(|e| e.0)
    }
}

#[derive(Debug)]
pub struct UnboundedRx<T> {
    rx: tokio::sync::mpsc::UnboundedReceiver<T>,
}

impl<T> UnboundedRx<T> {
    /// Drains every currently-available item without blocking.
    pub fn try_recv_all(&mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Ok(item) = self.rx.try_recv() {
            items.push(item);
        }
        items
    }

    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

pub fn mpsc_unbounded<T>() -> (UnboundedTx<T>, UnboundedRx<T>) {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    (UnboundedTx { tx }, UnboundedRx { rx })
}

/// A sender that disables itself (rather than erroring repeatedly) once its
/// receiver has dropped.
#[derive(Debug, Clone)]
pub struct ChannelTxDroppable<ChannelTx> {
    state: ChannelState<ChannelTx>,
}

#[derive(Debug, Clone)]
enum ChannelState<ChannelTx> {
    Active(ChannelTx),
    Disabled,
}

impl<ChannelTx> ChannelTxDroppable<ChannelTx> {
    pub fn new(tx: ChannelTx) -> Self {
        Self {
            state: ChannelState::Active(tx),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ChannelState::Active(_))
    }
}

impl<ChannelTx> ChannelTxDroppable<ChannelTx>
where
    ChannelTx: Tx,
    ChannelTx::Item: Clone,
{
    pub fn send(&mut self, item: ChannelTx::Item) {
        let ChannelState::Active(tx) = &self.state else {
            return;
        };

        if tx.send(item).is_err() {
            let name = std::any::type_name::<ChannelTx::Item>();
            warn!(name, "subscriber channel receiver dropped, disabling sender");
            self.state = ChannelState::Disabled;
        }
    }
}
