//! Run-wide cancellation signal.
//!
//! Cancelling drops the only sender of a zero-capacity channel, so every
//! clone of the receiver becomes ready at once and can take part in a
//! `select!` next to a blocking queue send.

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct CancelToken {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(tx))),
            signal: rx,
        }
    }

    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        let mut trigger = self
            .trigger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        trigger.take();
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.signal.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver that becomes ready (disconnected) once cancelled.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.signal
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Sends `item` unless the run is cancelled first.
///
/// Returns `false` when the item was not delivered, either because of
/// cancellation or because the consumer is gone.
pub fn send_or_cancel<T>(tx: &Sender<T>, item: T, cancel: &CancelToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    crossbeam_channel::select! {
        send(tx, item) -> res => res.is_ok(),
        recv(cancel.receiver()) -> _ => false,
    }
}
