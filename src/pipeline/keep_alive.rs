//! Blocking hold used by `--wait` once the run is done.

use crossbeam_channel::{Receiver, Sender, bounded};

/// Blocks the holder until the paired [`KeepAliveRelease`] is used or dropped.
pub struct KeepAlive {
    release_rx: Receiver<()>,
}

/// Ends a [`KeepAlive`] hold.
pub struct KeepAliveRelease {
    release_tx: Sender<()>,
}

/// Creates a hold and its release handle.
pub fn keep_alive() -> (KeepAlive, KeepAliveRelease) {
    let (release_tx, release_rx) = bounded(1);
    (KeepAlive { release_rx }, KeepAliveRelease { release_tx })
}

impl KeepAlive {
    /// Parks the calling thread without spinning.
    pub fn hold(self) {
        let released = self.release_rx.recv().is_ok();
        tracing::debug!(released, "keep-alive ended");
    }
}

impl KeepAliveRelease {
    pub fn release(self) {
        if self.release_tx.send(()).is_err() {
            tracing::debug!("keep-alive already gone");
        }
    }
}
