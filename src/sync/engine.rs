//! Flush worker reacting to enqueue signals and connectivity transitions.

use std::sync::Arc;

use tokio::sync::watch;

use super::outbox::SyncOutbox;

/// Sender half of the connectivity signal. The platform layer flips it as
/// the device goes on- and offline.
#[derive(Clone)]
pub struct ConnectivityHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ConnectivityHandle {
    pub fn set_online(&self, online: bool) {
        // send only fails with no receivers, which means the engine is gone
        let _ = self.sender.send(online);
    }

    pub fn is_online(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Creates the connectivity pair: a handle for the platform layer and a
/// receiver the outbox and engine observe.
pub fn connectivity_channel(initially_online: bool) -> (ConnectivityHandle, watch::Receiver<bool>) {
    let (sender, receiver) = watch::channel(initially_online);
    (
        ConnectivityHandle {
            sender: Arc::new(sender),
        },
        receiver,
    )
}

/// Long-running loop that owns outbox flushing. Runs until the connectivity
/// sender is dropped.
pub struct SyncEngine {
    outbox: Arc<SyncOutbox>,
    online: watch::Receiver<bool>,
}

impl SyncEngine {
    pub fn new(outbox: Arc<SyncOutbox>) -> Self {
        let online = outbox.online_signal();
        Self { outbox, online }
    }

    /// Flushes whenever an operation is enqueued while online and whenever
    /// connectivity transitions from offline to online.
    pub async fn run(mut self) {
        let mut was_online = *self.online.borrow();
        if was_online {
            self.outbox.flush().await;
        }
        loop {
            tokio::select! {
                _ = self.outbox.flush_signal().notified() => {
                    if *self.online.borrow() {
                        self.outbox.flush().await;
                    }
                }
                changed = self.online.changed() => {
                    if changed.is_err() {
                        tracing::debug!("connectivity signal closed, stopping sync engine");
                        break;
                    }
                    let now_online = *self.online.borrow();
                    if now_online && !was_online {
                        tracing::info!("connectivity restored, flushing outbox");
                        self.outbox.flush().await;
                    }
                    was_online = now_online;
                }
            }
        }
    }
}
