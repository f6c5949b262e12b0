use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::{watch, Notify};
use tokio::time::timeout;
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::store::{keys, CacheStore};

use super::remote::{Delivery, RemoteBackend, DELIVERY_TIMEOUT};
use super::{EntityTable, OperationKind, OperationStatus, OutboxOperation, StallCause, SyncStatus};

/// Network failures are retried until `retry_count` exceeds this threshold.
pub const MAX_RETRIES: u32 = 3;

/// Outcome summary of one flush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub retried: usize,
    pub stalled: usize,
    pub skipped: usize,
}

/// Durable FIFO of pending remote operations.
///
/// Delivery order is FIFO per entity table: once an operation for a table
/// fails or is found stalled during a pass, the rest of that table is skipped
/// until the next pass so later operations can never overtake earlier ones.
pub struct SyncOutbox {
    ops: Mutex<Vec<OutboxOperation>>,
    store: Arc<dyn CacheStore>,
    remote: Arc<dyn RemoteBackend>,
    online: watch::Receiver<bool>,
    wake: Notify,
}

impl SyncOutbox {
    /// Rebuilds the queue from the cache; a missing key yields an empty queue.
    pub fn load(
        store: Arc<dyn CacheStore>,
        remote: Arc<dyn RemoteBackend>,
        online: watch::Receiver<bool>,
    ) -> Result<Self, LedgerError> {
        let ops = match store.get(keys::OUTBOX)? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Vec::new(),
        };
        Ok(Self {
            ops: Mutex::new(ops),
            store,
            remote,
            online,
            wake: Notify::new(),
        })
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    /// Appends an operation, persists the queue, and signals the flush worker
    /// when connectivity is available. Never blocks on network I/O.
    pub fn enqueue(
        &self,
        table: EntityTable,
        kind: OperationKind,
        payload: serde_json::Value,
        actor: impl Into<String>,
    ) -> OutboxOperation {
        let operation = OutboxOperation::new(table, kind, payload, actor);
        {
            let mut ops = self.ops.lock().expect("outbox lock poisoned");
            ops.push(operation.clone());
        }
        tracing::debug!(
            table = table.as_str(),
            kind = ?kind,
            operation = %operation.id,
            "queued outbox operation"
        );
        if let Err(err) = self.persist() {
            tracing::warn!(error = %err, "failed to persist outbox after enqueue");
        }
        if self.is_online() {
            self.wake.notify_one();
        }
        operation
    }

    /// Attempts delivery of every pending operation in enqueue order.
    ///
    /// No-op while offline. Successes leave the queue; network failures are
    /// retried on later passes until the threshold, then parked as stalled;
    /// rejections are parked after the first attempt.
    pub async fn flush(&self) -> FlushReport {
        let mut report = FlushReport::default();
        if !self.is_online() {
            return report;
        }

        let pass: Vec<Uuid> = {
            let ops = self.ops.lock().expect("outbox lock poisoned");
            ops.iter().map(|op| op.id).collect()
        };
        let mut blocked: HashSet<EntityTable> = HashSet::new();

        for id in pass {
            let candidate = {
                let ops = self.ops.lock().expect("outbox lock poisoned");
                match ops.iter().find(|op| op.id == id) {
                    None => continue,
                    Some(op) if blocked.contains(&op.table) => {
                        report.skipped += 1;
                        continue;
                    }
                    Some(op) if op.status.is_stalled() => {
                        blocked.insert(op.table);
                        report.skipped += 1;
                        continue;
                    }
                    Some(op) => op.clone(),
                }
            };
            if !self.is_online() {
                break;
            }

            let outcome = match timeout(DELIVERY_TIMEOUT, self.remote.apply(&candidate)).await {
                Ok(outcome) => outcome,
                Err(_) => Delivery::NetworkFailure("delivery attempt timed out".into()),
            };

            let mut ops = self.ops.lock().expect("outbox lock poisoned");
            match outcome {
                Delivery::Success => {
                    ops.retain(|op| op.id != id);
                    report.delivered += 1;
                    tracing::info!(
                        table = candidate.table.as_str(),
                        operation = %id,
                        attempts = candidate.retry_count + 1,
                        "outbox operation delivered"
                    );
                }
                Delivery::NetworkFailure(reason) => {
                    if let Some(op) = ops.iter_mut().find(|op| op.id == id) {
                        op.retry_count += 1;
                        blocked.insert(op.table);
                        if op.retry_count > MAX_RETRIES {
                            op.status = OperationStatus::Stalled(StallCause::RetriesExhausted);
                            report.stalled += 1;
                            tracing::error!(
                                table = op.table.as_str(),
                                operation = %id,
                                retry_count = op.retry_count,
                                "outbox operation stalled after exhausting retries"
                            );
                        } else {
                            report.retried += 1;
                            tracing::warn!(
                                table = op.table.as_str(),
                                operation = %id,
                                retry_count = op.retry_count,
                                reason,
                                "outbox delivery failed, will retry"
                            );
                        }
                    }
                }
                Delivery::Rejected(reason) => {
                    if let Some(op) = ops.iter_mut().find(|op| op.id == id) {
                        blocked.insert(op.table);
                        op.status = OperationStatus::Stalled(StallCause::Rejected {
                            reason: reason.clone(),
                        });
                        report.stalled += 1;
                        tracing::error!(
                            table = op.table.as_str(),
                            operation = %id,
                            reason,
                            "outbox operation rejected by remote, dead-lettered"
                        );
                    }
                }
            }
        }

        if let Err(err) = self.persist() {
            tracing::warn!(error = %err, "failed to persist outbox after flush");
        }
        report
    }

    /// Returns a stalled operation to the retry path, resetting its count.
    pub fn retry_stalled(&self, id: Uuid) -> Result<(), LedgerError> {
        {
            let mut ops = self.ops.lock().expect("outbox lock poisoned");
            let op = ops
                .iter_mut()
                .find(|op| op.id == id && op.status.is_stalled())
                .ok_or_else(|| LedgerError::UnknownEntity(format!("stalled operation {id}")))?;
            op.status = OperationStatus::Pending;
            op.retry_count = 0;
        }
        self.persist()?;
        if self.is_online() {
            self.wake.notify_one();
        }
        Ok(())
    }

    /// Removes an operation on explicit user request. This is the only path
    /// that drops a queued mutation.
    pub fn discard(&self, id: Uuid) -> Result<OutboxOperation, LedgerError> {
        let removed = {
            let mut ops = self.ops.lock().expect("outbox lock poisoned");
            let index = ops
                .iter()
                .position(|op| op.id == id)
                .ok_or_else(|| LedgerError::UnknownEntity(format!("outbox operation {id}")))?;
            ops.remove(index)
        };
        self.persist()?;
        tracing::info!(operation = %id, "outbox operation discarded by user");
        Ok(removed)
    }

    pub fn status(&self) -> SyncStatus {
        let ops = self.ops.lock().expect("outbox lock poisoned");
        let stalled = ops.iter().filter(|op| op.status.is_stalled()).count();
        SyncStatus {
            pending: ops.len() - stalled,
            stalled,
        }
    }

    pub fn operations(&self) -> Vec<OutboxOperation> {
        self.ops.lock().expect("outbox lock poisoned").clone()
    }

    pub(crate) fn flush_signal(&self) -> &Notify {
        &self.wake
    }

    pub(crate) fn online_signal(&self) -> watch::Receiver<bool> {
        self.online.clone()
    }

    fn persist(&self) -> Result<(), LedgerError> {
        let bytes = {
            let ops = self.ops.lock().expect("outbox lock poisoned");
            serde_json::to_vec_pretty(&*ops)?
        };
        self.store.set(keys::OUTBOX, &bytes)
    }
}
