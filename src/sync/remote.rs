//! Delivery contract against the remote system of record.

use std::time::Duration;

use async_trait::async_trait;

use super::OutboxOperation;

/// Upper bound on a single delivery attempt; a timeout is treated as a
/// network failure, not a rejection.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Three-way outcome of one delivery attempt. The retry-vs-dead-letter
/// policy depends on this exact distinction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The remote applied the operation. Deleting an entity the remote never
    /// saw also reports success (idempotent delete).
    Success,
    /// Transient transport failure; the operation will be retried.
    NetworkFailure(String),
    /// The remote structurally refused the payload; dead-letter immediately.
    Rejected(String),
}

/// Per-entity "apply operation" contract against the remote backend.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn apply(&self, operation: &OutboxOperation) -> Delivery;
}
