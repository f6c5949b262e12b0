//! Outbox-based synchronization with the remote system of record.
//!
//! Every local mutation is captured as an [`OutboxOperation`] and survives in
//! the cache until the remote confirms it. Operations that cannot make
//! progress are parked as stalled, never dropped: losing a financial mutation
//! is the one unacceptable outcome.

pub mod engine;
pub mod outbox;
pub mod remote;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use engine::{connectivity_channel, ConnectivityHandle, SyncEngine};
pub use outbox::{FlushReport, SyncOutbox, MAX_RETRIES};
pub use remote::{Delivery, RemoteBackend, DELIVERY_TIMEOUT};

/// Remote tables the engine mirrors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityTable {
    Entries,
    Goals,
    RecurringRules,
    Partners,
    Allocations,
}

impl EntityTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityTable::Entries => "entries",
            EntityTable::Goals => "goals",
            EntityTable::RecurringRules => "recurring_rules",
            EntityTable::Partners => "partners",
            EntityTable::Allocations => "allocations",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
}

/// Why an operation stopped being retried automatically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StallCause {
    /// Transient failures exceeded the retry threshold.
    RetriesExhausted,
    /// The remote structurally refused the payload; retrying cannot succeed.
    Rejected { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    Pending,
    Stalled(StallCause),
}

impl OperationStatus {
    pub fn is_stalled(&self) -> bool {
        matches!(self, OperationStatus::Stalled(_))
    }
}

/// One not-yet-confirmed remote mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxOperation {
    pub id: Uuid,
    pub enqueued_at: DateTime<Utc>,
    pub table: EntityTable,
    pub kind: OperationKind,
    pub payload: serde_json::Value,
    pub actor: String,
    pub retry_count: u32,
    #[serde(default)]
    pub status: OperationStatus,
}

impl OutboxOperation {
    pub fn new(
        table: EntityTable,
        kind: OperationKind,
        payload: serde_json::Value,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            enqueued_at: Utc::now(),
            table,
            kind,
            payload,
            actor: actor.into(),
            retry_count: 0,
            status: OperationStatus::Pending,
        }
    }
}

/// Counts surfaced to the persistent user-visible sync indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub pending: usize,
    pub stalled: usize,
}

impl SyncStatus {
    pub fn is_idle(&self) -> bool {
        self.pending == 0 && self.stalled == 0
    }
}
