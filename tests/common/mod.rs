//! Shared fixtures: an in-memory context wired to a scripted remote stub.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use ledger_core::context::LedgerContext;
use ledger_core::domain::{Domain, EntryKind, NewEntry, Settlement};
use ledger_core::identity::StaticIdentity;
use ledger_core::store::MemoryStore;
use ledger_core::sync::{
    connectivity_channel, ConnectivityHandle, Delivery, EntityTable, OperationKind, OutboxOperation,
    RemoteBackend,
};

pub const ACTOR: &str = "actor-1";

/// One observed delivery attempt.
#[derive(Debug, Clone)]
pub struct SeenCall {
    pub table: EntityTable,
    pub kind: OperationKind,
    pub operation_id: uuid::Uuid,
    pub payload: serde_json::Value,
}

/// Remote stub that replays scripted outcomes (defaulting to success) and
/// records every attempt.
#[derive(Default)]
pub struct StubRemote {
    outcomes: Mutex<VecDeque<Delivery>>,
    calls: Mutex<Vec<SeenCall>>,
}

impl StubRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, outcome: Delivery) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<SeenCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteBackend for StubRemote {
    async fn apply(&self, operation: &OutboxOperation) -> Delivery {
        self.calls.lock().unwrap().push(SeenCall {
            table: operation.table,
            kind: operation.kind,
            operation_id: operation.id,
            payload: operation.payload.clone(),
        });
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Delivery::Success)
    }
}

pub struct Harness {
    pub ctx: Arc<LedgerContext>,
    pub remote: Arc<StubRemote>,
    pub connectivity: ConnectivityHandle,
    pub store: Arc<MemoryStore>,
}

pub fn harness(online: bool) -> Harness {
    let (connectivity, online_rx) = connectivity_channel(online);
    let store = Arc::new(MemoryStore::new());
    let remote = Arc::new(StubRemote::new());
    let ctx = LedgerContext::bootstrap(
        store.clone(),
        Arc::new(StaticIdentity::new(ACTOR)),
        remote.clone(),
        online_rx,
    )
    .expect("bootstrap context");
    Harness {
        ctx,
        remote,
        connectivity,
        store,
    }
}

pub fn sample_entry(description: &str, amount_cents: i64) -> NewEntry {
    let occurs_at = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
    let mut input = NewEntry::new(
        EntryKind::Expense,
        amount_cents,
        description,
        occurs_at,
        Domain::Personal,
    );
    input.settlement = Settlement::Paid;
    input
}
