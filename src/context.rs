//! Explicit dependency container replacing ambient globals: one instance per
//! process, constructed at startup and handed to every component that needs
//! ledger state.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use crate::domain::{BudgetAllocation, Goal, LedgerEntry, Partner, RecurringRule};
use crate::errors::LedgerError;
use crate::identity::{ActorId, IdentityProvider};
use crate::reactive::ReactiveCollection;
use crate::store::{keys, CacheStore};
use crate::sync::{RemoteBackend, SyncEngine, SyncOutbox, SyncStatus};

/// Shared state for one ledger session: the reactive mirrors of every entity
/// collection, the cache they persist to, and the outbox that carries their
/// mutations to the remote.
pub struct LedgerContext {
    pub entries: ReactiveCollection<LedgerEntry>,
    pub goals: ReactiveCollection<Goal>,
    pub recurring_rules: ReactiveCollection<RecurringRule>,
    pub partners: ReactiveCollection<Partner>,
    pub allocations: ReactiveCollection<BudgetAllocation>,
    store: Arc<dyn CacheStore>,
    identity: Arc<dyn IdentityProvider>,
    outbox: Arc<SyncOutbox>,
}

impl LedgerContext {
    /// Rebuilds every collection from the cache and reloads the pending
    /// outbox queue. Missing keys start empty; corrupt data is an error
    /// rather than silent data loss.
    pub fn bootstrap(
        store: Arc<dyn CacheStore>,
        identity: Arc<dyn IdentityProvider>,
        remote: Arc<dyn RemoteBackend>,
        online: watch::Receiver<bool>,
    ) -> Result<Arc<Self>, LedgerError> {
        let context = Self {
            entries: ReactiveCollection::new(),
            goals: ReactiveCollection::new(),
            recurring_rules: ReactiveCollection::new(),
            partners: ReactiveCollection::new(),
            allocations: ReactiveCollection::new(),
            outbox: Arc::new(SyncOutbox::load(Arc::clone(&store), remote, online)?),
            store,
            identity,
        };
        context
            .entries
            .seed(load_collection(context.store.as_ref(), keys::ENTRIES)?);
        context
            .goals
            .seed(load_collection(context.store.as_ref(), keys::GOALS)?);
        context
            .recurring_rules
            .seed(load_collection(context.store.as_ref(), keys::RECURRING_RULES)?);
        context
            .partners
            .seed(load_collection(context.store.as_ref(), keys::PARTNERS)?);
        context
            .allocations
            .seed(load_collection(context.store.as_ref(), keys::ALLOCATIONS)?);
        tracing::info!(
            entries = context.entries.len(),
            goals = context.goals.len(),
            rules = context.recurring_rules.len(),
            "ledger context bootstrapped from cache"
        );
        Ok(Arc::new(context))
    }

    /// Hard precondition for every mutation.
    pub fn current_actor(&self) -> Result<ActorId, LedgerError> {
        self.identity
            .current_actor()
            .ok_or(LedgerError::MissingIdentity)
    }

    pub fn outbox(&self) -> &Arc<SyncOutbox> {
        &self.outbox
    }

    /// Worker loop to spawn on the runtime of the embedding application.
    pub fn sync_engine(&self) -> SyncEngine {
        SyncEngine::new(Arc::clone(&self.outbox))
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.outbox.status()
    }

    /// Writes one collection's snapshot to the cache. A failed write is
    /// logged and tolerated: the in-memory state stands and the next
    /// successful write heals the snapshot, while the outbox remains the
    /// authoritative record of pending work.
    pub(crate) fn persist_collection<T: Serialize + Clone>(
        &self,
        key: &str,
        collection: &ReactiveCollection<T>,
    ) {
        let result = serde_json::to_vec_pretty(&collection.snapshot())
            .map_err(LedgerError::from)
            .and_then(|bytes| self.store.set(key, &bytes));
        if let Err(err) = result {
            tracing::warn!(key, error = %err, "cache write failed, keeping optimistic state");
        }
    }
}

fn load_collection<T: DeserializeOwned>(
    store: &dyn CacheStore,
    key: &str,
) -> Result<Vec<T>, LedgerError> {
    match store.get(key)? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
        None => Ok(Vec::new()),
    }
}
