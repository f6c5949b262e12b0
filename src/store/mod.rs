//! Durable key-value persistence for entity collections and the sync queue.
//!
//! Each logical collection lives under its own key and is written atomically
//! and independently; there is no cross-key transactionality. The outbox, not
//! the cache snapshot, is the authoritative record of pending work, so a
//! failed write here is reported but never blocks the optimistic in-memory
//! update.

pub mod json_store;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::LedgerError;

pub use json_store::JsonFileStore;

/// Collection keys used by the engine.
pub mod keys {
    pub const ENTRIES: &str = "entries";
    pub const GOALS: &str = "goals";
    pub const RECURRING_RULES: &str = "recurring_rules";
    pub const PARTNERS: &str = "partners";
    pub const ALLOCATIONS: &str = "allocations";
    pub const OUTBOX: &str = "outbox";
}

/// Abstraction over persistence backends holding one serialized collection
/// per key, durable across process restarts.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;
    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), LedgerError>;
    fn remove(&self, key: &str) -> Result<(), LedgerError>;
}

/// Volatile store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self
            .entries
            .lock()
            .expect("store lock poisoned")
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<(), LedgerError> {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LedgerError> {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .remove(key);
        Ok(())
    }
}
