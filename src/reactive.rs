//! Observable in-memory mirror of one entity collection.
//!
//! Listeners run synchronously on the mutating call, with a snapshot of the
//! collection taken after the change. A listener must not mutate the same
//! collection it is observing; that reentrancy is detected and rejected in
//! debug builds.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

type Listener<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

/// Handle returned by [`ReactiveCollection::subscribe`]; pass it back to
/// `unsubscribe` to stop receiving notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct ReactiveCollection<T> {
    items: Mutex<Vec<T>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
    notifying: AtomicBool,
}

impl<T: Clone> Default for ReactiveCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ReactiveCollection<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            notifying: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&[T]) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .retain(|(existing, _)| *existing != id);
    }

    /// Replaces the whole collection and notifies subscribers.
    pub fn replace(&self, items: Vec<T>) {
        self.mutate(|current| *current = items);
    }

    /// Applies `apply` to the collection, then notifies subscribers with a
    /// snapshot taken after the change.
    pub fn mutate<R>(&self, apply: impl FnOnce(&mut Vec<T>) -> R) -> R {
        debug_assert!(
            !self.notifying.load(Ordering::Acquire),
            "reentrant mutation of a reactive collection from a listener"
        );
        let (result, snapshot) = {
            let mut items = self.items.lock().expect("collection lock poisoned");
            let result = apply(&mut items);
            (result, items.clone())
        };
        self.notify(&snapshot);
        result
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().expect("collection lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("collection lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads persisted state without waking subscribers; used only while
    /// rebuilding collections from the cache at startup.
    pub fn seed(&self, items: Vec<T>) {
        *self.items.lock().expect("collection lock poisoned") = items;
    }

    fn notify(&self, snapshot: &[T]) {
        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .expect("listener lock poisoned")
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        self.notifying.store(true, Ordering::Release);
        for listener in listeners {
            listener(snapshot);
        }
        self.notifying.store(false, Ordering::Release);
    }
}
