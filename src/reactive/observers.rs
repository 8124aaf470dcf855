use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::subscription::Subscription;

/// Observer callback. Returning `false` unsubscribes the observer.
type Callback<A> = Arc<dyn Fn(&A) -> bool + Send + Sync>;

struct Entry<A> {
    id: u64,
    active: Arc<AtomicBool>,
    callback: Callback<A>,
}

struct Registry<A> {
    next_id: u64,
    entries: Vec<Entry<A>>,
}

/// List of observers notified synchronously, in registration order.
///
/// No lock is held while callbacks run, so a callback may register or
/// dispose observers (including itself) on the same list. An observer
/// disposed during a notification pass is not called for the rest of it.
pub struct ObserverList<A> {
    registry: Arc<Mutex<Registry<A>>>,
}

impl<A: 'static> ObserverList<A> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&A) + Send + Sync + 'static) -> Subscription {
        self.subscribe_until(move |arg| {
            callback(arg);
            true
        })
    }

    /// Subscribe until the callback returns `false`.
    pub fn subscribe_until(
        &self,
        callback: impl Fn(&A) -> bool + Send + Sync + 'static,
    ) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        let id = {
            let mut registry = self.registry.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(Entry {
                id,
                active: active.clone(),
                callback: Arc::new(callback),
            });
            id
        };

        let registry: Weak<Mutex<Registry<A>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            active.store(false, Ordering::SeqCst);
            if let Some(registry) = registry.upgrade() {
                registry.lock().entries.retain(|entry| entry.id != id);
            }
        })
    }

    /// Subscribe for exactly one notification.
    pub fn subscribe_once(&self, callback: impl FnOnce(&A) + Send + 'static) -> Subscription {
        let slot = Mutex::new(Some(callback));
        self.subscribe_until(move |arg| {
            let callback = slot.lock().take();
            if let Some(callback) = callback {
                callback(arg);
            }
            false
        })
    }

    /// Deliver `arg` to every active observer. Returns the number called.
    pub fn notify(&self, arg: &A) -> usize {
        let snapshot: Vec<(Arc<AtomicBool>, Callback<A>)> = {
            let mut registry = self.registry.lock();
            registry
                .entries
                .retain(|entry| entry.active.load(Ordering::SeqCst));
            registry
                .entries
                .iter()
                .map(|entry| (entry.active.clone(), entry.callback.clone()))
                .collect()
        };

        let mut delivered = 0;
        for (active, callback) in snapshot {
            if !active.load(Ordering::SeqCst) {
                continue;
            }
            delivered += 1;
            if !callback(arg) {
                active.store(false, Ordering::SeqCst);
            }
        }
        delivered
    }

    /// Number of observers that are still subscribed.
    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.active.load(Ordering::SeqCst))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: 'static> Default for ObserverList<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for ObserverList<A> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}
