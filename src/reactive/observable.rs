use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::observers::ObserverList;
use super::subscription::Subscription;

/// A value cell that notifies observers when it is reassigned.
///
/// Writes replace the whole value and notify only when it actually changed.
/// Observers receive the new value after the write is visible to `get`.
pub struct Observable<T> {
    value: Arc<Mutex<T>>,
    observers: ObserverList<T>,
}

impl<T> Observable<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
            observers: ObserverList::new(),
        }
    }

    pub fn get(&self) -> T {
        self.value.lock().clone()
    }

    /// Read through a borrow. `f` must not write back to this cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.lock())
    }

    /// Replace the value. Returns `true` if observers were notified.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.lock();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.observers.notify(&value);
        true
    }

    /// Copy, modify and reassign the value as one write.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Call `f` on every subsequent change.
    pub fn observe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.observers.subscribe(f)
    }

    /// Call `f` with the current value now, then on every change.
    pub fn autorun(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let f = Arc::new(f);
        let current = self.get();
        f(&current);
        let f_obs = f.clone();
        self.observers.subscribe(move |value| f_obs(value))
    }

    /// Run `effect` once, the first time `predicate` holds.
    ///
    /// If the predicate already holds, `effect` runs before this returns and
    /// the returned subscription is inert. Disposing the subscription before
    /// the predicate holds cancels the effect.
    pub fn when(
        &self,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
        effect: impl FnOnce() + Send + 'static,
    ) -> Subscription {
        if self.with(|value| predicate(value)) {
            effect();
            return Subscription::inert();
        }

        let slot = Mutex::new(Some(effect));
        self.observers.subscribe_until(move |value| {
            if !predicate(value) {
                return true;
            }
            let effect = slot.lock().take();
            if let Some(effect) = effect {
                effect();
            }
            false
        })
    }

    /// Resolve with the first value satisfying `predicate`.
    ///
    /// Dropping the future before it resolves releases the listener.
    pub async fn wait_for(&self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> T {
        let predicate = Arc::new(predicate);
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let listening = predicate.clone();
        let _subscription = self.observers.subscribe_until(move |value| {
            if !listening(value) {
                return true;
            }
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(value.clone());
            }
            false
        });

        let current = self.get();
        if predicate(&current) {
            return current;
        }
        match rx.await {
            Ok(value) => value,
            Err(_) => self.get(),
        }
    }

    /// Number of live observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            observers: self.observers.clone(),
        }
    }
}

impl<T> Default for Observable<T>
where
    T: Clone + PartialEq + Send + Sync + Default + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Observable").field(&*self.value.lock()).finish()
    }
}
