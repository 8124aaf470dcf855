use std::fmt;

type Disposer = Box<dyn FnOnce() + Send>;

/// Handle to a registered observer.
///
/// Dropping the handle disposes it. Disposal runs at most once.
#[must_use = "dropping a Subscription disposes it immediately"]
pub struct Subscription {
    dispose: Option<Disposer>,
}

impl Subscription {
    pub fn new(dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A subscription with nothing to release (e.g. a one-shot wait that
    /// resolved synchronously).
    pub fn inert() -> Self {
        Self { dispose: None }
    }

    /// Whether disposal is still pending.
    pub fn is_active(&self) -> bool {
        self.dispose.is_some()
    }

    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Unordered collection of subscriptions released together.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Dispose every subscription, returning how many were held.
    pub fn dispose_all(&mut self) -> usize {
        let count = self.subscriptions.len();
        for subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
        count
    }
}

impl Extend<Subscription> for SubscriptionSet {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.subscriptions.extend(iter);
    }
}

impl FromIterator<Subscription> for SubscriptionSet {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Self {
            subscriptions: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SubscriptionSet {
    type Item = Subscription;
    type IntoIter = std::vec::IntoIter<Subscription>;

    fn into_iter(mut self) -> Self::IntoIter {
        std::mem::take(&mut self.subscriptions).into_iter()
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
