//! Explicit observer registration.
//!
//! Every registration returns a [`Subscription`] that releases the observer
//! exactly once, either through [`Subscription::dispose`] or on drop. Values
//! live in [`Observable`] cells and are only ever replaced whole, so an
//! observer never sees a partially updated field.

pub mod observable;
pub mod observers;
pub mod subscription;

pub use observable::Observable;
pub use observers::ObserverList;
pub use subscription::{Subscription, SubscriptionSet};
