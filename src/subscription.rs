//! Subscription (disposable) model
//!
//! A [`Subscription`] is an idempotent cancellation handle. Calling
//! `unsubscribe` once or a hundred times, from any thread, has the same
//! effect: the underlying resource is released exactly once.
//!
//! The building blocks:
//!
//! | Type | Holds | Replacing / adding after disposal |
//! |------|-------|-----------------------------------|
//! | [`SingleAssignmentSubscription`] | at most one resource, ever | disposes the newcomer |
//! | [`SerialSubscription`] | one resource, replaceable | disposes the newcomer |
//! | [`CompositeSubscription`] | any number of resources | disposes the newcomer |
//!
//! All of them are lock-free: every transition is a single atomic swap or
//! compare-and-swap, and a resource that loses a race against disposal is
//! always the one that gets disposed.

use std::sync::Arc;

mod boxed;
mod composite;
mod serial;
mod single_assignment;

pub use boxed::*;
pub use composite::*;
pub use serial::*;
pub use single_assignment::*;

/// A handle that releases a resource when unsubscribed.
///
/// Implementations must be idempotent and must never block or panic.
pub trait Subscription: Send + Sync {
  /// Release the resource. Calling this again is a no-op.
  fn unsubscribe(&self);

  /// Whether the resource has already been released (or never existed).
  fn is_closed(&self) -> bool;
}

/// The unit subscription has nothing to release and is always closed.
impl Subscription for () {
  #[inline]
  fn unsubscribe(&self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<T: Subscription + ?Sized> Subscription for Arc<T> {
  #[inline]
  fn unsubscribe(&self) { (**self).unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

impl<T: Subscription + ?Sized> Subscription for Box<T> {
  #[inline]
  fn unsubscribe(&self) { (**self).unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

#[cfg(test)]
pub(crate) mod test_util {
  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  use super::Subscription;

  /// Counts how many times it was unsubscribed.
  #[derive(Clone, Default)]
  pub(crate) struct CountingSubscription(pub(crate) Arc<AtomicUsize>);

  impl CountingSubscription {
    pub(crate) fn count(&self) -> usize { self.0.load(Ordering::SeqCst) }
  }

  impl Subscription for CountingSubscription {
    fn unsubscribe(&self) { self.0.fetch_add(1, Ordering::SeqCst); }

    fn is_closed(&self) -> bool { self.count() > 0 }
  }
}
