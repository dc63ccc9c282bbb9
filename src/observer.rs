//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).
//!
//! # Contract
//!
//! - After `error` or `complete` no further call of any kind is made.
//! - Calls for one subscription never overlap, although they may arrive on
//!   different threads over time. The one exception is nesting: an observer
//!   that publishes into a [`Subject`](crate::subject::Subject) it listens to
//!   is re-entered on the same thread.
//!
//! Observers take `&self` and are `Send + Sync`: a single observer is often
//! reachable from several upstream threads (a source and a trigger stream,
//! say), and it is the engine's job, not the observer's, to keep those calls
//! sequential.

use std::sync::Arc;

use parking_lot::Mutex;

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
pub trait Observer<Item, Err>: Send + Sync {
  /// Receive the next value from the observable
  fn next(&self, value: Item);

  /// Handle an error from the observable. Terminal.
  fn error(&self, err: Err);

  /// Handle completion of the observable. Terminal.
  fn complete(&self);
}

/// Boxed observer, the form in which observers cross the `subscribe` boundary.
pub type BoxedObserver<Item, Err> = Box<dyn Observer<Item, Err>>;

impl<Item, Err, O: Observer<Item, Err> + ?Sized> Observer<Item, Err> for Box<O> {
  #[inline]
  fn next(&self, value: Item) { (**self).next(value) }

  #[inline]
  fn error(&self, err: Err) { (**self).error(err) }

  #[inline]
  fn complete(&self) { (**self).complete() }
}

impl<Item, Err, O: Observer<Item, Err> + ?Sized> Observer<Item, Err> for Arc<O> {
  #[inline]
  fn next(&self, value: Item) { (**self).next(value) }

  #[inline]
  fn error(&self, err: Err) { (**self).error(err) }

  #[inline]
  fn complete(&self) { (**self).complete() }
}

// ============================================================================
// FnObserver - Closure adapter
// ============================================================================

/// Observer built from three closures.
///
/// The value handler is a plain `Fn` and is called without any lock held, so
/// it may be re-entered, e.g. when a subject it listens to publishes from
/// inside the handler. The terminal handlers run at most once.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use rxengine::prelude::*;
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// observable::from_iter::<_, RxError>([1, 2, 3]).subscribe_with(FnObserver::new(
///   move |v| sink.lock().unwrap().push(v),
///   |_: RxError| {},
///   || {},
/// ));
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
/// ```
pub struct FnObserver<N, E, C> {
  next: N,
  error: Mutex<Option<E>>,
  complete: Mutex<Option<C>>,
}

impl<N, E, C> FnObserver<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self {
    Self {
      next,
      error: Mutex::new(Some(error)),
      complete: Mutex::new(Some(complete)),
    }
  }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for FnObserver<N, E, C>
where
  N: Fn(Item) + Send + Sync,
  E: FnOnce(Err) + Send,
  C: FnOnce() + Send,
{
  fn next(&self, value: Item) { (self.next)(value) }

  fn error(&self, err: Err) {
    let handler = self.error.lock().take();
    if let Some(handler) = handler {
      handler(err);
    }
  }

  fn complete(&self) {
    let handler = self.complete.lock().take();
    if let Some(handler) = handler {
      handler();
    }
  }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicI32, Ordering};

  use super::*;

  #[rxengine_macro::test]
  fn closure_observer_dispatches() {
    let sum = Arc::new(AtomicI32::new(0));
    let done = Arc::new(AtomicI32::new(0));
    let observer = {
      let (sum, done) = (sum.clone(), done.clone());
      FnObserver::new(
        move |v: i32| {
          sum.fetch_add(v, Ordering::SeqCst);
        },
        |_: ()| {},
        move || {
          done.fetch_add(1, Ordering::SeqCst);
        },
      )
    };

    observer.next(10);
    observer.next(20);
    Observer::<i32, ()>::complete(&observer);
    Observer::<i32, ()>::complete(&observer);

    assert_eq!(sum.load(Ordering::SeqCst), 30);
    assert_eq!(done.load(Ordering::SeqCst), 1);
  }

  #[rxengine_macro::test]
  fn boxed_and_shared_observers_forward() {
    let sum = Arc::new(AtomicI32::new(0));
    let boxed: BoxedObserver<i32, ()> = {
      let sum = sum.clone();
      Box::new(FnObserver::new(
        move |v: i32| {
          sum.fetch_add(v, Ordering::SeqCst);
        },
        |_: ()| {},
        || {},
      ))
    };
    let shared: Arc<dyn Observer<i32, ()>> = Arc::from(boxed);
    shared.next(1);
    shared.clone().next(2);
    assert_eq!(sum.load(Ordering::SeqCst), 3);
  }
}
