//! Observable trait and source factories
//!
//! An [`Observable`] is a cold description of a stream: nothing happens until
//! `subscribe` is called, and every call starts an independent run that ends
//! when the returned subscription is unsubscribed or the stream terminates.
//!
//! Observers cross the `subscribe` boundary boxed and subscriptions come back
//! boxed, so observables compose as trait objects ([`BoxedObservable`]) as
//! easily as they do as concrete types.
//!
//! [`ObservableExt`] carries the convenience layer: closure subscription and
//! the operators.

use std::sync::Arc;

use crate::{
  observer::{BoxedObserver, FnObserver, Observer},
  ops::repeat_when::{Notifications, RepeatWhen},
  subscription::BoxedSubscription,
};

mod create;
mod from_iter;
mod throw_err_on;
mod trivial;

pub use create::*;
pub use from_iter::*;
pub use throw_err_on::*;
pub use trivial::*;

/// A source of `next`/`error`/`complete` events.
pub trait Observable<Item, Err>: Send + Sync {
  /// Start a new run delivering into `observer`.
  ///
  /// The returned subscription cancels the run. It may already be closed if
  /// the run terminated synchronously.
  fn subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedSubscription;
}

/// Type-erased, shareable observable.
pub type BoxedObservable<Item, Err> = Arc<dyn Observable<Item, Err>>;

impl<Item, Err, O: Observable<Item, Err> + ?Sized> Observable<Item, Err> for Arc<O> {
  #[inline]
  fn subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    (**self).subscribe(observer)
  }
}

impl<Item, Err, O: Observable<Item, Err> + ?Sized> Observable<Item, Err> for Box<O> {
  #[inline]
  fn subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    (**self).subscribe(observer)
  }
}

/// Convenience methods available on every observable.
pub trait ObservableExt<Item, Err>: Observable<Item, Err> + Sized {
  /// Subscribe any observer without boxing it by hand.
  fn subscribe_with<O>(&self, observer: O) -> BoxedSubscription
  where
    O: Observer<Item, Err> + 'static,
  {
    self.subscribe(Box::new(observer))
  }

  /// Subscribe with one closure per event kind.
  fn subscribe_all<N, E, C>(&self, next: N, error: E, complete: C) -> BoxedSubscription
  where
    N: Fn(Item) + Send + Sync + 'static,
    E: FnOnce(Err) + Send + 'static,
    C: FnOnce() + Send + 'static,
  {
    self.subscribe(Box::new(FnObserver::new(next, error, complete)))
  }

  /// Subscribe to values only; terminal events are ignored.
  fn subscribe_next<N>(&self, next: N) -> BoxedSubscription
  where
    N: Fn(Item) + Send + Sync + 'static,
  {
    self.subscribe_all(next, |_| {}, || {})
  }

  /// Resubscribe to this observable whenever the trigger stream built by
  /// `handler` emits. See [`RepeatWhen`].
  fn repeat_when<Signal, F, T, E>(self, handler: F) -> RepeatWhen<Self, F, Signal>
  where
    F: Fn(Notifications<Err>) -> Result<Option<T>, E>,
    T: Observable<Signal, Err>,
  {
    RepeatWhen::new(self, handler)
  }

  /// Erase the concrete type.
  fn box_it(self) -> BoxedObservable<Item, Err>
  where
    Self: 'static,
  {
    Arc::new(self)
  }
}

impl<Item, Err, T: Observable<Item, Err>> ObservableExt<Item, Err> for T {}
