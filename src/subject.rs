//! Subject: a hot, thread-safe multicast hub
//!
//! A [`Subject`] is both sides of a stream at once. As an [`Observer`] it
//! accepts events; as an [`Observable`] it forwards each of them to every
//! observer subscribed at that moment.
//!
//! # Terminal latch
//!
//! Once `error` or `complete` has been published the subject is done: the
//! terminal is broadcast, the observer list is cleared, and every later
//! subscriber receives the same terminal straight away.
//!
//! # Disposal
//!
//! Unsubscribing the subject itself (it is a [`Subscription`] too) drops
//! every observer silently and turns later publishes into no-ops.
//!
//! # Reentrancy
//!
//! Observers are called outside the internal lock, so an observer may
//! publish into, subscribe to, or dispose the subject it is being called
//! from. Observers added during a broadcast do not see the event being
//! broadcast.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::{
  observable::Observable,
  observer::{BoxedObserver, Observer},
  subscription::{BoxedSubscription, Subscription},
};

type SharedObserver<Item, Err> = Arc<dyn Observer<Item, Err>>;

/// Observer list with ID-based removal.
///
/// Sized inline for a single observer, which is what a repeat notifier
/// carries almost always.
struct Subscribers<Item, Err> {
  next_id: usize,
  items: SmallVec<[(usize, SharedObserver<Item, Err>); 1]>,
}

impl<Item, Err> Subscribers<Item, Err> {
  fn new() -> Self { Self { next_id: 0, items: SmallVec::new() } }

  fn add(&mut self, observer: SharedObserver<Item, Err>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, observer));
    id
  }

  fn remove(&mut self, id: usize) -> Option<SharedObserver<Item, Err>> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  fn snapshot(&self) -> SmallVec<[SharedObserver<Item, Err>; 1]> {
    self.items.iter().map(|(_, o)| o.clone()).collect()
  }

  fn take_all(&mut self) -> SmallVec<[SharedObserver<Item, Err>; 1]> {
    self.items.drain(..).map(|(_, o)| o).collect()
  }

  fn len(&self) -> usize { self.items.len() }
}

enum Phase<Err> {
  Active,
  Completed,
  Errored(Err),
  Disposed,
}

struct Inner<Item, Err> {
  subscribers: Subscribers<Item, Err>,
  phase: Phase<Err>,
}

pub struct Subject<Item, Err> {
  inner: Arc<Mutex<Inner<Item, Err>>>,
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(Inner {
        subscribers: Subscribers::new(),
        phase: Phase::Active,
      })),
    }
  }

  /// Number of observers currently subscribed.
  pub fn observer_count(&self) -> usize { self.inner.lock().subscribers.len() }

  /// A subscribe-only view, for handing the stream out without the ability
  /// to publish into it.
  pub fn observable(&self) -> SubjectObservable<Item, Err> { SubjectObservable(self.clone()) }

  pub fn into_observable(self) -> SubjectObservable<Item, Err> { SubjectObservable(self) }

  /// Clear the observer list and move to `phase`, unless already terminal.
  fn finish(&self, phase: Phase<Err>) -> Option<SmallVec<[SharedObserver<Item, Err>; 1]>> {
    let mut inner = self.inner.lock();
    if !matches!(inner.phase, Phase::Active) {
      return None;
    }
    inner.phase = phase;
    Some(inner.subscribers.take_all())
  }
}

impl<Item: Clone, Err: Clone + Send> Observer<Item, Err> for Subject<Item, Err> {
  fn next(&self, value: Item) {
    let observers = {
      let inner = self.inner.lock();
      if !matches!(inner.phase, Phase::Active) {
        tracing::trace!("next published into a finished subject dropped");
        return;
      }
      inner.subscribers.snapshot()
    };
    if let Some((last, rest)) = observers.split_last() {
      for observer in rest {
        observer.next(value.clone());
      }
      last.next(value);
    }
  }

  fn error(&self, err: Err) {
    match self.finish(Phase::Errored(err.clone())) {
      Some(observers) => observers.iter().for_each(|o| o.error(err.clone())),
      None => tracing::trace!("error published into a finished subject dropped"),
    }
  }

  fn complete(&self) {
    match self.finish(Phase::Completed) {
      Some(observers) => observers.iter().for_each(|o| o.complete()),
      None => tracing::trace!("complete published into a finished subject dropped"),
    }
  }
}

impl<Item, Err> Observable<Item, Err> for Subject<Item, Err>
where
  Item: 'static,
  Err: Clone + Send + 'static,
{
  fn subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    let mut inner = self.inner.lock();
    match &inner.phase {
      Phase::Active => {
        let id = inner.subscribers.add(Arc::from(observer));
        BoxedSubscription::new(SubjectSubscription { inner: Arc::downgrade(&self.inner), id })
      }
      Phase::Errored(err) => {
        let err = err.clone();
        drop(inner);
        observer.error(err);
        BoxedSubscription::empty()
      }
      Phase::Completed => {
        drop(inner);
        observer.complete();
        BoxedSubscription::empty()
      }
      Phase::Disposed => BoxedSubscription::empty(),
    }
  }
}

impl<Item, Err: Send> Subscription for Subject<Item, Err> {
  fn unsubscribe(&self) {
    let dropped = {
      let mut inner = self.inner.lock();
      inner.phase = Phase::Disposed;
      inner.subscribers.take_all()
    };
    // Observers may own arbitrary resources; release them outside the lock.
    drop(dropped);
  }

  fn is_closed(&self) -> bool { !matches!(self.inner.lock().phase, Phase::Active) }
}

/// Removes one observer from its subject.
struct SubjectSubscription<Item, Err> {
  inner: Weak<Mutex<Inner<Item, Err>>>,
  id: usize,
}

impl<Item, Err: Send> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(&self) {
    if let Some(inner) = self.inner.upgrade() {
      let removed = inner.lock().subscribers.remove(self.id);
      drop(removed);
    }
  }

  fn is_closed(&self) -> bool {
    self
      .inner
      .upgrade()
      .is_none_or(|inner| !inner.lock().subscribers.items.iter().any(|(i, _)| *i == self.id))
  }
}

/// Subscribe-only view of a [`Subject`].
pub struct SubjectObservable<Item, Err>(Subject<Item, Err>);

impl<Item, Err> Clone for SubjectObservable<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item, Err> Observable<Item, Err> for SubjectObservable<Item, Err>
where
  Item: 'static,
  Err: Clone + Send + 'static,
{
  #[inline]
  fn subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    self.0.subscribe(observer)
  }
}
