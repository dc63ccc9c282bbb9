use std::marker::PhantomData;

use parking_lot::Mutex;

use crate::{
  observable::Observable,
  observer::BoxedObserver,
  subscription::{BoxedSubscription, Subscription},
};

/// Creates an observable that produces no values and completes immediately.
///
/// ```
/// use rxengine::prelude::*;
///
/// let (tx, rx) = std::sync::mpsc::channel();
/// observable::empty::<i32, RxError>().subscribe_all(|_| {}, |_| {}, move || tx.send(()).unwrap());
/// assert!(rx.try_recv().is_ok());
/// ```
pub fn empty<Item, Err>() -> Empty<Item, Err> { Empty(PhantomData) }

pub struct Empty<Item, Err>(PhantomData<fn() -> (Item, Err)>);

impl<Item, Err> Clone for Empty<Item, Err> {
  fn clone(&self) -> Self { Self(PhantomData) }
}

impl<Item, Err> Observable<Item, Err> for Empty<Item, Err> {
  fn subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    observer.complete();
    BoxedSubscription::empty()
  }
}

/// Creates an observable that never emits anything, not even a terminal.
pub fn never<Item, Err>() -> Never<Item, Err> { Never(PhantomData) }

pub struct Never<Item, Err>(PhantomData<fn() -> (Item, Err)>);

impl<Item, Err> Clone for Never<Item, Err> {
  fn clone(&self) -> Self { Self(PhantomData) }
}

impl<Item: 'static, Err: 'static> Observable<Item, Err> for Never<Item, Err> {
  fn subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    // Unsubscribing drops the observer and whatever it captured.
    BoxedSubscription::new(NeverRun(Mutex::new(Some(observer))))
  }
}

struct NeverRun<Item, Err>(Mutex<Option<BoxedObserver<Item, Err>>>);

impl<Item, Err> Subscription for NeverRun<Item, Err> {
  fn unsubscribe(&self) { self.0.lock().take(); }

  fn is_closed(&self) -> bool { self.0.lock().is_none() }
}

/// Creates an observable that emits no items and terminates with `err`.
pub fn throw_err<Item, Err: Clone>(err: Err) -> ThrowErr<Item, Err> { ThrowErr(err, PhantomData) }

pub struct ThrowErr<Item, Err>(Err, PhantomData<fn() -> Item>);

impl<Item, Err: Clone> Clone for ThrowErr<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone(), PhantomData) }
}

impl<Item, Err> Observable<Item, Err> for ThrowErr<Item, Err>
where
  Err: Clone + Send + Sync,
{
  fn subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    observer.error(self.0.clone());
    BoxedSubscription::empty()
  }
}
