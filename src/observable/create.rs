use std::{marker::PhantomData, sync::Arc};

use crate::{
  observable::Observable,
  observer::BoxedObserver,
  sink::Sink,
  subscription::{BoxedSubscription, Subscription},
};

/// Handle a [`create`] closure emits through. It can be moved to other
/// threads, and `is_closed` turns true once the run is over.
pub type Emitter<Item, Err> = Arc<Sink<Item, Err>>;

/// Creates an observable from a subscribe function.
///
/// The function runs once per subscription with a fresh [`Emitter`]. Whatever
/// subscription it returns is released when the run ends, whether by a
/// terminal event or by unsubscription.
///
/// ```
/// use rxengine::prelude::*;
///
/// let source = observable::create(|emitter: Emitter<i32, RxError>| {
///   emitter.next(1);
///   emitter.next(2);
///   emitter.complete();
/// });
///
/// let (tx, rx) = std::sync::mpsc::channel();
/// source.subscribe_next(move |v| tx.send(v).unwrap());
/// assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1, 2]);
/// ```
pub fn create<Item, Err, F, U>(subscribe: F) -> ObservableCreate<F, Item, Err>
where
  F: Fn(Emitter<Item, Err>) -> U,
  U: Subscription + 'static,
{
  ObservableCreate { subscribe, _marker: PhantomData }
}

pub struct ObservableCreate<F, Item, Err> {
  subscribe: F,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

impl<F: Clone, Item, Err> Clone for ObservableCreate<F, Item, Err> {
  fn clone(&self) -> Self { Self { subscribe: self.subscribe.clone(), _marker: PhantomData } }
}

impl<F, Item, Err, U> Observable<Item, Err> for ObservableCreate<F, Item, Err>
where
  F: Fn(Emitter<Item, Err>) -> U + Send + Sync,
  U: Subscription + 'static,
  Item: 'static,
  Err: Send + 'static,
{
  fn subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    let sink = Arc::new(Sink::new(observer));
    let teardown = (self.subscribe)(sink.clone());
    sink.add(teardown);
    BoxedSubscription::new(sink)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{
      Arc,
      atomic::{AtomicUsize, Ordering},
    },
    thread,
  };

  use parking_lot::Mutex;

  use crate::{prelude::*, subscription::test_util::CountingSubscription};

  #[rxengine_macro::test]
  fn teardown_runs_on_completion() {
    let teardown = CountingSubscription::default();
    let t = teardown.clone();
    let source = observable::create(move |emitter: Emitter<i32, RxError>| {
      emitter.next(1);
      emitter.complete();
      t.clone()
    });

    let seen = Arc::new(Mutex::new(vec![]));
    let s = seen.clone();
    let subscription = source.subscribe_next(move |v| s.lock().push(v));

    assert_eq!(*seen.lock(), vec![1]);
    assert_eq!(teardown.count(), 1);
    assert!(subscription.is_closed());
  }

  #[rxengine_macro::test]
  fn unsubscribe_stops_a_threaded_producer() {
    let produced = Arc::new(AtomicUsize::new(0));
    let p = produced.clone();
    let source = observable::create(move |emitter: Emitter<usize, RxError>| {
      let p = p.clone();
      thread::spawn(move || {
        let mut i = 0;
        while !emitter.is_closed() {
          emitter.next(i);
          i += 1;
          p.store(i, Ordering::SeqCst);
          thread::yield_now();
        }
      });
    });

    let (tx, rx) = std::sync::mpsc::channel();
    let subscription = source.subscribe_next(move |v| {
      let _ = tx.send(v);
    });
    assert_eq!(rx.recv().unwrap(), 0);
    subscription.unsubscribe();

    let after = produced.load(Ordering::SeqCst);
    thread::sleep(std::time::Duration::from_millis(10));
    // At most one value was in flight when the flag flipped.
    assert!(produced.load(Ordering::SeqCst) <= after + 1);
  }
}
