use std::{iter, marker::PhantomData, sync::Arc};

use crate::{
  observable::Observable,
  observer::BoxedObserver,
  sink::Sink,
  subscription::{BoxedSubscription, Subscription},
};

/// Creates an observable that produces values from an iterator.
///
/// Every subscription walks its own clone of `iter`, then completes. Never
/// emits an error. The walk stops early once the run is closed.
///
/// ```
/// use rxengine::prelude::*;
///
/// let (tx, rx) = std::sync::mpsc::channel();
/// observable::from_iter::<_, RxError>(0..3).subscribe_next(move |v| tx.send(v).unwrap());
/// assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
/// ```
pub fn from_iter<I, Err>(iter: I) -> ObservableIter<I, Err>
where
  I: IntoIterator + Clone,
{
  ObservableIter { iter, _marker: PhantomData }
}

/// Creates an observable that emits one value and completes.
pub fn of<Item: Clone, Err>(value: Item) -> ObservableIter<iter::Once<Item>, Err> {
  from_iter(iter::once(value))
}

pub struct ObservableIter<I, Err> {
  iter: I,
  _marker: PhantomData<fn() -> Err>,
}

impl<I: Clone, Err> Clone for ObservableIter<I, Err> {
  fn clone(&self) -> Self { Self { iter: self.iter.clone(), _marker: PhantomData } }
}

impl<I, Err> Observable<I::Item, Err> for ObservableIter<I, Err>
where
  I: IntoIterator + Clone + Send + Sync,
  I::Item: 'static,
  Err: Send + 'static,
{
  fn subscribe(&self, observer: BoxedObserver<I::Item, Err>) -> BoxedSubscription {
    let sink = Arc::new(Sink::new(observer));
    for value in self.iter.clone() {
      if sink.is_closed() {
        return BoxedSubscription::new(sink);
      }
      sink.forward_next(value);
    }
    sink.forward_complete();
    BoxedSubscription::new(sink)
  }
}
