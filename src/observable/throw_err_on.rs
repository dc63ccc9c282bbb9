use std::{marker::PhantomData, sync::Arc};

use crate::{
  observable::Observable,
  observer::BoxedObserver,
  scheduler::{Duration, Scheduler, Task},
  sink::Sink,
  subscription::BoxedSubscription,
};

/// Creates an observable that terminates with `err` from a task on
/// `scheduler`.
///
/// Each subscription schedules exactly one task. Unsubscribing before the
/// task has started guarantees the error is never delivered.
pub fn throw_err_on<Item, Err, S>(err: Err, scheduler: S) -> ThrowErrOn<Item, Err, S>
where
  S: Scheduler,
{
  ThrowErrOn { err, scheduler, delay: None, _marker: PhantomData }
}

/// Like [`throw_err_on`], with the task scheduled `delay` from now.
pub fn throw_err_on_after<Item, Err, S>(
  err: Err, delay: Duration, scheduler: S,
) -> ThrowErrOn<Item, Err, S>
where
  S: Scheduler,
{
  ThrowErrOn { err, scheduler, delay: Some(delay), _marker: PhantomData }
}

#[derive(Clone)]
pub struct ThrowErrOn<Item, Err, S> {
  err: Err,
  scheduler: S,
  delay: Option<Duration>,
  _marker: PhantomData<fn() -> Item>,
}

impl<Item, Err, S> Observable<Item, Err> for ThrowErrOn<Item, Err, S>
where
  Item: 'static,
  Err: Clone + Send + Sync + 'static,
  S: Scheduler,
{
  fn subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    let sink = Arc::new(Sink::new(observer));
    let task = Task::new((sink.clone(), self.err.clone()), |(sink, err)| {
      tracing::debug!("scheduled error delivered");
      sink.forward_error(err);
    });
    let handle = self.scheduler.schedule(task, self.delay);
    sink.add(handle);
    BoxedSubscription::new(sink)
  }
}
