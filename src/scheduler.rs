//! Schedulers: where and when deferred work runs
//!
//! A [`Scheduler`] accepts a [`Task`] plus an optional delay and returns a
//! [`TaskHandle`]. The handle is a [`Subscription`]: unsubscribing it before
//! the task starts guarantees the task never runs.
//!
//! | Scheduler                 | Runs the task                                   |
//! |---------------------------|-------------------------------------------------|
//! | [`ImmediateScheduler`]    | on the calling thread, before `schedule` returns |
//! | [`NewThreadScheduler`]    | on a freshly spawned thread                     |
//! | [`ThreadPoolScheduler`]   | on a `futures` thread pool (`futures-scheduler`) |
//! | [`TokioScheduler`]        | on a tokio runtime (`tokio-scheduler`)          |
//! | [`TestScheduler`]         | when virtual time is advanced                   |

use std::sync::{
  Arc,
  atomic::{AtomicU8, Ordering},
};
pub use std::time::Duration;

use crate::subscription::Subscription;

mod test_scheduler;
mod thread_scheduler;
#[cfg(feature = "futures-scheduler")]
mod thread_pool_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use test_scheduler::TestScheduler;
pub use thread_scheduler::NewThreadScheduler;
#[cfg(feature = "futures-scheduler")]
pub use thread_pool_scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// Orders tasks and runs them, now or after a delay.
pub trait Scheduler: Send + Sync {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  #[inline]
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    (**self).schedule(task, delay)
  }
}

// ==================== Task ====================

/// A unit of deferred work: some state and the function that consumes it.
pub struct Task {
  action: Box<dyn FnOnce() + Send>,
  handle: TaskHandle,
}

impl Task {
  pub fn new<S>(state: S, handler: impl FnOnce(S) + Send + 'static) -> Self
  where
    S: Send + 'static,
  {
    Self { action: Box::new(move || handler(state)), handle: TaskHandle::new() }
  }

  /// The handle that controls this task.
  pub fn handle(&self) -> TaskHandle { self.handle.clone() }

  /// Run the task unless it was cancelled first. Returns whether it ran.
  pub fn run(self) -> bool {
    if !self.handle.begin() {
      tracing::trace!("cancelled task skipped");
      return false;
    }
    (self.action)();
    self.handle.finish();
    true
  }
}

// ==================== TaskHandle ====================

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const FINISHED: u8 = 2;
const CANCELLED: u8 = 3;

/// Shared handle to a scheduled [`Task`].
///
/// Cancellation only wins while the task is still pending; a task that has
/// started runs to the end.
#[derive(Clone)]
pub struct TaskHandle(Arc<AtomicU8>);

impl TaskHandle {
  fn new() -> Self { Self(Arc::new(AtomicU8::new(PENDING))) }

  fn begin(&self) -> bool {
    self
      .0
      .compare_exchange(PENDING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }

  fn finish(&self) { self.0.store(FINISHED, Ordering::Release); }

  pub fn is_finished(&self) -> bool { self.0.load(Ordering::Acquire) == FINISHED }

  pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Acquire) == CANCELLED }
}

impl Subscription for TaskHandle {
  fn unsubscribe(&self) {
    if self
      .0
      .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
    {
      tracing::trace!("pending task cancelled");
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.load(Ordering::Acquire) != PENDING }
}

impl std::fmt::Debug for TaskHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = match self.0.load(Ordering::Acquire) {
      PENDING => "pending",
      RUNNING => "running",
      FINISHED => "finished",
      _ => "cancelled",
    };
    f.debug_tuple("TaskHandle").field(&state).finish()
  }
}

// ==================== ImmediateScheduler ====================

/// Runs every task on the calling thread. A delay blocks the caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    if let Some(delay) = delay {
      std::thread::sleep(delay);
    }
    let handle = task.handle();
    task.run();
    handle
  }
}
