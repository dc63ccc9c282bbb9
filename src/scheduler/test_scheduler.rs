//! Test Scheduler for deterministic testing of time-based operators.
//!
//! Provides virtual time that only advances when explicitly instructed, so
//! delayed work like [`throw_err_on_after`](crate::observable::throw_err_on_after)
//! can be tested without sleeping.
//!
//! # Usage
//!
//! ```rust
//! use rxengine::prelude::*;
//!
//! TestScheduler::init();
//!
//! let failed = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
//! let flag = failed.clone();
//! observable::throw_err_on_after::<(), _, _>("late", Duration::from_millis(100), TestScheduler)
//!   .subscribe_all(|_| {}, move |_| flag.store(true, std::sync::atomic::Ordering::SeqCst), || {});
//!
//! TestScheduler::advance_by(Duration::from_millis(99));
//! assert!(!failed.load(std::sync::atomic::Ordering::SeqCst));
//! TestScheduler::advance_by(Duration::from_millis(1));
//! assert!(failed.load(std::sync::atomic::Ordering::SeqCst));
//! ```
//!
//! # Thread Safety
//!
//! TestScheduler uses thread-local storage, so each thread has its own
//! independent virtual time and task queue. This keeps tests isolated when
//! the harness runs them in parallel.

use std::{cell::RefCell, cmp::Ordering, collections::BinaryHeap};

use super::{Duration, Scheduler, Task, TaskHandle};
use crate::subscription::Subscription;

// ==================== Internal State ====================

#[derive(Default)]
struct TestSchedulerState {
  virtual_time: Duration,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
  initialized: bool,
}

struct ScheduledTask {
  scheduled_time: Duration,
  task_id: usize,
  task: Task,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool {
    self.scheduled_time == other.scheduled_time && self.task_id == other.task_id
  }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .scheduled_time
      .cmp(&self.scheduled_time)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

thread_local! {
  static TEST_SCHEDULER_STATE: RefCell<TestSchedulerState>
    = RefCell::new(TestSchedulerState::default());
}

// ==================== TestScheduler ====================

/// A virtual time scheduler for deterministic testing.
///
/// This is a zero-sized type that accesses thread-local state.
/// All instances in the same thread share the same virtual time and task queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestScheduler;

impl TestScheduler {
  /// Initialize or reset the test scheduler state.
  ///
  /// Must be called at the start of each test. Resets virtual time to zero
  /// and drops every queued task.
  pub fn init() {
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      state.virtual_time = Duration::ZERO;
      state.task_queue.clear();
      state.next_task_id = 0;
      state.initialized = true;
    });
  }

  fn ensure_initialized() {
    TEST_SCHEDULER_STATE.with(|state| {
      assert!(
        state.borrow().initialized,
        "TestScheduler::init() must be called before using the scheduler"
      );
    });
  }

  /// Get the current virtual time.
  ///
  /// # Panics
  ///
  /// Panics if `init()` has not been called first.
  pub fn now() -> Duration {
    Self::ensure_initialized();
    TEST_SCHEDULER_STATE.with(|state| state.borrow().virtual_time)
  }

  /// Number of queued tasks that have not been cancelled.
  pub fn pending_count() -> usize {
    Self::ensure_initialized();
    TEST_SCHEDULER_STATE.with(|state| {
      state
        .borrow()
        .task_queue
        .iter()
        .filter(|t| !t.handle.is_closed())
        .count()
    })
  }

  pub fn is_empty() -> bool { Self::pending_count() == 0 }

  fn execute_tasks_until(target_time: Option<Duration>) {
    loop {
      // The borrow must end before the task runs: tasks may schedule more.
      let task = TEST_SCHEDULER_STATE.with(|state| {
        let mut state = state.borrow_mut();
        let due = state
          .task_queue
          .peek()
          .is_some_and(|peek| target_time.is_none_or(|limit| peek.scheduled_time <= limit));
        if !due {
          return None;
        }
        let scheduled = state.task_queue.pop()?;
        state.virtual_time = scheduled.scheduled_time;
        Some(scheduled)
      });

      let Some(scheduled) = task else {
        break;
      };
      scheduled.task.run();
    }
  }

  /// Advance virtual time by `duration`, running every task that falls due.
  ///
  /// Tasks run in order of their scheduled time, FIFO for equal times.
  ///
  /// # Panics
  ///
  /// Panics if `init()` has not been called first.
  pub fn advance_by(duration: Duration) {
    Self::ensure_initialized();
    let target_time = TEST_SCHEDULER_STATE.with(|state| state.borrow().virtual_time + duration);

    Self::execute_tasks_until(Some(target_time));

    TEST_SCHEDULER_STATE.with(|state| {
      state.borrow_mut().virtual_time = target_time;
    });
  }

  /// Run every queued task, advancing virtual time to each task's slot.
  ///
  /// # Panics
  ///
  /// Panics if `init()` has not been called first.
  pub fn flush() {
    Self::ensure_initialized();
    Self::execute_tasks_until(None);
  }
}

impl Scheduler for TestScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    TestScheduler::ensure_initialized();
    let handle = task.handle();

    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      let scheduled_time = state.virtual_time + delay.unwrap_or(Duration::ZERO);
      let task_id = state.next_task_id;
      state.next_task_id += 1;
      state
        .task_queue
        .push(ScheduledTask { scheduled_time, task_id, task, handle: handle.clone() });
    });

    handle
  }
}
