use std::thread;

use super::{Duration, Scheduler, Task, TaskHandle};

/// Spawns a new thread for each unit of work.
#[derive(Clone, Copy, Debug, Default)]
pub struct NewThreadScheduler;

impl Scheduler for NewThreadScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = task.handle();
    thread::spawn(move || {
      if let Some(delay) = delay {
        // Skip the sleep entirely if cancelled while queued.
        if task.handle().is_cancelled() {
          return;
        }
        thread::sleep(delay);
      }
      task.run();
    });
    handle
  }
}
