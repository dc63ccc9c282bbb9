use futures::executor::ThreadPool;

use super::{Duration, Scheduler, Task, TaskHandle};

/// Runs tasks on a `futures` thread pool.
///
/// Delayed tasks wait on a helper thread and enter the pool once due, so a
/// long delay never occupies a pool worker.
#[derive(Clone, Debug)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

impl ThreadPoolScheduler {
  /// A scheduler backed by a new pool with one worker per CPU.
  pub fn new() -> std::io::Result<Self> { Ok(Self { pool: ThreadPool::new()? }) }

  pub fn from_pool(pool: ThreadPool) -> Self { Self { pool } }
}

impl Scheduler for ThreadPoolScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = task.handle();
    match delay {
      None => self.pool.spawn_ok(async move {
        task.run();
      }),
      Some(delay) => {
        let pool = self.pool.clone();
        std::thread::spawn(move || {
          std::thread::sleep(delay);
          if task.handle().is_cancelled() {
            return;
          }
          pool.spawn_ok(async move {
            task.run();
          });
        });
      }
    }
    handle
  }
}
