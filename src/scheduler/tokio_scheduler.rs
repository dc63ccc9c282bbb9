use tokio::runtime::{Handle, TryCurrentError};

use super::{Duration, Scheduler, Task, TaskHandle};

/// Runs tasks on a tokio runtime; delays use `tokio::time::sleep`.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
  runtime: Handle,
}

impl TokioScheduler {
  /// Bind to the runtime the caller is running on.
  pub fn current() -> Result<Self, TryCurrentError> { Ok(Self { runtime: Handle::try_current()? }) }

  pub fn from_handle(runtime: Handle) -> Self { Self { runtime } }
}

impl Scheduler for TokioScheduler {
  fn schedule(&self, task: Task, delay: Option<Duration>) -> TaskHandle {
    let handle = task.handle();
    self.runtime.spawn(async move {
      if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
      }
      task.run();
    });
    handle
  }
}
