//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Error type
pub use crate::error::RxError;
// Observable trait, extension methods and factories
pub use crate::observable::{
  self, BoxedObservable, Emitter, Observable, ObservableExt,
};
// Observer trait
pub use crate::observer::{BoxedObserver, FnObserver, Observer};
// Operators
pub use crate::ops::repeat_when::{Notifications, RepeatWhen};
// Scheduler core types
pub use crate::scheduler::{
  Duration, ImmediateScheduler, NewThreadScheduler, Scheduler, Task, TaskHandle, TestScheduler,
};
#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
// Building blocks for custom operators
pub use crate::sink::Sink;
pub use crate::subject::{Subject, SubjectObservable};
// Subscription
pub use crate::subscription::*;
