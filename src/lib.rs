//! # rxengine: a thread-safe push-based reactive core
//!
//! Observables push `next`, `error` and `complete` events into observers;
//! subscriptions cancel them. Everything here is `Send + Sync` and may be
//! driven from any number of threads.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxengine::prelude::*;
//!
//! let trigger = Subject::<(), RxError>::new();
//! let t = trigger.clone();
//! let (tx, rx) = std::sync::mpsc::channel();
//!
//! let subscription = observable::from_iter::<_, RxError>([1, 2])
//!   .repeat_when(move |_| Ok::<_, RxError>(Some(t.observable())))
//!   .subscribe_next(move |v| {
//!     let _ = tx.send(v);
//!   });
//!
//! trigger.next(()); // one more round
//! trigger.complete(); // and done
//! assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1, 2, 1, 2]);
//! assert!(subscription.is_closed());
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A cold source of events |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Sink`] | The base operators build on: serialized forwarding, one terminal |
//! | [`Scheduler`] | Runs deferred work, now or after a delay |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): `ThreadPoolScheduler` on a `futures`
//!   thread pool
//! - **`tokio-scheduler`**: `TokioScheduler` on the ambient tokio runtime
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Sink`]: sink::Sink
//! [`Scheduler`]: scheduler::Scheduler

pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod scheduler;
pub mod serializer;
pub mod sink;
mod slot;
pub mod subject;
pub mod subscription;
pub mod trampoline;

// Re-export the prelude module
pub use prelude::*;

#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
