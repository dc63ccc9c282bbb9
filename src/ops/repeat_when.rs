//! Repeat-with-trigger operator implementation
//!
//! `repeat_when` resubscribes to a source each time a user-built trigger
//! stream emits. The trigger stream is derived from a stream of
//! notifications that fires, with `()`, every time the source completes.
//!
//! ```text
//!   source ──1──2──|            ──1──2──|            ──1──2── …
//!                  │                    │
//!   notifications  ()                   ()
//!                  │ handler            │
//!   trigger        ──•──                ──•──
//!                    └─ resubscribe       └─ resubscribe
//! ```
//!
//! - Source values pass straight through.
//! - Source completion is never forwarded; it publishes a notification.
//! - A source error terminates the result; there is no resubscription.
//! - The trigger's `complete` / `error` terminate the result.
//!
//! Resubscription runs through a [`Trampoline`], so a source that completes
//! synchronously inside `subscribe` turns into a loop rather than a recursion,
//! and at most one subscription to the source is ever live. Notifications are
//! published from the same drain loop, so a trigger stream is never re-entered
//! by a cycle it started itself.
//!
//! # Examples
//!
//! Repeat a finite source three times by completing the trigger stream on
//! the third notification:
//!
//! ```rust
//! use std::sync::{
//!   Arc,
//!   atomic::{AtomicUsize, Ordering},
//! };
//!
//! use rxengine::prelude::*;
//!
//! let source = observable::from_iter::<_, RxError>([1, 2]);
//! let repeated = source.repeat_when(|notifications| {
//!   Ok::<_, RxError>(Some(observable::create(move |emitter: Emitter<(), RxError>| {
//!     let seen = AtomicUsize::new(0);
//!     notifications.subscribe_next(move |()| {
//!       if seen.fetch_add(1, Ordering::SeqCst) < 2 {
//!         emitter.next(());
//!       } else {
//!         emitter.complete();
//!       }
//!     })
//!   })))
//! });
//!
//! let (tx, rx) = std::sync::mpsc::channel();
//! repeated.subscribe_next(move |v| tx.send(v).unwrap());
//! assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1, 2, 1, 2, 1, 2]);
//! ```

use std::{
  error::Error,
  marker::PhantomData,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

use crate::{
  error::RxError,
  observable::Observable,
  observer::{BoxedObserver, Observer},
  sink::Sink,
  subject::{Subject, SubjectObservable},
  subscription::{
    BoxedSubscription, SerialSubscription, SingleAssignmentSubscription, Subscription,
  },
  trampoline::Trampoline,
};

/// Completion notifications handed to the `repeat_when` handler.
pub type Notifications<Err> = SubjectObservable<(), Err>;

/// Observable returned by
/// [`repeat_when`](crate::observable::ObservableExt::repeat_when).
///
/// `handler` runs once per subscription. It returns the trigger stream, or
/// `Ok(None)` / `Err(_)` to fail the subscription up front; both are reported
/// through `error` (as [`RxError::MissingTrigger`] and [`RxError::Handler`])
/// without the source ever being subscribed.
pub struct RepeatWhen<S, F, Signal = ()> {
  source: Arc<S>,
  handler: F,
  _signal: PhantomData<fn() -> Signal>,
}

impl<S, F, Signal> RepeatWhen<S, F, Signal> {
  pub(crate) fn new(source: S, handler: F) -> Self {
    Self { source: Arc::new(source), handler, _signal: PhantomData }
  }
}

impl<S, F: Clone, Signal> Clone for RepeatWhen<S, F, Signal> {
  fn clone(&self) -> Self {
    Self { source: self.source.clone(), handler: self.handler.clone(), _signal: PhantomData }
  }
}

impl<Item, Err, Signal, S, F, T, E> Observable<Item, Err> for RepeatWhen<S, F, Signal>
where
  Item: 'static,
  Err: From<RxError> + Clone + Send + 'static,
  Signal: 'static,
  S: Observable<Item, Err> + 'static,
  F: Fn(Notifications<Err>) -> Result<Option<T>, E> + Send + Sync,
  T: Observable<Signal, Err>,
  E: Into<Box<dyn Error + Send + Sync>>,
{
  fn subscribe(&self, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    let notifier = Subject::new();
    let trigger = match (self.handler)(notifier.observable()) {
      Ok(Some(trigger)) => trigger,
      Ok(None) => {
        tracing::debug!("repeat handler returned no trigger stream");
        observer.error(RxError::MissingTrigger.into());
        return BoxedSubscription::empty();
      }
      Err(err) => {
        let err = RxError::handler(err);
        tracing::debug!(%err, "repeat handler failed");
        observer.error(err.into());
        return BoxedSubscription::empty();
      }
    };

    let repeat = Arc::new(RepeatSink {
      sink: Sink::new(observer),
      source: self.source.clone(),
      upstream: Arc::new(SerialSubscription::new()),
      trampoline: Trampoline::new(),
      notifier: notifier.clone(),
      notify_pending: AtomicBool::new(false),
    });
    repeat.sink.add(repeat.upstream.clone());
    repeat.sink.add(notifier);

    let trigger_subscription = trigger.subscribe(Box::new(TriggerObserver(repeat.clone())));
    repeat.sink.add(trigger_subscription);

    repeat.resubscribe();
    BoxedSubscription::new(repeat)
  }
}

/// Per-subscription state shared by the source and trigger observers.
struct RepeatSink<S, Item, Err> {
  sink: Sink<Item, Err>,
  source: Arc<S>,
  /// The live source subscription, empty between cycles.
  upstream: Arc<SerialSubscription>,
  trampoline: Trampoline,
  notifier: Subject<(), Err>,
  /// Set by a source completion, consumed by the drain loop.
  notify_pending: AtomicBool,
}

impl<S, Item, Err> RepeatSink<S, Item, Err>
where
  S: Observable<Item, Err> + 'static,
  Item: 'static,
  Err: Clone + Send + 'static,
{
  fn resubscribe(self: &Arc<Self>) { self.drain() }

  /// Queue a completion notification behind whatever the drain loop is
  /// doing right now.
  fn notify(self: &Arc<Self>) {
    self.notify_pending.store(true, Ordering::Release);
    self.drain()
  }

  fn drain(self: &Arc<Self>) {
    self.trampoline.drain(|| {
      if self.sink.is_closed() {
        return;
      }
      if self.notify_pending.swap(false, Ordering::AcqRel) {
        self.notifier.next(());
        return;
      }
      // Claim the slot before subscribing so a source that completes
      // synchronously finds it occupied and can vacate it.
      let placeholder = Arc::new(SingleAssignmentSubscription::new());
      if !self.upstream.try_claim(placeholder.clone()) {
        tracing::trace!("resubscription ignored: source still active");
        return;
      }
      tracing::debug!("subscribing to repeat source");
      let subscription = self.source.subscribe(Box::new(SourceObserver(self.clone())));
      placeholder.set(subscription);
    });
  }
}

impl<S, Item, Err: Send> Subscription for RepeatSink<S, Item, Err>
where
  S: Send + Sync,
{
  #[inline]
  fn unsubscribe(&self) { self.sink.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.sink.is_closed() }
}

struct SourceObserver<S, Item, Err>(Arc<RepeatSink<S, Item, Err>>);

impl<S, Item, Err> Observer<Item, Err> for SourceObserver<S, Item, Err>
where
  S: Observable<Item, Err> + 'static,
  Item: 'static,
  Err: Clone + Send + 'static,
{
  fn next(&self, value: Item) { self.0.sink.forward_next(value) }

  fn error(&self, err: Err) { self.0.sink.forward_error(err) }

  fn complete(&self) {
    if self.0.upstream.clear() {
      self.0.notify();
    }
  }
}

struct TriggerObserver<S, Item, Err>(Arc<RepeatSink<S, Item, Err>>);

impl<S, Item, Err, Signal> Observer<Signal, Err> for TriggerObserver<S, Item, Err>
where
  S: Observable<Item, Err> + 'static,
  Item: 'static,
  Err: Clone + Send + 'static,
{
  fn next(&self, _: Signal) { self.0.resubscribe() }

  fn error(&self, err: Err) { self.0.sink.forward_error(err) }

  fn complete(&self) { self.0.sink.forward_complete() }
}
