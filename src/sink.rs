//! Sink: the base every producer and operator builds on
//!
//! A [`Sink`] sits between an operator and its downstream observer. It owns
//! the observer, the upstream subscriptions the operator opened, and a
//! tri-state termination flag:
//!
//! ```text
//!   Active ──terminal forwarded──▶ Terminating ──observer returned──▶ Terminated
//!      └──────────────────────── unsubscribe ─────────────────────────────┘
//! ```
//!
//! Every `forward_*` call goes through a [`HalfSerializer`], so operators can
//! call into the sink from several upstream threads. Exactly one terminal
//! event ever reaches the observer, and once it has, every owned upstream
//! subscription is released.
//!
//! An operator typically wraps its sink in an `Arc`, hands clones of that
//! `Arc` to the observers it subscribes upstream, registers the resulting
//! subscriptions with [`Sink::add`], and returns the `Arc` itself as the
//! subscription handle.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::{
  observer::{BoxedObserver, Observer},
  serializer::HalfSerializer,
  subscription::{CompositeSubscription, Subscription},
};

const ACTIVE: u8 = 0;
const TERMINATING: u8 = 1;
const TERMINATED: u8 = 2;

pub struct Sink<Item, Err> {
  observer: BoxedObserver<Item, Err>,
  serializer: HalfSerializer<Err>,
  state: AtomicU8,
  resources: CompositeSubscription,
}

impl<Item, Err> Sink<Item, Err> {
  pub fn new(observer: BoxedObserver<Item, Err>) -> Self {
    Self {
      observer,
      serializer: HalfSerializer::new(),
      state: AtomicU8::new(ACTIVE),
      resources: CompositeSubscription::new(),
    }
  }

  /// Take ownership of an upstream subscription. If the sink is already
  /// terminated the subscription is released immediately.
  pub fn add(&self, resource: impl Subscription + 'static) { self.resources.add(resource) }

  pub fn forward_next(&self, value: Item)
  where
    Err: Send,
  {
    if self.state.load(Ordering::Acquire) != ACTIVE {
      tracing::trace!("late next dropped");
      return;
    }
    self.serializer.next(&Downstream(self), value);
  }

  pub fn forward_error(&self, err: Err)
  where
    Err: Send,
  {
    if self.state.load(Ordering::Acquire) == TERMINATED {
      tracing::trace!("late error dropped");
      return;
    }
    self.serializer.error(&Downstream(self), err);
  }

  pub fn forward_complete(&self)
  where
    Err: Send,
  {
    if self.state.load(Ordering::Acquire) == TERMINATED {
      tracing::trace!("late complete dropped");
      return;
    }
    self.serializer.complete(&Downstream(self));
  }

  /// Release every owned resource. Idempotent.
  fn dispose(&self) {
    if self.state.swap(TERMINATED, Ordering::AcqRel) != TERMINATED {
      self.resources.unsubscribe();
    }
  }
}

impl<Item, Err: Send> Subscription for Sink<Item, Err> {
  #[inline]
  fn unsubscribe(&self) { self.dispose() }

  #[inline]
  fn is_closed(&self) -> bool { self.state.load(Ordering::Acquire) != ACTIVE }
}

/// A sink is also an observer, so a producer can hand `Arc<Sink>` to code
/// that only knows how to talk to observers and still get the safety net.
impl<Item, Err: Send> Observer<Item, Err> for Sink<Item, Err> {
  #[inline]
  fn next(&self, value: Item) { self.forward_next(value) }

  #[inline]
  fn error(&self, err: Err) { self.forward_error(err) }

  #[inline]
  fn complete(&self) { self.forward_complete() }
}

/// What the serializer talks to: the real observer plus the state
/// transitions around terminal delivery.
struct Downstream<'a, Item, Err>(&'a Sink<Item, Err>);

impl<Item, Err: Send> Downstream<'_, Item, Err> {
  fn begin_terminal(&self) -> bool {
    self
      .0
      .state
      .compare_exchange(ACTIVE, TERMINATING, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }
}

impl<Item, Err: Send> Observer<Item, Err> for Downstream<'_, Item, Err> {
  fn next(&self, value: Item) {
    if self.0.state.load(Ordering::Acquire) == ACTIVE {
      self.0.observer.next(value);
    }
  }

  fn error(&self, err: Err) {
    if self.begin_terminal() {
      self.0.observer.error(err);
      self.0.dispose();
    }
  }

  fn complete(&self) {
    if self.begin_terminal() {
      self.0.observer.complete();
      self.0.dispose();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Barrier};

  use parking_lot::Mutex;

  use super::*;
  use crate::subscription::test_util::CountingSubscription;

  #[derive(Debug, PartialEq, Clone)]
  enum Event {
    Next(i32),
    Error(&'static str),
    Complete,
  }

  #[derive(Clone, Default)]
  struct Recorder(Arc<Mutex<Vec<Event>>>);

  impl Recorder {
    fn events(&self) -> Vec<Event> { self.0.lock().clone() }

    fn terminals(&self) -> usize {
      self
        .events()
        .iter()
        .filter(|e| !matches!(e, Event::Next(_)))
        .count()
    }
  }

  impl Observer<i32, &'static str> for Recorder {
    fn next(&self, value: i32) { self.0.lock().push(Event::Next(value)); }

    fn error(&self, err: &'static str) { self.0.lock().push(Event::Error(err)); }

    fn complete(&self) { self.0.lock().push(Event::Complete); }
  }

  fn sink(recorder: &Recorder) -> Sink<i32, &'static str> { Sink::new(Box::new(recorder.clone())) }

  #[rxengine_macro::test]
  fn terminal_releases_resources_once() {
    let recorder = Recorder::default();
    let upstream = CountingSubscription::default();
    let sink = sink(&recorder);
    sink.add(upstream.clone());

    sink.forward_next(1);
    sink.forward_complete();
    sink.forward_error("late");
    sink.forward_next(2);
    sink.unsubscribe();

    assert_eq!(recorder.events(), vec![Event::Next(1), Event::Complete]);
    assert_eq!(upstream.count(), 1);
    assert!(sink.is_closed());
  }

  #[rxengine_macro::test]
  fn unsubscribe_silences_the_observer() {
    let recorder = Recorder::default();
    let upstream = CountingSubscription::default();
    let sink = sink(&recorder);
    sink.add(upstream.clone());

    sink.unsubscribe();
    sink.unsubscribe();
    sink.forward_next(1);
    sink.forward_error("ignored");

    assert!(recorder.events().is_empty());
    assert_eq!(upstream.count(), 1);
  }

  #[rxengine_macro::test]
  fn resources_added_after_termination_are_released() {
    let recorder = Recorder::default();
    let sink = sink(&recorder);
    sink.forward_error("boom");

    let late = CountingSubscription::default();
    sink.add(late.clone());
    assert_eq!(late.count(), 1);
    assert_eq!(recorder.events(), vec![Event::Error("boom")]);
  }

  #[rxengine_macro::test]
  fn concurrent_terminals_yield_one_downstream_terminal() {
    const THREADS: usize = 8;
    for _ in 0..100 {
      let recorder = Recorder::default();
      let upstream = CountingSubscription::default();
      let sink = Arc::new(sink(&recorder));
      sink.add(upstream.clone());
      let barrier = Arc::new(Barrier::new(THREADS));

      let handles: Vec<_> = (0..THREADS)
        .map(|i| {
          let (sink, barrier) = (sink.clone(), barrier.clone());
          std::thread::spawn(move || {
            barrier.wait();
            if i == 0 {
              for v in 0..50 {
                sink.forward_next(v);
              }
            }
            match i % 3 {
              0 => sink.forward_complete(),
              1 => sink.forward_error("boom"),
              _ => sink.unsubscribe(),
            }
          })
        })
        .collect();
      for h in handles {
        h.join().unwrap();
      }

      assert!(recorder.terminals() <= 1);
      let events = recorder.events();
      if let Some(pos) = events.iter().position(|e| !matches!(e, Event::Next(_))) {
        assert_eq!(pos, events.len() - 1, "nothing may follow a terminal event");
      }
      assert_eq!(upstream.count(), 1);
    }
  }
}
