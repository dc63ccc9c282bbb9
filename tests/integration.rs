//! Integration tests for rxengine
//!
//! Exercises the operators end to end: virtual-time polling loops,
//! cross-thread terminal races and scheduler-driven repetition.

use std::{
  sync::{Arc, Barrier},
  thread,
};

use parking_lot::Mutex;
use rxengine::prelude::*;

#[derive(Debug, Clone, PartialEq)]
enum Event {
  Next(i32),
  Error,
  Complete,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Event>>>);

impl Recorder {
  fn events(&self) -> Vec<Event> { self.0.lock().clone() }

  fn values(&self) -> Vec<i32> {
    self
      .events()
      .into_iter()
      .filter_map(|e| if let Event::Next(v) = e { Some(v) } else { None })
      .collect()
  }

  fn terminals(&self) -> usize {
    self
      .events()
      .iter()
      .filter(|e| !matches!(e, Event::Next(_)))
      .count()
  }

  fn terminal_is_last(&self) -> bool {
    let events = self.events();
    match events.iter().position(|e| !matches!(e, Event::Next(_))) {
      Some(pos) => pos == events.len() - 1,
      None => true,
    }
  }
}

impl<Err> Observer<i32, Err> for Recorder {
  fn next(&self, value: i32) { self.0.lock().push(Event::Next(value)); }

  fn error(&self, _: Err) { self.0.lock().push(Event::Error); }

  fn complete(&self) { self.0.lock().push(Event::Complete); }
}

/// A trigger that re-arms a delayed task on `scheduler` for every
/// completion notification. Unsubscribing it cancels the pending poll.
fn poll_after<S>(
  notifications: Notifications<RxError>, delay: Duration, scheduler: S,
) -> BoxedObservable<(), RxError>
where
  S: Scheduler + Clone + 'static,
{
  observable::create(move |emitter: Emitter<(), RxError>| {
    let scheduler = scheduler.clone();
    let e = emitter.clone();
    notifications.subscribe_next(move |()| {
      let handle = scheduler.schedule(Task::new(e.clone(), |e| e.next(())), Some(delay));
      e.add(handle);
    })
  })
  .box_it()
}

#[rxengine_macro::test]
fn polling_loop_in_virtual_time() {
  TestScheduler::init();
  let recorder = Recorder::default();
  let subscription = observable::from_iter::<_, RxError>([1, 2])
    .repeat_when(|n| {
      Ok::<_, RxError>(Some(poll_after(n, Duration::from_millis(10), TestScheduler)))
    })
    .subscribe_with(recorder.clone());

  assert_eq!(recorder.values(), vec![1, 2]);
  assert_eq!(TestScheduler::pending_count(), 1);

  TestScheduler::advance_by(Duration::from_millis(9));
  assert_eq!(recorder.values(), vec![1, 2]);

  TestScheduler::advance_by(Duration::from_millis(1));
  assert_eq!(recorder.values(), vec![1, 2, 1, 2]);

  TestScheduler::advance_by(Duration::from_millis(20));
  assert_eq!(recorder.values().len(), 8);
  assert_eq!(recorder.terminals(), 0);

  subscription.unsubscribe();
  assert!(TestScheduler::is_empty());
  TestScheduler::flush();
  assert_eq!(recorder.values().len(), 8);
}

#[rxengine_macro::test]
fn scheduled_error_ends_a_repeating_stream() {
  TestScheduler::init();
  let recorder = Recorder::default();
  observable::from_iter::<_, RxError>([7])
    .repeat_when(|_| {
      Ok::<_, RxError>(Some(observable::throw_err_on_after::<(), _, _>(
        RxError::upstream("deadline"),
        Duration::from_millis(5),
        TestScheduler,
      )))
    })
    .subscribe_with(recorder.clone());

  assert_eq!(recorder.events(), vec![Event::Next(7)]);
  TestScheduler::advance_by(Duration::from_millis(5));
  assert_eq!(recorder.events(), vec![Event::Next(7), Event::Error]);
}

#[rxengine_macro::test]
fn source_values_racing_a_trigger_error() {
  for _ in 0..50 {
    let source = Subject::<i32, RxError>::new();
    let trigger = Subject::<(), RxError>::new();
    let recorder = Recorder::default();
    let t = trigger.clone();
    source
      .clone()
      .repeat_when(move |_| Ok::<_, RxError>(Some(t.observable())))
      .subscribe_with(recorder.clone());

    let barrier = Arc::new(Barrier::new(2));
    let producer = {
      let (source, barrier) = (source.clone(), barrier.clone());
      thread::spawn(move || {
        barrier.wait();
        for v in 0..200 {
          source.next(v);
        }
      })
    };
    let killer = {
      let (trigger, barrier) = (trigger.clone(), barrier.clone());
      thread::spawn(move || {
        barrier.wait();
        trigger.error(RxError::upstream("stop"));
      })
    };
    producer.join().unwrap();
    killer.join().unwrap();

    assert_eq!(recorder.terminals(), 1);
    assert!(recorder.terminal_is_last());
    assert_eq!(source.observer_count(), 0);
  }
}

#[rxengine_macro::test]
fn scheduled_error_racing_unsubscribe() {
  for _ in 0..100 {
    let recorder = Recorder::default();
    let subscription =
      observable::throw_err_on::<i32, _, _>(RxError::upstream("x"), NewThreadScheduler)
        .subscribe_with(recorder.clone());
    subscription.unsubscribe();
    thread::yield_now();
    assert!(recorder.terminals() <= 1);
    assert!(subscription.is_closed());
  }
}

#[cfg(feature = "futures-scheduler")]
#[rxengine_macro::test(shared)]
async fn repeats_on_a_thread_pool() {
  let pool = ThreadPoolScheduler::new().unwrap();
  let (tx, rx) = tokio::sync::oneshot::channel();
  let recorder = Recorder::default();
  let r = recorder.clone();

  observable::from_iter::<_, RxError>([1, 2, 3])
    .repeat_when(move |n| {
      let pool = pool.clone();
      Ok::<_, RxError>(Some(observable::create(move |emitter: Emitter<(), RxError>| {
        let pool = pool.clone();
        let rounds = std::sync::atomic::AtomicUsize::new(0);
        n.subscribe_next(move |()| {
          if rounds.fetch_add(1, std::sync::atomic::Ordering::SeqCst) < 2 {
            pool.schedule(Task::new(emitter.clone(), |e| e.next(())), None);
          } else {
            emitter.complete();
          }
        })
      })))
    })
    .subscribe_all(
      move |v| r.0.lock().push(Event::Next(v)),
      |_| {},
      move || {
        let _ = tx.send(());
      },
    );

  rx.await.unwrap();
  assert_eq!(recorder.values(), vec![1, 2, 3, 1, 2, 3, 1, 2, 3]);
}
