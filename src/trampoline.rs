//! Trampoline: flattens re-entrant work into a loop
//!
//! When a step of work may synchronously ask for another step (a source that
//! completes during `subscribe` and so requests the next resubscription, for
//! instance), calling the work directly would grow the stack once per step.
//! A [`Trampoline`] counts requests instead: the first caller becomes the
//! worker and loops until every request that arrived meanwhile has been
//! served; everybody else just bumps the counter and returns.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct Trampoline {
  wip: AtomicUsize,
}

impl Trampoline {
  pub const fn new() -> Self { Self { wip: AtomicUsize::new(0) } }

  /// Request one run of `work`.
  ///
  /// Returns immediately if another call is already draining; that call
  /// performs this request before it returns. `work` never runs on two
  /// threads at once and never nests.
  pub fn drain(&self, mut work: impl FnMut()) {
    if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
      return;
    }
    loop {
      work();
      if self.wip.fetch_sub(1, Ordering::AcqRel) == 1 {
        break;
      }
    }
  }

  /// Whether a worker is currently draining.
  pub fn is_draining(&self) -> bool { self.wip.load(Ordering::Acquire) != 0 }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::Cell,
    sync::{
      Arc, Barrier,
      atomic::{AtomicBool, AtomicUsize, Ordering},
    },
  };

  use super::*;

  #[rxengine_macro::test]
  fn reentrant_requests_run_as_a_loop() {
    let trampoline = Trampoline::new();
    let runs = Cell::new(0);
    let depth = Cell::new(0);
    let max_depth = Cell::new(0);

    fn step(t: &Trampoline, runs: &Cell<usize>, depth: &Cell<usize>, max: &Cell<usize>) {
      t.drain(|| {
        depth.set(depth.get() + 1);
        max.set(max.get().max(depth.get()));
        runs.set(runs.get() + 1);
        if runs.get() < 10_000 {
          step(t, runs, depth, max);
        }
        depth.set(depth.get() - 1);
      });
    }

    step(&trampoline, &runs, &depth, &max_depth);
    assert_eq!(runs.get(), 10_000);
    assert_eq!(max_depth.get(), 1);
    assert!(!trampoline.is_draining());
  }

  #[rxengine_macro::test]
  fn concurrent_requests_never_overlap_or_get_lost() {
    const THREADS: usize = 8;
    const REQUESTS: usize = 200;
    let trampoline = Arc::new(Trampoline::new());
    let inside = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let runs = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
      .map(|_| {
        let (trampoline, inside) = (trampoline.clone(), inside.clone());
        let (overlaps, runs, barrier) = (overlaps.clone(), runs.clone(), barrier.clone());
        std::thread::spawn(move || {
          barrier.wait();
          for _ in 0..REQUESTS {
            trampoline.drain(|| {
              if inside.swap(true, Ordering::SeqCst) {
                overlaps.fetch_add(1, Ordering::SeqCst);
              }
              runs.fetch_add(1, Ordering::SeqCst);
              inside.store(false, Ordering::SeqCst);
            });
          }
        })
      })
      .collect();
    for h in handles {
      h.join().unwrap();
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(runs.load(Ordering::SeqCst), THREADS * REQUESTS);
  }
}
