//! Half-serializer
//!
//! Lets several upstream threads call into one observer without breaking its
//! contract, using nothing but a work counter and a single terminal slot.
//!
//! The "half" is deliberate: only terminal events may race. Values are always
//! produced by the one upstream that currently drives the observer, so a
//! value that finds the serializer busy can only be a late straggler and is
//! dropped rather than queued. Terminal events never block either: whoever
//! loses the race for the observer leaves its terminal in the slot and the
//! thread that is inside the observer delivers it on the way out.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{observer::Observer, slot::AtomicSlot};

enum Terminal<Err> {
  Error(Err),
  Complete,
}

/// Per-subscription serializer state.
pub struct HalfSerializer<Err> {
  wip: AtomicUsize,
  terminal: AtomicSlot<Terminal<Err>>,
}

impl<Err> HalfSerializer<Err> {
  pub const fn new() -> Self { Self { wip: AtomicUsize::new(0), terminal: AtomicSlot::new() } }

  /// Forward a value to `target` if nobody else is inside it.
  pub fn next<Item, O>(&self, target: &O, value: Item)
  where
    O: Observer<Item, Err> + ?Sized,
  {
    if self
      .wip
      .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      tracing::trace!("value dropped: observer busy or already terminated");
      return;
    }
    target.next(value);
    if self.wip.fetch_sub(1, Ordering::AcqRel) != 1 {
      // A terminal event was parked while the value was in flight.
      self.deliver_terminal(target);
    }
  }

  /// Forward an error. Only the first terminal event ever reaches `target`.
  pub fn error<Item, O>(&self, target: &O, err: Err)
  where
    O: Observer<Item, Err> + ?Sized,
  {
    self.terminate(target, Terminal::Error(err));
  }

  /// Forward completion. Only the first terminal event ever reaches `target`.
  pub fn complete<Item, O>(&self, target: &O)
  where
    O: Observer<Item, Err> + ?Sized,
  {
    self.terminate(target, Terminal::Complete);
  }

  /// Whether a terminal event has been committed (delivered or parked).
  pub fn is_terminated(&self) -> bool { !self.terminal.is_empty() }

  fn terminate<Item, O>(&self, target: &O, terminal: Terminal<Err>)
  where
    O: Observer<Item, Err> + ?Sized,
  {
    if self.terminal.try_put(terminal).is_err() {
      tracing::trace!("terminal event dropped: another one was committed first");
      return;
    }
    if self.wip.fetch_add(1, Ordering::AcqRel) == 0 {
      self.deliver_terminal(target);
    }
  }

  fn deliver_terminal<Item, O>(&self, target: &O)
  where
    O: Observer<Item, Err> + ?Sized,
  {
    // Closing the slot hands the terminal to exactly one caller and rejects
    // every later one.
    match self.terminal.close() {
      Some(Terminal::Error(err)) => target.error(err),
      Some(Terminal::Complete) => target.complete(),
      None => {}
    }
  }
}

impl<Err> Default for HalfSerializer<Err> {
  fn default() -> Self { Self::new() }
}
