//! Lock-free owned-pointer slot
//!
//! `AtomicSlot<T>` is the one primitive every cancellation guarantee in this
//! crate is built on. It holds at most one boxed `T` and moves through three
//! states:
//!
//! | state    | pointer value         |
//! |----------|-----------------------|
//! | empty    | null                  |
//! | occupied | a leaked `Box<T>`     |
//! | closed   | [`closed_marker`]     |
//!
//! Ownership of a stored value is only ever transferred by a single atomic
//! `swap` or `compare_exchange`, so whichever thread receives the old pointer
//! owns it exclusively. The slot never dereferences a pointer it does not own,
//! which rules out use-after-free and makes ABA reuse harmless.

use std::{
  marker::PhantomData,
  ptr,
  sync::atomic::{AtomicPtr, Ordering},
};

static CLOSED: u8 = 0;

/// Sentinel pointer for the closed state.
///
/// Points at a private static, so it can never collide with a heap
/// allocation. It is only ever compared, never dereferenced.
#[inline]
pub(crate) fn closed_marker<T>() -> *mut T { ptr::addr_of!(CLOSED) as *mut T }

pub(crate) struct AtomicSlot<T> {
  ptr: AtomicPtr<T>,
  _owns: PhantomData<Box<T>>,
}

// SAFETY: the slot hands out values by move only, never by shared reference,
// so it is as thread-safe as a `Mutex<Option<T>>`.
unsafe impl<T: Send> Send for AtomicSlot<T> {}
unsafe impl<T: Send> Sync for AtomicSlot<T> {}

impl<T> AtomicSlot<T> {
  pub(crate) const fn new() -> Self {
    Self { ptr: AtomicPtr::new(ptr::null_mut()), _owns: PhantomData }
  }

  /// Store `value` if the slot is empty. First writer wins; on failure the
  /// value is handed back untouched.
  pub(crate) fn try_put(&self, value: T) -> Result<(), T> {
    let new = Box::into_raw(Box::new(value));
    match self.ptr.compare_exchange(ptr::null_mut(), new, Ordering::AcqRel, Ordering::Acquire) {
      Ok(_) => Ok(()),
      // SAFETY: `new` was never published, we still own it.
      Err(_) => Err(*unsafe { Box::from_raw(new) }),
    }
  }

  /// Replace the current content unless the slot is closed.
  ///
  /// Returns the previous content on success, or hands `value` back if the
  /// slot was closed.
  pub(crate) fn replace(&self, value: Option<T>) -> Result<Option<T>, Option<T>> {
    let new = value.map_or(ptr::null_mut(), |v| Box::into_raw(Box::new(v)));
    let mut current = self.ptr.load(Ordering::Acquire);
    loop {
      if current == closed_marker() {
        // SAFETY: `new` was never published.
        return Err(unsafe { Self::reclaim(new) });
      }
      match self.ptr.compare_exchange_weak(current, new, Ordering::AcqRel, Ordering::Acquire) {
        // SAFETY: the successful exchange transferred ownership of `prev`.
        Ok(prev) => return Ok(unsafe { Self::reclaim(prev) }),
        Err(actual) => current = actual,
      }
    }
  }

  /// Close the slot for good and return whatever it held.
  pub(crate) fn close(&self) -> Option<T> {
    let prev = self.ptr.swap(closed_marker(), Ordering::AcqRel);
    // SAFETY: the swap transferred ownership of `prev`.
    unsafe { Self::reclaim(prev) }
  }

  #[inline]
  pub(crate) fn is_closed(&self) -> bool { self.ptr.load(Ordering::Acquire) == closed_marker() }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool { self.ptr.load(Ordering::Acquire).is_null() }

  /// # Safety
  ///
  /// `ptr` must be null, the closed marker, or a pointer produced by
  /// `Box::into_raw` that the caller exclusively owns.
  unsafe fn reclaim(ptr: *mut T) -> Option<T> {
    if ptr.is_null() || ptr == closed_marker() {
      None
    } else {
      Some(*unsafe { Box::from_raw(ptr) })
    }
  }
}

impl<T> Default for AtomicSlot<T> {
  fn default() -> Self { Self::new() }
}

impl<T> Drop for AtomicSlot<T> {
  fn drop(&mut self) {
    let ptr = *self.ptr.get_mut();
    // SAFETY: `&mut self` means no other thread can reach the slot.
    drop(unsafe { Self::reclaim(ptr) });
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc, Barrier,
    atomic::{AtomicUsize, Ordering},
  };

  use super::*;

  struct CountDrop(Arc<AtomicUsize>);

  impl Drop for CountDrop {
    fn drop(&mut self) { self.0.fetch_add(1, Ordering::SeqCst); }
  }

  #[rxengine_macro::test]
  fn first_writer_wins() {
    let slot = AtomicSlot::new();
    assert!(slot.is_empty());
    assert!(slot.try_put(1).is_ok());
    assert_eq!(slot.try_put(2), Err(2));
    assert_eq!(slot.close(), Some(1));
    assert!(slot.is_closed());
    assert_eq!(slot.try_put(3), Err(3));
  }

  #[rxengine_macro::test]
  fn replace_returns_previous_until_closed() {
    let slot = AtomicSlot::new();
    assert_eq!(slot.replace(Some("a")), Ok(None));
    assert_eq!(slot.replace(Some("b")), Ok(Some("a")));
    assert_eq!(slot.replace(None), Ok(Some("b")));
    assert!(slot.is_empty());
    assert_eq!(slot.close(), None);
    assert_eq!(slot.replace(Some("c")), Err(Some("c")));
    assert_eq!(slot.close(), None);
  }

  #[rxengine_macro::test]
  fn drop_releases_content() {
    let drops = Arc::new(AtomicUsize::new(0));
    {
      let slot = AtomicSlot::new();
      assert!(slot.try_put(CountDrop(drops.clone())).is_ok());
    }
    assert_eq!(drops.load(Ordering::SeqCst), 1);
  }

  #[rxengine_macro::test]
  fn racing_puts_and_close_release_every_value_once() {
    const THREADS: usize = 8;
    for _ in 0..50 {
      let drops = Arc::new(AtomicUsize::new(0));
      let slot = Arc::new(AtomicSlot::new());
      let barrier = Arc::new(Barrier::new(THREADS + 1));
      let handles: Vec<_> = (0..THREADS)
        .map(|_| {
          let (slot, barrier, drops) = (slot.clone(), barrier.clone(), drops.clone());
          std::thread::spawn(move || {
            barrier.wait();
            let _ = slot.try_put(CountDrop(drops));
          })
        })
        .collect();
      barrier.wait();
      drop(slot.close());
      for h in handles {
        h.join().unwrap();
      }
      drop(slot);
      assert_eq!(drops.load(Ordering::SeqCst), THREADS);
    }
  }
}
