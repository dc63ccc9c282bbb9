use std::{
  ptr,
  sync::atomic::{AtomicPtr, Ordering},
};

use super::{BoxedSubscription, Subscription};
use crate::slot::closed_marker;

struct Node {
  subscription: BoxedSubscription,
  next: *mut Node,
}

/// A growable group of subscriptions released together.
///
/// Internally a lock-free stack: `add` detaches the stack with a
/// compare-and-swap, drops entries that have already closed on their own and
/// pushes the rest back along with the newcomer, so finished members do not
/// pile up in a long-lived group. `unsubscribe` detaches the whole stack with
/// one swap and releases every entry exactly once. Anything added after that
/// is released immediately.
pub struct CompositeSubscription {
  head: AtomicPtr<Node>,
}

// SAFETY: nodes are only reachable by the thread that detached them from
// `head`, and their payload is `Send + Sync`.
unsafe impl Send for CompositeSubscription {}
unsafe impl Sync for CompositeSubscription {}

impl CompositeSubscription {
  pub const fn new() -> Self { Self { head: AtomicPtr::new(ptr::null_mut()) } }

  /// Add a subscription to the group, or release it right away if the group
  /// has already been unsubscribed.
  pub fn add(&self, subscription: impl Subscription + 'static) {
    let node = Box::into_raw(Box::new(Node {
      subscription: BoxedSubscription::new(subscription),
      next: ptr::null_mut(),
    }));
    // SAFETY: `node` is private to this thread and `take_live` hands back a
    // stack this thread exclusively owns.
    unsafe {
      let mut live = self.take_live();
      self.push(node);
      while !live.is_null() {
        let next = (*live).next;
        self.push(live);
        live = next;
      }
    }
  }

  /// Detach the current stack and free the entries that are already closed.
  ///
  /// # Safety
  ///
  /// The returned stack belongs to the caller, who must push or free it.
  unsafe fn take_live(&self) -> *mut Node {
    let mut head = self.head.load(Ordering::Acquire);
    loop {
      if head.is_null() || head == closed_marker() {
        return ptr::null_mut();
      }
      let detached =
        self.head.compare_exchange_weak(head, ptr::null_mut(), Ordering::AcqRel, Ordering::Acquire);
      match detached {
        Ok(_) => break,
        Err(actual) => head = actual,
      }
    }
    let mut live = ptr::null_mut();
    while !head.is_null() {
      let node = head;
      // SAFETY: the exchange above detached the stack.
      unsafe {
        head = (*node).next;
        if (*node).subscription.is_closed() {
          drop(Box::from_raw(node));
        } else {
          (*node).next = live;
          live = node;
        }
      }
    }
    live
  }

  /// Push an owned node, or release it if the group is closed.
  ///
  /// # Safety
  ///
  /// `node` must be an unpublished pointer from `Box::into_raw`.
  unsafe fn push(&self, node: *mut Node) {
    let mut head = self.head.load(Ordering::Acquire);
    loop {
      if head == closed_marker() {
        // SAFETY: `node` was never published.
        let node = unsafe { Box::from_raw(node) };
        node.subscription.unsubscribe();
        return;
      }
      // SAFETY: `node` is still private to this thread.
      unsafe { (*node).next = head };
      match self.head.compare_exchange_weak(head, node, Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => return,
        Err(actual) => head = actual,
      }
    }
  }

  /// Whether no subscription is currently held. A concurrent `add` may
  /// briefly make a non-empty group look empty.
  pub fn is_empty(&self) -> bool {
    let head = self.head.load(Ordering::Acquire);
    head.is_null() || head == closed_marker()
  }

  /// Walk a detached stack, optionally unsubscribing each entry, and free it.
  ///
  /// # Safety
  ///
  /// `head` must be a stack the caller exclusively owns (or null).
  unsafe fn release(mut head: *mut Node, unsubscribe: bool) {
    while !head.is_null() {
      let node = unsafe { Box::from_raw(head) };
      head = node.next;
      if unsubscribe {
        node.subscription.unsubscribe();
      }
    }
  }
}

impl Default for CompositeSubscription {
  fn default() -> Self { Self::new() }
}

impl Subscription for CompositeSubscription {
  fn unsubscribe(&self) {
    let head = self.head.swap(closed_marker(), Ordering::AcqRel);
    if head != closed_marker() {
      // SAFETY: the swap detached the whole stack; nobody else can reach it.
      unsafe { Self::release(head, true) };
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.head.load(Ordering::Acquire) == closed_marker() }
}

impl Drop for CompositeSubscription {
  fn drop(&mut self) {
    let head = *self.head.get_mut();
    if head != closed_marker() {
      // SAFETY: `&mut self` gives exclusive access to the stack.
      unsafe { Self::release(head, false) };
    }
  }
}
