use super::{BoxedSubscription, Subscription};
use crate::slot::AtomicSlot;

/// A subscription slot that accepts exactly one resource.
///
/// Typical use is bridging the gap between "I need a handle now" and "the
/// upstream subscription only exists once `subscribe` returns": hand out the
/// slot first, assign the real subscription later. If the slot was
/// unsubscribed in between, the late resource is disposed on arrival.
///
/// ```rust
/// use std::sync::Arc;
///
/// use rxengine::prelude::*;
///
/// let slot = Arc::new(SingleAssignmentSubscription::new());
/// slot.unsubscribe();
///
/// // Arrives too late: disposed immediately.
/// let late = Arc::new(SerialSubscription::new());
/// slot.set(late.clone());
/// assert!(late.is_closed());
/// ```
#[derive(Default)]
pub struct SingleAssignmentSubscription {
  slot: AtomicSlot<BoxedSubscription>,
}

impl SingleAssignmentSubscription {
  pub const fn new() -> Self { Self { slot: AtomicSlot::new() } }

  /// Assign the resource.
  ///
  /// If the slot already holds a resource, or was already unsubscribed, the
  /// new resource is unsubscribed immediately.
  pub fn set(&self, subscription: impl Subscription + 'static) {
    if let Err(rejected) = self.slot.try_put(BoxedSubscription::new(subscription)) {
      if !self.slot.is_closed() {
        tracing::warn!("single-assignment subscription assigned twice; disposing the newcomer");
      }
      rejected.unsubscribe();
    }
  }

  /// Whether a resource has been assigned (or the slot has been disposed).
  pub fn is_assigned(&self) -> bool { !self.slot.is_empty() }
}

impl Subscription for SingleAssignmentSubscription {
  fn unsubscribe(&self) {
    if let Some(subscription) = self.slot.close() {
      subscription.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.slot.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Barrier};

  use super::*;
  use crate::subscription::test_util::CountingSubscription;

  #[rxengine_macro::test]
  fn assign_then_unsubscribe() {
    let inner = CountingSubscription::default();
    let slot = SingleAssignmentSubscription::new();
    assert!(!slot.is_assigned());

    slot.set(inner.clone());
    assert!(slot.is_assigned());
    assert_eq!(inner.count(), 0);

    slot.unsubscribe();
    slot.unsubscribe();
    assert_eq!(inner.count(), 1);
    assert!(slot.is_closed());
  }

  #[rxengine_macro::test]
  fn second_assignment_is_disposed() {
    let (first, second) = (CountingSubscription::default(), CountingSubscription::default());
    let slot = SingleAssignmentSubscription::new();
    slot.set(first.clone());
    slot.set(second.clone());

    assert_eq!(first.count(), 0);
    assert_eq!(second.count(), 1);

    slot.unsubscribe();
    assert_eq!(first.count(), 1);
  }

  #[rxengine_macro::test]
  fn assignment_after_unsubscribe_is_disposed() {
    let inner = CountingSubscription::default();
    let slot = SingleAssignmentSubscription::new();
    slot.unsubscribe();
    slot.set(inner.clone());
    assert_eq!(inner.count(), 1);
  }

  #[rxengine_macro::test]
  fn racing_assignment_and_unsubscribe_disposes_exactly_once() {
    for _ in 0..200 {
      let inner = CountingSubscription::default();
      let slot = Arc::new(SingleAssignmentSubscription::new());
      let barrier = Arc::new(Barrier::new(2));

      let setter = {
        let (slot, barrier, inner) = (slot.clone(), barrier.clone(), inner.clone());
        std::thread::spawn(move || {
          barrier.wait();
          slot.set(inner);
        })
      };
      barrier.wait();
      slot.unsubscribe();
      setter.join().unwrap();

      assert_eq!(inner.count(), 1);
    }
  }
}
