use super::{BoxedSubscription, Subscription};
use crate::slot::AtomicSlot;

/// A subscription slot whose content can be swapped repeatedly.
///
/// Replacing the content unsubscribes the previous occupant. Once the slot
/// itself is unsubscribed it stays empty and every later resource is
/// unsubscribed on arrival.
///
/// Besides plain replacement the slot supports the two steps resubscribing
/// operators are built on:
///
/// - [`try_claim`](Self::try_claim): occupy the slot only if it is empty, so
///   at most one upstream subscription can be live at a time.
/// - [`clear`](Self::clear): vacate the slot when the upstream finished,
///   reporting whether the slot is still alive.
#[derive(Default)]
pub struct SerialSubscription {
  slot: AtomicSlot<BoxedSubscription>,
}

impl SerialSubscription {
  pub const fn new() -> Self { Self { slot: AtomicSlot::new() } }

  /// Replace the current resource, unsubscribing the previous one.
  pub fn set(&self, subscription: impl Subscription + 'static) {
    match self.slot.replace(Some(BoxedSubscription::new(subscription))) {
      Ok(prev) => prev.iter().for_each(Subscription::unsubscribe),
      Err(rejected) => rejected.iter().for_each(Subscription::unsubscribe),
    }
  }

  /// Occupy the slot only if it is currently empty.
  ///
  /// Returns `false` when another resource is in place or the slot has been
  /// unsubscribed; the rejected resource is unsubscribed in that case.
  pub fn try_claim(&self, subscription: impl Subscription + 'static) -> bool {
    match self.slot.try_put(BoxedSubscription::new(subscription)) {
      Ok(()) => true,
      Err(rejected) => {
        rejected.unsubscribe();
        false
      }
    }
  }

  /// Empty the slot, unsubscribing the current resource.
  ///
  /// Returns `false` if the slot had already been unsubscribed.
  pub fn clear(&self) -> bool {
    match self.slot.replace(None) {
      Ok(prev) => {
        prev.iter().for_each(Subscription::unsubscribe);
        true
      }
      Err(_) => false,
    }
  }

  /// Whether a resource is currently in place.
  pub fn is_occupied(&self) -> bool { !self.slot.is_empty() && !self.slot.is_closed() }
}

impl Subscription for SerialSubscription {
  fn unsubscribe(&self) {
    if let Some(subscription) = self.slot.close() {
      subscription.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.slot.is_closed() }
}
