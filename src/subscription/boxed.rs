use super::Subscription;

/// A type-erased, thread-safe subscription.
///
/// Subscriptions are control handles, not data views: they are stored, moved
/// across threads and called at an arbitrary later time, so the boxed form is
/// `'static`.
///
/// # Examples
///
/// ```rust
/// use rxengine::prelude::*;
///
/// let subs: Vec<BoxedSubscription> = vec![BoxedSubscription::new(()), BoxedSubscription::new(())];
/// for sub in &subs {
///   sub.unsubscribe();
/// }
/// ```
pub struct BoxedSubscription(Box<dyn Subscription>);

impl BoxedSubscription {
  /// Create a new boxed subscription from any subscription type.
  #[inline]
  pub fn new(subscription: impl Subscription + 'static) -> Self { Self(Box::new(subscription)) }

  /// A subscription with nothing behind it, returned by failed or already
  /// finished subscriptions.
  #[inline]
  pub fn empty() -> Self { Self::new(()) }
}

impl Subscription for BoxedSubscription {
  #[inline]
  fn unsubscribe(&self) { self.0.unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.is_closed() }
}

impl std::fmt::Debug for BoxedSubscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BoxedSubscription")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}
