//! Error types
//!
//! Errors travel through [`Observer::error`](crate::observer::Observer::error)
//! as ordinary values. Operators are generic over their error type; the ones
//! that can fail on their own (like [`repeat_when`](crate::ops::repeat_when))
//! require `Err: From<RxError>` so their failures arrive through the same
//! channel. `RxError` itself satisfies that bound, so it is the natural error
//! type when nothing more specific is needed.
//!
//! ```
//! use rxengine::error::RxError;
//!
//! let err = RxError::upstream(std::io::Error::other("connection reset"));
//! assert_eq!(err.to_string(), "upstream error: connection reset");
//! ```

use std::{error::Error, sync::Arc};

/// Shareable error payload; `Arc` keeps `RxError` cheap to clone for
/// multicast.
pub type SharedError = Arc<dyn Error + Send + Sync>;

/// Root error type for the failures the engine itself can report.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RxError {
  /// A source or trigger stream terminated with an error.
  ///
  /// The engine never wraps errors that merely pass through it; this variant
  /// exists for producers that want a uniform error type.
  #[error("upstream error: {0}")]
  Upstream(SharedError),

  /// The `repeat_when` handler failed while building the trigger stream.
  #[error("repeat handler failed: {0}")]
  Handler(SharedError),

  /// The `repeat_when` handler returned no trigger stream.
  #[error("repeat handler returned no trigger stream")]
  MissingTrigger,
}

impl RxError {
  /// Wrap a producer error.
  pub fn upstream(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
    Self::Upstream(Arc::from(error.into()))
  }

  /// Wrap an error raised by a user-supplied handler.
  pub fn handler(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
    Self::Handler(Arc::from(error.into()))
  }
}
