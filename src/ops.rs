//! Operators
//!
//! Operators are reached through
//! [`ObservableExt`](crate::observable::ObservableExt); this module holds
//! their implementations.

pub mod repeat_when;
