//! Lock Module
//!
//! The mutual-exclusion half of the subsystem: sentinel stores (presence of
//! a token encodes "held"), and the polling [`Lock`] built on top. Usable on
//! its own for shared-resource access control, independent of the memoizer.

mod mutex;
mod sentinel;

// Re-export public types
pub use mutex::{Lock, LockGuard};
pub use sentinel::{global_sentinel_store, LocalSentinelStore, LockToken, SentinelStore};
