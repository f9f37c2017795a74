//! Memoizer Module
//!
//! The composition root: [`Memoized`] ties a key codec, a cache store, and
//! a per-key lock into cache-then-compute with stampede suppression, and
//! [`Invalidator`] removes what memoized calls wrote.

mod invalidate;
mod memoized;

// Re-export public types
pub use invalidate::Invalidator;
pub use memoized::{MemoBuilder, Memoized};
