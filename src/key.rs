//! Cache key derivation
//!
//! Maps a computation's registered name plus its argument values onto a
//! deterministic, collision-resistant key. Equal inputs always produce the
//! same key, and the encoding is stable across process restarts, so keys
//! remain valid against a shared remote store.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::KeyError;

// == Cache Key ==
/// Opaque key addressing one cached entry (and its lock sentinel).
///
/// Produced by [`KeyCodec::encode`]; treat the contents as opaque apart from
/// the leading name segment, which exists only for log readability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wraps an already-derived key string.
    ///
    /// Useful for ad-hoc lock keys when the [`Lock`](crate::lock::Lock) is
    /// used on its own, outside the memoizer.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Key Codec ==
/// Derives cache keys for one named computation.
///
/// The key is `{name}:{hex(sha256(name || 0x00 || json(args)))}`. Hashing the
/// serialized arguments keeps keys bounded regardless of argument size, and
/// the name prefix keeps two computations with identical arguments from
/// colliding.
#[derive(Debug, Clone)]
pub struct KeyCodec {
    name: String,
}

impl KeyCodec {
    /// Creates a codec for the computation registered under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the computation name this codec was built for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encodes `args` into the key a memoized call with those arguments
    /// would read and write.
    ///
    /// # Errors
    /// Returns [`KeyError`] when the arguments cannot be serialized.
    pub fn encode<A: Serialize + ?Sized>(&self, args: &A) -> Result<CacheKey, KeyError> {
        let payload = serde_json::to_vec(args)?;

        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        // Separator so ("ab", "c") and ("a", "bc") cannot collide.
        hasher.update([0u8]);
        hasher.update(&payload);
        let digest = hex::encode(hasher.finalize());

        Ok(CacheKey(format!("{}:{}", self.name, digest)))
    }
}
