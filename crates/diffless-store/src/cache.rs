//! Typed cache façade over any [`CacheBackend`].
//!
//! Values are encoded with `serde_json`. For a committed cache to stay
//! byte-stable, callers should store types whose JSON form is deterministic
//! (structs, `Vec`, `BTreeMap`; not `HashMap`).

use std::time::{Duration, SystemTime};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::traits::CacheBackend;

/// Per-write options.
///
/// Expiry hints are accepted for compatibility with callers that always pass
/// them, and discarded: entries never expire.
#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    pub expires_in: Option<Duration>,
    pub expires_at: Option<SystemTime>,
}

impl WriteOptions {
    pub fn expires_in(duration: Duration) -> Self {
        Self {
            expires_in: Some(duration),
            ..Self::default()
        }
    }
}

/// A cache of serializable values backed by `B`.
#[derive(Debug)]
pub struct Cache<B> {
    backend: B,
}

impl<B: CacheBackend> Cache<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read and decode the value for `key`. Undecodable bytes are a miss.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.backend.read_entry(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "undecodable cache value treated as miss");
                None
            }
        }
    }

    /// Encode and store `value` under `key`.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T, _options: &WriteOptions) -> bool {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.backend.write_entry(key, &bytes),
            Err(e) => {
                warn!(error = %e, "cache value could not be encoded");
                false
            }
        }
    }

    /// Return the cached value for `key`, or compute, store, and return it.
    ///
    /// A failed write still returns the computed value.
    pub fn fetch<T, F>(&self, key: &str, options: &WriteOptions, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        if let Some(hit) = self.read(key) {
            return hit;
        }
        let value = compute();
        self.write(key, &value, options);
        value
    }

    /// Raw bytes for `key`, undecoded.
    pub fn read_raw(&self, key: &str) -> Option<Vec<u8>> {
        self.backend.read_entry(key)
    }

    /// Store raw bytes under `key`.
    pub fn write_raw(&self, key: &str, value: &[u8], _options: &WriteOptions) -> bool {
        self.backend.write_entry(key, value)
    }

    pub fn exist(&self, key: &str) -> bool {
        self.backend.exist(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.backend.delete_entry(key)
    }

    pub fn clear(&self) -> bool {
        self.backend.clear()
    }
}
