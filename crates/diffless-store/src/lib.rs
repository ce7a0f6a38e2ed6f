//! Byte-stable, file-backed key-value cache.
//!
//! A diffless cache is meant to be committed to version control. Every file
//! it writes is a pure function of the key and value written, so rewriting
//! an unchanged entry never produces a diff.
//!
//! # Addressing
//!
//! - **Flat** ([`Addressing::Flat`]) -- `<root>/<sha256(key)>.key` holds the
//!   literal key, `<root>/<sha256(key)>.value` holds the value bytes.
//! - **Hierarchical** ([`Addressing::Hierarchical`]) -- the key is split on
//!   a delimiter and each segment becomes a nested `<sha256(segment)>`
//!   directory carrying a `_key_chunk` file with the segment text. The
//!   innermost directory holds `value`. Keys sharing leading segments share
//!   directories, and deleting a key removes the whole subtree under its
//!   first segment.
//!
//! # Backends
//!
//! All backends implement the [`CacheBackend`] trait:
//!
//! - [`FileStore`] -- the on-disk store
//! - [`InMemoryStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! [`Cache`] layers `serde_json` encoding on top of any backend.
//!
//! # Failure model
//!
//! Reads that fail are misses, writes that fail return `false`, deleting an
//! absent key returns `false`, and `clear` always returns `true`. Only
//! opening a store whose root cannot be created is an error. Expiry hints
//! are accepted and ignored.

pub mod cache;
pub mod config;
pub mod error;
pub mod file;
pub mod layout;
pub mod memory;
pub mod traits;

pub use cache::{Cache, WriteOptions};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use file::{FileStore, StoreStats};
pub use layout::Addressing;
pub use memory::InMemoryStore;
pub use traits::CacheBackend;
