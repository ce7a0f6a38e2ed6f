//! Foundation types for diffless.
//!
//! Every on-disk name in a diffless cache is derived from a [`Digest`]: the
//! SHA-256 of a key (flat addressing) or of one key segment (hierarchical
//! addressing). Digests are a pure function of the input bytes, so the same
//! key resolves to the same paths on every machine and every run.
//!
//! # Key Types
//!
//! - [`Digest`] — SHA-256 output rendered as 64 lowercase hex characters
//! - [`segments`] — literal key split used by hierarchical addressing

pub mod digest;
pub mod key;

pub use digest::Digest;
pub use key::segments;
