//! Key-to-path resolution.
//!
//! Two addressing schemes map a key onto the cache root:
//!
//! ```text
//! flat:          <root>/<sha256(key)>.key
//!                <root>/<sha256(key)>.value
//!
//! hierarchical:  <root>/<sha256(seg1)>/_key_chunk
//!                <root>/<sha256(seg1)>/<sha256(seg2)>/_key_chunk
//!                ...
//!                <root>/<sha256(seg1)>/.../<sha256(segN)>/value
//! ```
//!
//! Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use diffless_types::{segments, Digest};

use crate::error::{StoreError, StoreResult};

/// Extension of the flat-mode file holding the literal key text.
pub const KEY_EXTENSION: &str = "key";
/// Extension of the flat-mode file holding the value bytes.
pub const VALUE_EXTENSION: &str = "value";
/// Per-directory file holding one literal key segment.
pub const KEY_CHUNK_FILE: &str = "_key_chunk";
/// Terminal-directory file holding the value bytes.
pub const VALUE_FILE: &str = "value";

/// Addressing scheme, fixed for the life of a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Addressing {
    /// One key, one digest, one `.key`/`.value` file pair.
    Flat,
    /// Key split on `delimiter`, one nested directory per segment.
    Hierarchical { delimiter: String },
}

impl Addressing {
    /// Reject a hierarchical scheme with an empty delimiter.
    pub fn validate(&self) -> StoreResult<()> {
        match self.delimiter() {
            Some("") => Err(StoreError::InvalidConfig(
                "addressing_delimiter must not be empty".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Path of the file holding the value bytes for `key`.
    pub fn value_path(&self, root: &Path, key: &str) -> PathBuf {
        match self {
            Self::Flat => value_file_path(root, key),
            Self::Hierarchical { delimiter } => hierarchical_value_path(root, key, delimiter),
        }
    }

    /// The unit removed when `key` is deleted.
    ///
    /// In hierarchical mode this is the first segment's directory, so every
    /// key nested beneath it goes too.
    pub fn entry_root(&self, root: &Path, key: &str) -> PathBuf {
        match self {
            Self::Flat => value_file_path(root, key),
            Self::Hierarchical { delimiter } => {
                root.join(Digest::of(first_segment(key, delimiter)).to_hex())
            }
        }
    }

    /// The delimiter, if hierarchical.
    pub fn delimiter(&self) -> Option<&str> {
        match self {
            Self::Flat => None,
            Self::Hierarchical { delimiter } => Some(delimiter),
        }
    }
}

/// The segment whose directory is the deletion unit in hierarchical mode.
pub fn first_segment<'k>(key: &'k str, delimiter: &str) -> &'k str {
    segments(key, delimiter)[0]
}

fn flat_path(root: &Path, key: &str, extension: &str) -> PathBuf {
    root.join(format!("{}.{extension}", Digest::of(key)))
}

/// `<root>/<sha256(key)>.key`
pub fn key_file_path(root: &Path, key: &str) -> PathBuf {
    flat_path(root, key, KEY_EXTENSION)
}

/// `<root>/<sha256(key)>.value`
pub fn value_file_path(root: &Path, key: &str) -> PathBuf {
    flat_path(root, key, VALUE_EXTENSION)
}

/// `<root>/<sha256(seg1)>/.../<sha256(segN)>/value`
///
/// An empty `delimiter` does not split: the whole key is one segment.
pub fn hierarchical_value_path(root: &Path, key: &str, delimiter: &str) -> PathBuf {
    segments(key, delimiter)
        .into_iter()
        .fold(root.to_path_buf(), |dir, segment| {
            dir.join(Digest::of(segment).to_hex())
        })
        .join(VALUE_FILE)
}

/// Every directory in the chain for `key`, outermost first, paired with the
/// literal segment text that belongs in its `_key_chunk` file.
///
/// As with [`hierarchical_value_path`], an empty `delimiter` does not split
/// and yields a one-level chain.
pub fn hierarchical_chunk_dirs<'k>(
    root: &Path,
    key: &'k str,
    delimiter: &str,
) -> Vec<(PathBuf, &'k str)> {
    let mut dir = root.to_path_buf();
    segments(key, delimiter)
        .into_iter()
        .map(|segment| {
            dir = dir.join(Digest::of(segment).to_hex());
            (dir.clone(), segment)
        })
        .collect()
}
