use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use diffless_types::Digest;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::layout::{
    hierarchical_chunk_dirs, key_file_path, value_file_path, Addressing, KEY_CHUNK_FILE,
    VALUE_EXTENSION, VALUE_FILE,
};
use crate::traits::CacheBackend;

/// File and byte counts under a cache root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of readable-looking entries (value files).
    pub entries: usize,
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// File-backed cache store whose on-disk bytes are a pure function of the
/// keys and values written to it.
///
/// The addressing scheme is chosen once at construction. Every write
/// rewrites the full entry in place, so writing the same key and value again
/// leaves the tree byte-identical and produces no version-control diff.
///
/// There is no locking. Callers serialize concurrent writes to the same key.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    addressing: Addressing,
}

impl FileStore {
    /// Open a store from configuration, creating the root if needed.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        Self::new(config.cache_path.clone(), config.addressing()?)
    }

    /// Open a store at `root` with an explicit addressing scheme.
    ///
    /// The root and any missing ancestors are created. Failure to do so is
    /// the only fatal error this store raises.
    pub fn new(root: impl Into<PathBuf>, addressing: Addressing) -> StoreResult<Self> {
        let root = root.into();
        addressing.validate()?;
        fs::create_dir_all(&root).map_err(|source| StoreError::CreateRoot {
            path: root.clone(),
            source,
        })?;
        debug!(root = %root.display(), ?addressing, "opened file store");
        Ok(Self { root, addressing })
    }

    /// The cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The addressing scheme in use.
    pub fn addressing(&self) -> &Addressing {
        &self.addressing
    }

    /// Path of the value file for `key`.
    pub fn value_path(&self, key: &str) -> PathBuf {
        self.addressing.value_path(&self.root, key)
    }

    /// Whether a complete entry is present for `key`.
    ///
    /// Flat entries need both the `.key` and `.value` file.
    pub fn exists(&self, key: &str) -> bool {
        match &self.addressing {
            Addressing::Flat => {
                key_file_path(&self.root, key).is_file() && value_file_path(&self.root, key).is_file()
            }
            Addressing::Hierarchical { .. } => self.value_path(key).is_file(),
        }
    }

    /// Read the value bytes for `key`.
    ///
    /// Returns `Ok(None)` when the entry is absent. I/O failures on an entry
    /// that does exist are returned as errors.
    pub fn try_read(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if let Addressing::Flat = self.addressing {
            if !key_file_path(&self.root, key).is_file() {
                return Ok(None);
            }
        }
        match fs::read(self.value_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `value` under `key`, rewriting every file of the entry.
    pub fn try_write(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        match &self.addressing {
            Addressing::Flat => {
                fs::write(value_file_path(&self.root, key), value)?;
                fs::write(key_file_path(&self.root, key), key)?;
            }
            Addressing::Hierarchical { delimiter } => {
                let chain = hierarchical_chunk_dirs(&self.root, key, delimiter);
                for (dir, segment) in &chain {
                    fs::create_dir_all(dir)?;
                    fs::write(dir.join(KEY_CHUNK_FILE), segment)?;
                }
                // The chain always has at least one level.
                if let Some((leaf, _)) = chain.last() {
                    fs::write(leaf.join(VALUE_FILE), value)?;
                }
            }
        }
        debug!(
            digest = %Digest::of(key).short_hex(),
            bytes = value.len(),
            "cache write"
        );
        Ok(())
    }

    /// Delete the entry for `key`. Returns `Ok(true)` if anything was removed.
    ///
    /// Flat mode removes the `.key` and `.value` files independently; one
    /// failing does not stop the other. Hierarchical mode removes the whole
    /// subtree under the key's first segment, including any other keys that
    /// share that first segment.
    pub fn try_delete(&self, key: &str) -> StoreResult<bool> {
        let removed = match &self.addressing {
            Addressing::Flat => {
                let steps = [
                    remove_file_if_present(&key_file_path(&self.root, key)),
                    remove_file_if_present(&value_file_path(&self.root, key)),
                ];
                let mut removed = false;
                let mut first_err = None;
                for step in steps {
                    match step {
                        Ok(r) => removed |= r,
                        Err(e) => {
                            first_err.get_or_insert(e);
                        }
                    }
                }
                match first_err {
                    Some(e) if !removed => return Err(e),
                    Some(e) => {
                        warn!(error = %e, "partial delete of flat entry");
                        removed
                    }
                    None => removed,
                }
            }
            Addressing::Hierarchical { .. } => {
                if !self.value_path(key).is_file() {
                    return Ok(false);
                }
                fs::remove_dir_all(self.addressing.entry_root(&self.root, key))?;
                true
            }
        };
        if removed {
            debug!(digest = %Digest::of(key).short_hex(), "cache delete");
        }
        Ok(removed)
    }

    /// Remove every child of the root, leaving the root present and empty.
    ///
    /// Every child is attempted; the first failure is returned afterwards.
    pub fn try_clear(&self) -> StoreResult<()> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.root)?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut first_err: Option<StoreError> = None;
        let mut removed = 0usize;
        for entry in entries {
            let result = entry.and_then(|entry| {
                if entry.file_type()?.is_dir() {
                    fs::remove_dir_all(entry.path())
                } else {
                    fs::remove_file(entry.path())
                }
            });
            match result {
                Ok(()) => removed += 1,
                Err(e) => {
                    first_err.get_or_insert(e.into());
                }
            }
        }
        debug!(removed, "cache clear");
        first_err.map_or(Ok(()), Err)
    }

    /// Walk the root and count what is stored there.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let mut stats = StoreStats::default();
        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry?;
            if entry.file_type().is_dir() {
                stats.directories += 1;
                continue;
            }
            stats.files += 1;
            stats.bytes += entry.metadata()?.len();
            if self.is_value_file(entry.path()) {
                stats.entries += 1;
            }
        }
        Ok(stats)
    }

    fn is_value_file(&self, path: &Path) -> bool {
        match self.addressing {
            Addressing::Flat => path.extension().is_some_and(|ext| ext == VALUE_EXTENSION),
            Addressing::Hierarchical { .. } => path.file_name().is_some_and(|n| n == VALUE_FILE),
        }
    }
}

fn remove_file_if_present(path: &Path) -> StoreResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl CacheBackend for FileStore {
    fn read_entry(&self, key: &str) -> Option<Vec<u8>> {
        self.try_read(key).unwrap_or_else(|e| {
            warn!(digest = %Digest::of(key).short_hex(), error = %e, "unreadable entry treated as miss");
            None
        })
    }

    fn write_entry(&self, key: &str, value: &[u8]) -> bool {
        match self.try_write(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!(digest = %Digest::of(key).short_hex(), error = %e, "cache write failed");
                false
            }
        }
    }

    fn delete_entry(&self, key: &str) -> bool {
        match self.try_delete(key) {
            Ok(removed) => removed,
            Err(e) => {
                warn!(digest = %Digest::of(key).short_hex(), error = %e, "cache delete failed");
                false
            }
        }
    }

    fn clear(&self) -> bool {
        if let Err(e) = self.try_clear() {
            warn!(root = %self.root.display(), error = %e, "cache clear incomplete");
        }
        true
    }

    fn exist(&self, key: &str) -> bool {
        self.exists(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    fn hex(text: &str) -> String {
        Digest::of(text).to_hex()
    }

    fn flat(dir: &Path) -> FileStore {
        FileStore::new(dir.join("cache"), Addressing::Flat).unwrap()
    }

    fn nested(dir: &Path, delimiter: &str) -> FileStore {
        FileStore::new(
            dir.join("cache"),
            Addressing::Hierarchical {
                delimiter: delimiter.into(),
            },
        )
        .unwrap()
    }

    /// Every file under `root` with its contents.
    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(root)
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
            .collect()
    }

    fn children(root: &Path) -> Vec<PathBuf> {
        let mut out: Vec<PathBuf> = fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        out.sort();
        out
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn new_creates_missing_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("a/b/c");
        let store = FileStore::new(&root, Addressing::Flat).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root);
    }

    #[test]
    fn new_is_idempotent_on_existing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        store.write_entry("k", b"v");
        let reopened = flat(dir.path());
        assert_eq!(reopened.read_entry("k"), Some(b"v".to_vec()));
    }

    #[test]
    fn uncreatable_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file.txt");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = FileStore::new(blocker.join("cache"), Addressing::Flat).unwrap_err();
        assert!(matches!(err, StoreError::CreateRoot { .. }));
    }

    #[test]
    fn empty_delimiter_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileStore::new(
            dir.path(),
            Addressing::Hierarchical {
                delimiter: String::new(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn open_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path().join("cfg")).with_delimiter("/");
        let store = FileStore::open(&config).unwrap();
        assert_eq!(store.addressing().delimiter(), Some("/"));
        assert!(store.root().is_dir());
    }

    // -----------------------------------------------------------------------
    // Flat addressing
    // -----------------------------------------------------------------------

    #[test]
    fn flat_write_creates_key_and_value_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        let value = br#"{"name":"A"}"#;

        assert!(store.write_entry("user:123", value));

        let root = store.root();
        assert_eq!(
            children(root),
            vec![
                root.join(format!("{}.key", hex("user:123"))),
                root.join(format!("{}.value", hex("user:123"))),
            ]
        );
        assert_eq!(
            fs::read(root.join(format!("{}.key", hex("user:123")))).unwrap(),
            b"user:123"
        );
        assert_eq!(
            fs::read(root.join(format!("{}.value", hex("user:123")))).unwrap(),
            value
        );
        assert_eq!(store.read_entry("user:123"), Some(value.to_vec()));
    }

    #[test]
    fn flat_read_unknown_key_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        assert_eq!(store.read_entry("never-written"), None);
        assert!(!store.exist("never-written"));
    }

    #[test]
    fn flat_read_requires_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        store.write_entry("k", b"v");
        fs::remove_file(key_file_path(store.root(), "k")).unwrap();
        assert_eq!(store.read_entry("k"), None);
    }

    #[test]
    fn flat_unreadable_value_degrades_to_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        fs::write(key_file_path(store.root(), "k"), "k").unwrap();
        fs::create_dir(value_file_path(store.root(), "k")).unwrap();

        assert!(store.try_read("k").is_err());
        assert_eq!(store.read_entry("k"), None);
    }

    #[test]
    fn flat_overwrite_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        store.write_entry("k", b"first, longer value");
        store.write_entry("k", b"second");
        assert_eq!(store.read_entry("k"), Some(b"second".to_vec()));
    }

    #[test]
    fn flat_write_failure_is_reported_and_localized() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        assert!(store.write_entry("good", b"ok"));

        fs::create_dir(value_file_path(store.root(), "bad")).unwrap();
        assert!(!store.write_entry("bad", b"nope"));

        assert_eq!(store.read_entry("good"), Some(b"ok".to_vec()));
    }

    #[test]
    fn flat_delete_removes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        store.write_entry("k", b"v");

        assert!(store.delete_entry("k"));
        assert!(children(store.root()).is_empty());
        assert_eq!(store.read_entry("k"), None);
        assert!(!store.delete_entry("k"));
    }

    #[test]
    fn flat_delete_of_half_entry_counts() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        fs::write(key_file_path(store.root(), "orphan"), "orphan").unwrap();
        assert!(store.delete_entry("orphan"));
        assert!(children(store.root()).is_empty());
    }

    #[test]
    fn flat_delete_attempts_both_steps() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        store.write_entry("k", b"v");
        // A non-empty directory at the key path makes that step fail.
        let key_path = key_file_path(store.root(), "k");
        fs::remove_file(&key_path).unwrap();
        fs::create_dir(&key_path).unwrap();
        fs::write(key_path.join("inner"), b"x").unwrap();

        assert!(store.delete_entry("k"));
        assert!(!value_file_path(store.root(), "k").exists());
    }

    // -----------------------------------------------------------------------
    // Hierarchical addressing
    // -----------------------------------------------------------------------

    #[test]
    fn hierarchical_write_builds_nested_chain() {
        let dir = tempfile::tempdir().unwrap();
        let store = nested(dir.path(), "---");
        assert!(store.write_entry("foo---bar---boo-ba", b"payload"));

        let root = store.root();
        let foo = root.join(hex("foo"));
        let bar = foo.join(hex("bar"));
        let boo = bar.join(hex("boo-ba"));

        assert_eq!(children(root), vec![foo.clone()]);
        assert_eq!(fs::read(foo.join(KEY_CHUNK_FILE)).unwrap(), b"foo");
        assert_eq!(fs::read(bar.join(KEY_CHUNK_FILE)).unwrap(), b"bar");
        assert_eq!(fs::read(boo.join(KEY_CHUNK_FILE)).unwrap(), b"boo-ba");

        assert!(!foo.join(VALUE_FILE).exists());
        assert!(!bar.join(VALUE_FILE).exists());
        assert_eq!(fs::read(boo.join(VALUE_FILE)).unwrap(), b"payload");

        assert_eq!(
            store.read_entry("foo---bar---boo-ba"),
            Some(b"payload".to_vec())
        );
    }

    #[test]
    fn hierarchical_single_segment_is_one_level() {
        let dir = tempfile::tempdir().unwrap();
        let store = nested(dir.path(), "/");
        store.write_entry("solo", b"v");

        let leaf = store.root().join(hex("solo"));
        assert_eq!(children(store.root()), vec![leaf.clone()]);
        assert_eq!(
            children(&leaf),
            vec![leaf.join(KEY_CHUNK_FILE), leaf.join(VALUE_FILE)]
        );
        assert_eq!(store.read_entry("solo"), Some(b"v".to_vec()));
    }

    #[test]
    fn hierarchical_shared_prefix_shares_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = nested(dir.path(), "/");
        store.write_entry("users/1", b"one");
        store.write_entry("users/2", b"two");

        let users = store.root().join(hex("users"));
        assert_eq!(children(store.root()), vec![users.clone()]);
        assert_eq!(store.read_entry("users/1"), Some(b"one".to_vec()));
        assert_eq!(store.read_entry("users/2"), Some(b"two".to_vec()));
        // Interior key shares the first directory but owns its own value.
        assert_eq!(store.read_entry("users"), None);
    }

    #[test]
    fn hierarchical_delete_prunes_first_segment_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let store = nested(dir.path(), "/");
        store.write_entry("users/1", b"one");
        store.write_entry("users/2/profile", b"two");
        store.write_entry("teams/1", b"team");

        assert!(store.delete_entry("users/1"));
        assert_eq!(store.read_entry("users/1"), None);
        // Sibling under the same first segment goes with it.
        assert_eq!(store.read_entry("users/2/profile"), None);
        assert_eq!(store.read_entry("teams/1"), Some(b"team".to_vec()));
    }

    #[test]
    fn hierarchical_delete_without_value_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = nested(dir.path(), "/");
        store.write_entry("users/1", b"one");

        // "users" has a directory and key chunk but no value of its own.
        assert!(!store.delete_entry("users"));
        assert!(!store.delete_entry("users/missing"));
        assert_eq!(store.read_entry("users/1"), Some(b"one".to_vec()));
    }

    #[test]
    fn hierarchical_write_failure_keeps_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = nested(dir.path(), "/");
        assert!(store.write_entry("good/key", b"ok"));

        fs::write(store.root().join(hex("blocked")), b"file in the way").unwrap();
        assert!(!store.write_entry("blocked/key", b"nope"));
        assert!(store.try_write("blocked/key", b"nope").is_err());

        assert_eq!(store.read_entry("good/key"), Some(b"ok".to_vec()));
    }

    #[test]
    fn hierarchical_empty_segments_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = nested(dir.path(), "/");
        store.write_entry("/a//", b"edge");
        assert_eq!(store.read_entry("/a//"), Some(b"edge".to_vec()));
        assert_eq!(
            fs::read(store.root().join(hex("")).join(KEY_CHUNK_FILE)).unwrap(),
            b""
        );
    }

    // -----------------------------------------------------------------------
    // Idempotency / clear / stats
    // -----------------------------------------------------------------------

    #[test]
    fn rewriting_same_value_leaves_tree_unchanged() {
        for addressing in [
            Addressing::Flat,
            Addressing::Hierarchical {
                delimiter: ":".into(),
            },
        ] {
            let dir = tempfile::tempdir().unwrap();
            let store = FileStore::new(dir.path().join("cache"), addressing).unwrap();
            store.write_entry("a:b:c", b"value");
            store.write_entry("a:x", b"other");
            let before = snapshot(store.root());

            store.write_entry("a:b:c", b"value");
            assert_eq!(snapshot(store.root()), before);
        }
    }

    #[test]
    fn clear_empties_root_and_keeps_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = nested(dir.path(), "/");
        store.write_entry("a/b", b"1");
        store.write_entry("c", b"2");
        fs::write(store.root().join("stray.txt"), b"x").unwrap();

        assert!(store.clear());
        assert!(store.root().is_dir());
        assert!(children(store.root()).is_empty());
        assert_eq!(store.read_entry("a/b"), None);
    }

    #[test]
    fn clear_on_empty_root_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        assert!(store.clear());
        assert!(store.clear());
        assert!(store.root().is_dir());
    }

    #[test]
    fn clear_recreates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = flat(dir.path());
        fs::remove_dir_all(store.root()).unwrap();
        assert!(store.clear());
        assert!(store.root().is_dir());
    }

    #[test]
    fn stats_counts_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = nested(dir.path(), "/");
        store.write_entry("a/b", b"12345");
        store.write_entry("a/c", b"678");

        let stats = store.stats().unwrap();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.directories, 3);
        // 3 key chunks + 2 values
        assert_eq!(stats.files, 5);
        assert_eq!(stats.bytes, 1 + 1 + 1 + 5 + 3);

        let flat_store = FileStore::new(dir.path().join("flat"), Addressing::Flat).unwrap();
        flat_store.write_entry("k", b"v");
        assert_eq!(flat_store.stats().unwrap().entries, 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn flat_round_trip(key in ".{0,40}", value in proptest::collection::vec(any::<u8>(), 0..256)) {
            let dir = tempfile::tempdir().unwrap();
            let store = flat(dir.path());
            prop_assert!(store.write_entry(&key, &value));
            prop_assert_eq!(store.read_entry(&key), Some(value));
        }

        #[test]
        fn hierarchical_round_trip(
            key in "[a-z0-9/]{0,30}",
            value in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let dir = tempfile::tempdir().unwrap();
            let store = nested(dir.path(), "/");
            prop_assert!(store.write_entry(&key, &value));
            prop_assert_eq!(store.read_entry(&key), Some(value));
            prop_assert!(store.delete_entry(&key));
            prop_assert_eq!(store.read_entry(&key), None);
        }
    }
}
