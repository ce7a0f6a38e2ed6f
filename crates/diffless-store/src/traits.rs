/// Pluggable cache backend over opaque byte strings.
///
/// Implementations never fail outward during normal use:
/// - a missing, unreadable, or corrupt entry is a miss (`None`),
/// - a failed write reports `false`,
/// - deleting an absent entry reports `false`,
/// - `clear` always reports `true`.
///
/// Expiry is not part of the contract. Values stay until deleted.
pub trait CacheBackend: Send + Sync {
    /// Read the stored bytes for `key`, or `None` on a miss.
    fn read_entry(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key`, overwriting any previous entry.
    ///
    /// Writing the same key with the same bytes twice must leave the
    /// persisted entry byte-identical.
    fn write_entry(&self, key: &str, value: &[u8]) -> bool;

    /// Remove the entry for `key`. Returns `true` if anything was removed.
    fn delete_entry(&self, key: &str) -> bool;

    /// Remove every entry.
    fn clear(&self) -> bool;

    /// Whether a value is readable for `key`.
    fn exist(&self, key: &str) -> bool {
        self.read_entry(key).is_some()
    }
}
