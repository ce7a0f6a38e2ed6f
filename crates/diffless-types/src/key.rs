/// Split a key into the segments used by hierarchical addressing.
///
/// The split is literal: leading, trailing, and consecutive delimiters all
/// produce empty segments, and nothing is trimmed. A key without any
/// occurrence of `delimiter` is a single segment. An empty `delimiter` never
/// splits: the whole key is one segment. Stores reject an empty delimiter at
/// construction, so this only matters for direct callers.
///
/// ```
/// use diffless_types::segments;
///
/// assert_eq!(segments("foo---bar---boo-ba", "---"), ["foo", "bar", "boo-ba"]);
/// assert_eq!(segments("plain", "/"), ["plain"]);
/// assert_eq!(segments("/a/", "/"), ["", "a", ""]);
/// ```
pub fn segments<'k>(key: &'k str, delimiter: &str) -> Vec<&'k str> {
    if delimiter.is_empty() {
        return vec![key];
    }
    key.split(delimiter).collect()
}
