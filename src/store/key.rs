//! Physical key layout inside the shared store.

/// Separator between the global prefix, the namespace and the key.
pub const SEPARATOR: char = ':';

/// Builds the physical key `"{prefix}:{namespace}:{key}"`.
/// Empty prefix or namespace segments are skipped along with their separator.
pub fn prep_key(prefix: &str, namespace: &str, key: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + namespace.len() + key.len() + 2);
    for segment in [prefix, namespace] {
        if !segment.is_empty() {
            out.push_str(segment);
            out.push(SEPARATOR);
        }
    }
    out.push_str(key);
    out
}
