pub mod logger;

/// Truncate a string to at most `max_len` characters.
///
/// Character-based, so it never panics on a multi-byte boundary. Used to
/// keep order uuids short in log fields.
pub fn safe_truncate(s: &str, max_len: usize) -> &str {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
