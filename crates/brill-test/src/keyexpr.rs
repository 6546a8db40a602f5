//! Key-expression matching
//!
//! Patterns are `/`-separated chunks. A `*` chunk matches exactly one
//! chunk, `**` matches any number (including zero), anything else matches
//! verbatim.

/// Whether `key` (a concrete path, no wildcards) matches `pattern`
pub fn matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('/').collect();
    let key: Vec<&str> = key.split('/').collect();
    match_chunks(&pattern, &key)
}

fn match_chunks(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.first() {
        None => key.is_empty(),
        Some(&"**") => {
            if match_chunks(&pattern[1..], key) {
                return true;
            }
            !key.is_empty() && match_chunks(pattern, &key[1..])
        }
        Some(&chunk) => match key.first() {
            Some(&head) if chunk == "*" || chunk == head => {
                match_chunks(&pattern[1..], &key[1..])
            }
            _ => false,
        },
    }
}
