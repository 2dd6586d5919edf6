use std::cmp::Ordering;

/// Compare two strings after trimming, ignoring case.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.to_lowercase() == b.to_lowercase()
}

/// Case-insensitive ordering without allocating for ASCII input.
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    if a.is_ascii() && b.is_ascii() {
        a.bytes()
            .map(|c| c.to_ascii_lowercase())
            .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
    } else {
        a.to_lowercase().cmp(&b.to_lowercase())
    }
}

/// True when `items` holds `needle`, compared trimmed and case-insensitively.
pub fn contains_ignore_case(items: &[String], needle: &str) -> bool {
    items.iter().any(|item| eq_ignore_case(item, needle))
}

/// Record ids are compared trimmed and ASCII case-insensitively,
/// so `p001` finds `P001`.
pub fn ids_match(stored: &str, requested: &str) -> bool {
    stored.trim().eq_ignore_ascii_case(requested.trim())
}
