//! Binary-safe delimiter search.
//!
//! Locates the first occurrence of a needle in a byte window without any
//! assumptions about text encoding or terminators, so it works on bodies
//! containing embedded zero bytes. The scan looks for candidates by first
//! byte and verifies the full needle at each one; the window is bounded and
//! the needle short, so the quadratic worst case is acceptable.

/// Find the first exact occurrence of `needle` in `haystack`.
///
/// Returns `None` for an empty needle or a haystack shorter than the needle.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }

    let first = needle[0];
    let mut offset = 0;

    while offset + needle.len() <= haystack.len() {
        match haystack[offset..].iter().position(|&b| b == first) {
            Some(rel) => {
                let candidate = offset + rel;
                if candidate + needle.len() > haystack.len() {
                    return None;
                }
                if &haystack[candidate..candidate + needle.len()] == needle {
                    return Some(candidate);
                }
                offset = candidate + 1;
            }
            None => return None,
        }
    }

    None
}
