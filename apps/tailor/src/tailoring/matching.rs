//! Fragment matching: exact substring search with a whitespace-normalized fallback.
//!
//! Models often copy a fragment with a single space where the document has a
//! double space, a tab, or a non-breaking space. Matching tolerates that, but
//! the returned range always points at the original bytes so substitution
//! stays byte-exact.

use std::ops::Range;

/// Finds the earliest occurrence of `needle` in `haystack` at or after byte
/// offset `from`. Returns the byte range in `haystack`.
pub fn find_fragment(haystack: &str, needle: &str, from: usize) -> Option<Range<usize>> {
    if needle.trim().is_empty() || from > haystack.len() {
        return None;
    }
    let window = &haystack[from..];

    let exact = window.find(needle).map(|s| s..s + needle.len());
    let normalized = find_normalized(window, needle);

    let best = match (exact, normalized) {
        (Some(a), Some(b)) => Some(if b.start < a.start { b } else { a }),
        (a, b) => a.or(b),
    };
    best.map(|r| r.start + from..r.end + from)
}

/// True if `needle` occurs anywhere in `haystack` under either matching mode.
pub fn contains_fragment(haystack: &str, needle: &str) -> bool {
    find_fragment(haystack, needle, 0).is_some()
}

/// Collapses every whitespace run to a single ASCII space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One character of the normalized haystack and the original bytes it stands for.
struct MappedChar {
    norm_start: usize,
    orig: Range<usize>,
}

fn find_normalized(haystack: &str, needle: &str) -> Option<Range<usize>> {
    let needle = normalize_whitespace(needle);
    if needle.is_empty() {
        return None;
    }

    let mut normalized = String::with_capacity(haystack.len());
    let mut map: Vec<MappedChar> = Vec::with_capacity(haystack.len());
    let mut chars = haystack.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            let mut end = start + c.len_utf8();
            while let Some(&(next, n)) = chars.peek() {
                if !n.is_whitespace() {
                    break;
                }
                end = next + n.len_utf8();
                chars.next();
            }
            map.push(MappedChar {
                norm_start: normalized.len(),
                orig: start..end,
            });
            normalized.push(' ');
        } else {
            map.push(MappedChar {
                norm_start: normalized.len(),
                orig: start..start + c.len_utf8(),
            });
            normalized.push(c);
        }
    }

    let hit = normalized.find(&needle)?;
    let hit_end = hit + needle.len();

    let first = map.binary_search_by(|m| m.norm_start.cmp(&hit)).ok()?;
    // Last mapped char that starts before the end of the hit.
    let last = map.partition_point(|m| m.norm_start < hit_end).checked_sub(1)?;

    Some(map[first].orig.start..map[last].orig.end)
}
