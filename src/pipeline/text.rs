/// Returns at most the first `max_chars` characters of `text`.
///
/// Counts Unicode scalar values and always cuts on a `char` boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
