use unicode_segmentation::UnicodeSegmentation;

/// Cut `text` to at most `max_chars` characters without splitting a grapheme
/// cluster. Returns the kept prefix and whether anything was dropped.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    let mut used = 0usize;
    let mut end = 0usize;
    for (offset, grapheme) in text.grapheme_indices(true) {
        let width = grapheme.chars().count();
        if used + width > max_chars {
            return (&text[..end], true);
        }
        used += width;
        end = offset + grapheme.len();
    }
    (text, false)
}

/// Like [`truncate_chars`] but marks the cut with `...`.
pub(crate) fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match truncate_chars(text, max_chars) {
        (kept, true) => format!("{}...", kept.trim_end()),
        (kept, false) => kept.to_string(),
    }
}
