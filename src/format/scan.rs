//! Whitespace/content run scanning and column measurement.

/// Returns `true` for the whitespace the formatter rewrites.
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Returns `true` if `text` contains a line break.
pub(crate) fn has_line_break(text: &str) -> bool {
    text.bytes().any(|b| b == b'\n' || b == b'\r')
}

/// Counts line breaks, treating `\r\n` as one.
pub(crate) fn count_line_breaks(text: &str) -> usize {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'\n' || (b == b'\r' && bytes.get(i + 1) != Some(&b'\n')))
        .count()
}

/// Display width of `text`: one column per character, `tab_size` per tab.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) fn column_width(text: &str, tab_size: usize) -> i32 {
    text.chars()
        .map(|c| if c == '\t' { tab_size } else { 1 })
        .sum::<usize>() as i32
}

/// Width of the part of `text` after its last line break, or `None` if
/// `text` is a single line.
pub(crate) fn last_line_width(text: &str, tab_size: usize) -> Option<i32> {
    text.rfind(['\n', '\r'])
        .map(|i| column_width(&text[i + 1..], tab_size))
}

/// A maximal run of whitespace or of non-whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Run {
    pub start: usize,
    pub end: usize,
    pub whitespace: bool,
}

/// Splits `text[start..end]` into alternating runs, with absolute offsets.
pub(crate) fn runs(text: &str, start: usize, end: usize) -> Vec<Run> {
    let bytes = &text.as_bytes()[start..end];
    let mut runs: Vec<Run> = Vec::new();
    for (i, &b) in bytes.iter().enumerate() {
        let whitespace = is_whitespace(b);
        match runs.last_mut() {
            Some(run) if run.whitespace == whitespace => run.end = start + i + 1,
            _ => runs.push(Run {
                start: start + i,
                end: start + i + 1,
                whitespace,
            }),
        }
    }
    runs
}
