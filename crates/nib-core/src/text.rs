//! Text measurement and wrapping with ANSI-aware column accounting.
//!
//! Wrapping computes break points on the stripped text and then slices the
//! styled original, so every produced line re-opens the styles active at
//! its start and closes them at its end.

use unicode_segmentation::UnicodeSegmentation;

use crate::ansi::{grapheme_width, slice, strip, visible_width};

/// How text behaves when it exceeds its available width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextWrap {
    /// Split on word boundaries; break over-long words at the cell
    /// boundary that would overflow.
    #[default]
    Wrap,
    /// Alias for [`TextWrap::TruncateEnd`].
    Truncate,
    /// Keep the tail, replacing the head with `…`.
    TruncateStart,
    /// Keep both ends, replacing the middle with `…`.
    TruncateMiddle,
    /// Keep the head, replacing the tail with `…`.
    TruncateEnd,
}

/// Measure text under a maximum width.
///
/// Returns the natural width when no wrap is required, otherwise
/// `min(natural, max_width)` and the wrapped line count. The empty string
/// measures `(0, 0)`; a trailing newline produces an extra empty line.
pub fn measure(text: &str, max_width: usize, mode: TextWrap) -> (usize, usize) {
    if text.is_empty() {
        return (0, 0);
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let natural = lines.iter().map(|l| visible_width(l)).max().unwrap_or(0);
    let height = lines.len();
    if natural <= max_width {
        return (natural, height);
    }
    match mode {
        TextWrap::Wrap => {
            let wrapped = wrap(text, max_width, mode);
            (natural.min(max_width), wrapped.split('\n').count())
        }
        _ => (natural.min(max_width), height),
    }
}

/// Wrap or truncate text to the given width in cells.
///
/// Returns the resulting lines joined with `\n`. Lines already within the
/// width pass through unchanged; a width of zero is a no-op.
pub fn wrap(text: &str, width: usize, mode: TextWrap) -> String {
    if width == 0 {
        return text.to_string();
    }
    let mut out: Vec<String> = Vec::new();
    for line in text.split('\n') {
        let natural = visible_width(line);
        if natural <= width {
            out.push(line.to_string());
            continue;
        }
        match mode {
            TextWrap::Wrap => out.extend(wrap_line(line, width)),
            TextWrap::Truncate | TextWrap::TruncateEnd => {
                out.push(format!("{}…", slice(line, 0, width - 1)));
            }
            TextWrap::TruncateStart => {
                out.push(format!("…{}", slice(line, natural - (width - 1), natural)));
            }
            TextWrap::TruncateMiddle => {
                let keep = width - 1;
                let left = keep - keep / 2;
                let right = keep / 2;
                out.push(format!(
                    "{}…{}",
                    slice(line, 0, left),
                    slice(line, natural - right, natural)
                ));
            }
        }
    }
    out.join("\n")
}

/// Word-wrap a single over-long line into styled segments.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let words = word_spans(line);
    if words.is_empty() {
        let natural = visible_width(line);
        return vec![slice(line, 0, natural.min(width))];
    }

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for &(ws, we) in &words {
        match current {
            Some((cs, _)) if we - cs <= width => {
                current = Some((cs, we));
            }
            _ => {
                if let Some(range) = current.take() {
                    ranges.push(range);
                }
                // Leading indentation is preserved on the first line.
                let mut start = if ranges.is_empty() { 0 } else { ws };
                while we - start > width {
                    ranges.push((start, start + width));
                    start += width;
                }
                current = Some((start, we));
            }
        }
    }
    if let Some(range) = current {
        ranges.push(range);
    }

    ranges
        .into_iter()
        .map(|(s, e)| slice(line, s, e))
        .collect()
}

/// Cell spans `(start, end)` of the words (non-space runs) in a line,
/// measured on the stripped text.
fn word_spans(line: &str) -> Vec<(usize, usize)> {
    let stripped = strip(line);
    let mut spans = Vec::new();
    let mut col = 0;
    let mut word_start: Option<usize> = None;
    for g in stripped.graphemes(true) {
        let w = grapheme_width(g);
        if g == " " {
            if let Some(start) = word_start.take() {
                spans.push((start, col));
            }
        } else if word_start.is_none() {
            word_start = Some(col);
        }
        col += w;
    }
    if let Some(start) = word_start {
        spans.push((start, col));
    }
    spans
}
