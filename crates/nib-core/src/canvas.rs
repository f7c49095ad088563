//! Sparse character canvas with a clip stack.
//!
//! The compositor writes styled segments into the canvas; each visible
//! cell records its grapheme and the style stack active when it was
//! written. Serialisation walks rows left to right, emitting opens when
//! the style changes and closes at the end of styled runs, so the stream
//! stays valid on terminals that do not track state.

use std::collections::BTreeMap;

use unicode_segmentation::UnicodeSegmentation;

use crate::ansi::{self, AnsiToken, StyleSeq, StyleStack};

/// One written cell.
#[derive(Clone, Debug)]
struct Cell {
    /// Grapheme cluster, empty for the continuation half of a wide glyph.
    symbol: String,
    /// Cells occupied: 1, 2 for wide glyphs, 0 for continuations.
    width: u8,
    /// Style stack active when the cell was written.
    styles: Vec<StyleSeq>,
    /// Foreign escape sequences attached in front of this cell.
    prefix: String,
}

/// A clip rectangle in absolute coordinates; either axis may be open.
/// `x2`/`y2` are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clip {
    /// Minimum column, inclusive.
    pub x1: Option<usize>,
    /// Maximum column, exclusive.
    pub x2: Option<usize>,
    /// Minimum row, inclusive.
    pub y1: Option<usize>,
    /// Maximum row, exclusive.
    pub y2: Option<usize>,
}

impl Clip {
    /// Whether a cell span `[x0, x1_excl)` on `row` survives this clip.
    fn allows(&self, x0: usize, x1_excl: usize, row: usize) -> bool {
        if let Some(min_x) = self.x1
            && x0 < min_x
        {
            return false;
        }
        if let Some(max_x) = self.x2
            && x1_excl > max_x
        {
            return false;
        }
        if let Some(min_y) = self.y1
            && row < min_y
        {
            return false;
        }
        if let Some(max_y) = self.y2
            && row >= max_y
        {
            return false;
        }
        true
    }
}

/// Sparse 2-D canvas of styled cells.
#[derive(Debug, Default)]
pub struct Canvas {
    rows: BTreeMap<usize, BTreeMap<usize, Cell>>,
    clips: Vec<Clip>,
}

impl Canvas {
    /// Create an empty canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a clip rectangle. Every subsequent write is intersected
    /// against all active rectangles.
    pub fn push_clip(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    /// Pop the most recent clip rectangle.
    pub fn pop_clip(&mut self) {
        self.clips.pop();
    }

    /// Write one styled line starting at `(x, y)`.
    ///
    /// Cells outside any active clip rectangle are dropped together with
    /// their attached escape sequences. Wide glyphs reserve two columns;
    /// zero-width combining marks merge into the preceding cell.
    pub fn write(&mut self, x: i32, y: i32, styled: &str) {
        let mut stack = StyleStack::new();
        let mut pending_prefix = String::new();
        let mut col = x;
        let mut last_written: Option<usize> = None;

        for token in ansi::tokens(styled) {
            match token {
                AnsiToken::Escape(esc) => {
                    if !stack.apply(esc) {
                        pending_prefix.push_str(esc);
                    }
                }
                AnsiToken::Text(text) => {
                    for g in text.graphemes(true) {
                        let w = ansi::grapheme_width(g);
                        if w == 0 {
                            // Merge combining marks into the cell to the left.
                            if let Some(prev_col) = last_written
                                && y >= 0
                                && let Some(cell) = self
                                    .rows
                                    .get_mut(&(y as usize))
                                    .and_then(|r| r.get_mut(&prev_col))
                            {
                                cell.symbol.push_str(g);
                            }
                            continue;
                        }

                        let visible = y >= 0
                            && col >= 0
                            && self.clips.iter().all(|c| {
                                c.allows(col as usize, col as usize + w, y as usize)
                            });
                        if visible {
                            let row = self.rows.entry(y as usize).or_default();
                            row.insert(
                                col as usize,
                                Cell {
                                    symbol: g.to_string(),
                                    width: w as u8,
                                    styles: stack.entries().to_vec(),
                                    prefix: std::mem::take(&mut pending_prefix),
                                },
                            );
                            if w == 2 {
                                row.insert(
                                    col as usize + 1,
                                    Cell {
                                        symbol: String::new(),
                                        width: 0,
                                        styles: Vec::new(),
                                        prefix: String::new(),
                                    },
                                );
                            }
                            last_written = Some(col as usize);
                        } else {
                            // Clipped cells take their attached escapes with them.
                            pending_prefix.clear();
                            last_written = None;
                        }
                        col += w as i32;
                    }
                }
            }
        }
    }

    /// Number of rows the canvas occupies (trailing unwritten rows do not
    /// count).
    pub fn height(&self) -> usize {
        self.rows.keys().next_back().map_or(0, |&max| max + 1)
    }

    /// Serialise the canvas into a single string, one `\n`-joined line per
    /// row.
    pub fn render(&self) -> (String, usize) {
        let height = self.height();
        let mut lines: Vec<String> = Vec::with_capacity(height);
        let empty: &[StyleSeq] = &[];

        for y in 0..height {
            let Some(cols) = self.rows.get(&y) else {
                lines.push(String::new());
                continue;
            };
            let mut line = String::new();
            let mut active: &[StyleSeq] = empty;
            let mut cursor = 0usize;

            for (&col, cell) in cols {
                if cell.width == 0 {
                    continue;
                }
                if col > cursor {
                    transition(&mut line, active, empty);
                    active = empty;
                    line.push_str(&" ".repeat(col - cursor));
                    cursor = col;
                }
                transition(&mut line, active, &cell.styles);
                active = &cell.styles;
                line.push_str(&cell.prefix);
                line.push_str(&cell.symbol);
                cursor += usize::from(cell.width);
            }
            transition(&mut line, active, empty);
            lines.push(line);
        }

        (lines.join("\n"), height)
    }
}

/// Emit the minimal closes and opens taking the stream from style state
/// `from` to `to`.
fn transition(out: &mut String, from: &[StyleSeq], to: &[StyleSeq]) {
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut closed: Vec<u8> = Vec::new();
    for seq in from[common..].iter().rev() {
        if !closed.contains(&seq.close) {
            out.push_str(&ansi::close_sequence(seq.close));
            closed.push(seq.close);
        }
    }
    // A shared close code would have cancelled surviving prefix styles;
    // reopen them after the closes.
    let reopen_from = if from[common..]
        .iter()
        .any(|dropped| from[..common].iter().any(|kept| kept.close == dropped.close))
    {
        0
    } else {
        common
    };
    for seq in &from[reopen_from..common] {
        if closed.contains(&seq.close) {
            out.push_str(&seq.open);
        }
    }
    for seq in &to[common..] {
        out.push_str(&seq.open);
    }
}
