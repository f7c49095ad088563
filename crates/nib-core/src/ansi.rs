//! ANSI/SGR codec: styling, escape-aware width, and escape-aware slicing.
//!
//! Styling is emitted as paired open/close SGR sequences in a fixed order
//! so that nested styles compose deterministically. The slicing and width
//! routines understand escape sequences in-band: widths ignore them, and
//! slices re-open the styles active at the cut points.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::color::{Color, ColorSupport, rgb_to_256};

/// The text styling dimensions understood by the codec.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextStyle {
    /// Foreground color.
    pub fg: Option<Color>,
    /// Background color.
    pub bg: Option<Color>,
    /// Dim/faint text.
    pub dim: bool,
    /// Bold text.
    pub bold: bool,
    /// Italic text.
    pub italic: bool,
    /// Underlined text.
    pub underline: bool,
    /// Strikethrough text.
    pub strikethrough: bool,
    /// Reverse video.
    pub inverse: bool,
}

impl TextStyle {
    /// Returns true if no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Wrap `text` with the open sequences of `style` and the closes that
/// restore prior state.
///
/// Open codes are emitted in a fixed order (dim, foreground, background,
/// bold, italic, underline, strikethrough, inverse) and closed in reverse,
/// so nested styled fragments compose deterministically.
pub fn style_text(text: &str, style: &TextStyle, support: ColorSupport) -> String {
    let mut opens: Vec<String> = Vec::new();

    if style.dim {
        opens.push("\x1b[2m".into());
    }
    if support != ColorSupport::NoColor {
        if let Some(fg) = style.fg {
            opens.push(fg_sequence(fg, support));
        }
        if let Some(bg) = style.bg {
            opens.push(bg_sequence(bg, support));
        }
    }
    if style.bold {
        opens.push("\x1b[1m".into());
    }
    if style.italic {
        opens.push("\x1b[3m".into());
    }
    if style.underline {
        opens.push("\x1b[4m".into());
    }
    if style.strikethrough {
        opens.push("\x1b[9m".into());
    }
    if style.inverse {
        opens.push("\x1b[7m".into());
    }

    if opens.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + opens.len() * 10);
    for open in &opens {
        out.push_str(open);
    }
    out.push_str(text);
    for open in opens.iter().rev() {
        if let Some(close) = close_code(open) {
            out.push_str(&close_sequence(close));
        }
    }
    out
}

/// SGR open sequence for a foreground color under the given support level.
pub fn fg_sequence(color: Color, support: ColorSupport) -> String {
    match downgrade(color, support) {
        Color::Named(n) => format!("\x1b[{}m", n.fg_code()),
        Color::Indexed(i) => format!("\x1b[38;5;{i}m"),
        Color::Rgb { r, g, b } => format!("\x1b[38;2;{r};{g};{b}m"),
    }
}

/// SGR open sequence for a background color under the given support level.
pub fn bg_sequence(color: Color, support: ColorSupport) -> String {
    match downgrade(color, support) {
        Color::Named(n) => format!("\x1b[{}m", n.bg_code()),
        Color::Indexed(i) => format!("\x1b[48;5;{i}m"),
        Color::Rgb { r, g, b } => format!("\x1b[48;2;{r};{g};{b}m"),
    }
}

/// Downgrade an RGB color to the palette when 24-bit output is unsupported.
fn downgrade(color: Color, support: ColorSupport) -> Color {
    match (color, support) {
        (Color::Rgb { r, g, b }, ColorSupport::Extended256 | ColorSupport::NoColor) => {
            Color::Indexed(rgb_to_256(r, g, b))
        }
        (c, _) => c,
    }
}

/// One token of an ANSI-interleaved string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnsiToken<'a> {
    /// A complete escape sequence, including the leading `ESC`.
    Escape(&'a str),
    /// A run of plain text between escape sequences.
    Text(&'a str),
}

/// Iterator over [`AnsiToken`]s of a string.
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
    rest: &'a str,
}

/// Tokenize a string into escape sequences and plain-text runs.
pub fn tokens(s: &str) -> Tokens<'_> {
    Tokens { rest: s }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = AnsiToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        if self.rest.starts_with('\x1b') {
            let len = escape_len(self.rest);
            let (esc, rest) = self.rest.split_at(len);
            self.rest = rest;
            return Some(AnsiToken::Escape(esc));
        }
        let end = self.rest.find('\x1b').unwrap_or(self.rest.len());
        let (text, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(AnsiToken::Text(text))
    }
}

/// Length in bytes of the escape sequence starting at the beginning of `s`.
///
/// Recognises CSI (`ESC [`) and OSC (`ESC ]`, BEL- or ST-terminated)
/// sequences; any other escape is taken as `ESC` plus one character.
/// A truncated sequence extends to the end of the string.
fn escape_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    debug_assert_eq!(bytes.first(), Some(&0x1b));
    match bytes.get(1) {
        Some(b'[') => {
            let mut i = 2;
            while let Some(&b) = bytes.get(i) {
                if (0x40..=0x7e).contains(&b) {
                    return i + 1;
                }
                if !(0x20..=0x3f).contains(&b) {
                    break;
                }
                i += 1;
            }
            s.len().min(i)
        }
        Some(b']') => {
            let mut i = 2;
            while let Some(&b) = bytes.get(i) {
                if b == 0x07 {
                    return i + 1;
                }
                if b == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                    return i + 2;
                }
                i += 1;
            }
            s.len()
        }
        Some(_) => {
            // ESC plus one character (respecting char boundaries).
            let mut iter = s.char_indices();
            iter.next();
            iter.next();
            iter.next().map_or(s.len(), |(i, _)| i)
        }
        None => 1,
    }
}

/// A single active SGR attribute: its open sequence and its close code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleSeq {
    /// The full open escape sequence (one attribute per entry).
    pub open: String,
    /// The SGR parameter that cancels this attribute.
    pub close: u8,
}

/// Build the close sequence for an SGR close code.
pub fn close_sequence(close: u8) -> String {
    format!("\x1b[{close}m")
}

/// The close code for a single-attribute open sequence, if it is SGR.
fn close_code(open: &str) -> Option<u8> {
    let body = open.strip_prefix("\x1b[")?.strip_suffix('m')?;
    let first = body.split(';').next()?.parse::<u16>().ok()?;
    close_code_for_param(first)
}

/// The close code cancelling an SGR open parameter, if known.
fn close_code_for_param(param: u16) -> Option<u8> {
    match param {
        1 | 2 => Some(22),
        3 => Some(23),
        4 => Some(24),
        7 => Some(27),
        9 => Some(29),
        30..=38 | 90..=97 => Some(39),
        40..=48 | 100..=107 => Some(49),
        _ => None,
    }
}

/// Returns true if the SGR parameter is itself a close/reset code.
fn is_close_param(param: u16) -> bool {
    matches!(param, 22 | 23 | 24 | 27 | 29 | 39 | 49)
}

/// Tracks which SGR attributes are currently open while scanning a string.
#[derive(Clone, Debug, Default)]
pub struct StyleStack {
    entries: Vec<StyleSeq>,
}

impl StyleStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an escape sequence to the stack.
    ///
    /// Returns true when the sequence was an SGR sequence the stack
    /// understood; false means the sequence is foreign and should be
    /// passed through untouched.
    pub fn apply(&mut self, escape: &str) -> bool {
        let Some(body) = escape.strip_prefix("\x1b[").and_then(|b| b.strip_suffix('m')) else {
            return false;
        };
        if body.is_empty() {
            self.entries.clear();
            return true;
        }

        let params: Vec<&str> = body.split(';').collect();
        let mut i = 0;
        while i < params.len() {
            let Ok(code) = params[i].parse::<u16>() else {
                i += 1;
                continue;
            };
            if code == 0 {
                self.entries.clear();
                i += 1;
                continue;
            }
            // Extended color sequences consume their arguments as one unit.
            if code == 38 || code == 48 {
                let taken = match params.get(i + 1) {
                    Some(&"5") => 3.min(params.len() - i),
                    Some(&"2") => 5.min(params.len() - i),
                    _ => 1,
                };
                let seq = format!("\x1b[{}m", params[i..i + taken].join(";"));
                let close = if code == 38 { 39 } else { 49 };
                self.entries.retain(|e| e.close != close);
                self.entries.push(StyleSeq { open: seq, close });
                i += taken;
                continue;
            }
            if is_close_param(code) {
                let close = code as u8;
                self.entries.retain(|e| e.close != close);
            } else if let Some(close) = close_code_for_param(code) {
                if close == 39 || close == 49 {
                    // A new color replaces the previous one on that layer.
                    self.entries.retain(|e| e.close != close);
                }
                self.entries.push(StyleSeq {
                    open: format!("\x1b[{code}m"),
                    close,
                });
            }
            i += 1;
        }
        true
    }

    /// The currently active attributes, in open order.
    pub fn entries(&self) -> &[StyleSeq] {
        &self.entries
    }

    /// Concatenated open sequences of every active attribute.
    pub fn open_all(&self) -> String {
        self.entries.iter().map(|e| e.open.as_str()).collect()
    }

    /// Close sequences for every active attribute, innermost first.
    pub fn close_all(&self) -> String {
        let mut out = String::new();
        let mut emitted: Vec<u8> = Vec::new();
        for entry in self.entries.iter().rev() {
            if !emitted.contains(&entry.close) {
                out.push_str(&close_sequence(entry.close));
                emitted.push(entry.close);
            }
        }
        out
    }

    /// Returns true if nothing is open.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Width of a single grapheme cluster in terminal cells.
///
/// Control characters count 0; wide CJK and emoji clusters count 2;
/// zero-width joiners, combining marks, and variation selectors inside a
/// cluster are already folded into the cluster width.
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.chars().any(|c| c.is_control()) {
        return 0;
    }
    UnicodeWidthStr::width(grapheme)
}

/// Visible width of a string in cells, ignoring escape sequences.
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    for token in tokens(s) {
        if let AnsiToken::Text(text) = token {
            for g in text.graphemes(true) {
                width += grapheme_width(g);
            }
        }
    }
    width
}

/// Remove every escape sequence from a string.
pub fn strip(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for token in tokens(s) {
        if let AnsiToken::Text(text) = token {
            out.push_str(text);
        }
    }
    out
}

/// Slice a styled string by visible cells, preserving style continuity.
///
/// The styles active at `start` are re-opened at the front of the result
/// and the styles active at `end` are closed at the back. Graphemes that
/// straddle a cut point (wide characters) are dropped. Escape sequences
/// the codec does not understand are passed through verbatim when they
/// occur inside the emitted window.
pub fn slice(s: &str, start: usize, end: usize) -> String {
    if start >= end {
        return String::new();
    }

    let mut out = String::new();
    let mut stack = StyleStack::new();
    let mut col = 0;
    let mut emitting = false;

    for token in tokens(s) {
        match token {
            AnsiToken::Escape(esc) => {
                // Foreign sequences leave the stack untouched and are
                // passed through verbatim inside the window.
                stack.apply(esc);
                if emitting && col < end {
                    out.push_str(esc);
                }
            }
            AnsiToken::Text(text) => {
                for g in text.graphemes(true) {
                    let w = grapheme_width(g);
                    if col >= start && col + w <= end {
                        if !emitting {
                            out.push_str(&stack.open_all());
                            emitting = true;
                        }
                        out.push_str(g);
                    }
                    col += w;
                    if col >= end {
                        break;
                    }
                }
            }
        }
        if col >= end {
            break;
        }
    }

    if emitting {
        out.push_str(&stack.close_all());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::NamedColor;

    fn green() -> TextStyle {
        TextStyle {
            fg: Some(Color::Named(NamedColor::Green)),
            ..TextStyle::default()
        }
    }

    #[test]
    fn style_plain_passthrough() {
        let styled = style_text("plain", &TextStyle::default(), ColorSupport::TrueColor);
        assert_eq!(styled, "plain");
    }

    #[test]
    fn style_single_color() {
        let styled = style_text("Hello", &green(), ColorSupport::TrueColor);
        assert_eq!(styled, "\x1b[32mHello\x1b[39m");
    }

    #[test]
    fn style_open_order_is_fixed() {
        let style = TextStyle {
            fg: Some(Color::Named(NamedColor::Red)),
            bg: Some(Color::Named(NamedColor::Blue)),
            dim: true,
            bold: true,
            italic: true,
            underline: true,
            strikethrough: true,
            inverse: true,
        };
        let styled = style_text("x", &style, ColorSupport::TrueColor);
        assert_eq!(
            styled,
            "\x1b[2m\x1b[31m\x1b[44m\x1b[1m\x1b[3m\x1b[4m\x1b[9m\x1b[7mx\
             \x1b[27m\x1b[29m\x1b[24m\x1b[23m\x1b[22m\x1b[49m\x1b[39m\x1b[22m"
        );
    }

    #[test]
    fn style_rgb_truecolor() {
        let style = TextStyle {
            fg: Some(Color::Rgb {
                r: 255,
                g: 128,
                b: 0,
            }),
            ..TextStyle::default()
        };
        let styled = style_text("x", &style, ColorSupport::TrueColor);
        assert!(styled.starts_with("\x1b[38;2;255;128;0m"));
    }

    #[test]
    fn style_rgb_downgrades_to_palette() {
        let style = TextStyle {
            fg: Some(Color::Rgb { r: 255, g: 0, b: 0 }),
            ..TextStyle::default()
        };
        let styled = style_text("x", &style, ColorSupport::Extended256);
        assert!(styled.starts_with("\x1b[38;5;196m"), "{styled:?}");
    }

    #[test]
    fn style_nocolor_drops_colors_keeps_attrs() {
        let style = TextStyle {
            fg: Some(Color::Named(NamedColor::Red)),
            bold: true,
            ..TextStyle::default()
        };
        let styled = style_text("x", &style, ColorSupport::NoColor);
        assert_eq!(styled, "\x1b[1mx\x1b[22m");
    }

    #[test]
    fn nested_styles_compose() {
        // Outer blue wrapping an inner bold fragment, as a nested Text
        // tree composes it.
        let inner = style_text("B", &TextStyle {
            bold: true,
            ..TextStyle::default()
        }, ColorSupport::TrueColor);
        let blue = TextStyle {
            fg: Some(Color::Named(NamedColor::Blue)),
            ..TextStyle::default()
        };
        let outer = style_text(&format!("A {inner} C"), &blue, ColorSupport::TrueColor);
        assert_eq!(outer, "\x1b[34mA \x1b[1mB\x1b[22m C\x1b[39m");
    }

    #[test]
    fn width_ignores_escapes() {
        assert_eq!(visible_width("\x1b[32mHello\x1b[39m"), 5);
        assert_eq!(visible_width("\x1b[32m\x1b[1m\x1b[22m\x1b[39m"), 0);
    }

    #[test]
    fn width_counts_wide_and_zero_width() {
        assert_eq!(visible_width("\u{4e16}\u{754c}"), 4); // 世界
        assert_eq!(visible_width("e\u{301}"), 1); // e + combining acute
        assert_eq!(visible_width("a\tb"), 2); // control chars are 0
    }

    #[test]
    fn width_empty() {
        assert_eq!(visible_width(""), 0);
    }

    #[test]
    fn strip_removes_escapes() {
        assert_eq!(strip("\x1b[32mHello\x1b[39m"), "Hello");
        assert_eq!(strip("plain"), "plain");
        assert_eq!(strip("\x1b]8;;https://x\x07link\x1b]8;;\x07"), "link");
    }

    #[test]
    fn slice_plain() {
        assert_eq!(slice("hello", 1, 4), "ell");
        assert_eq!(slice("hello", 0, 5), "hello");
        assert_eq!(slice("hello", 3, 3), "");
    }

    #[test]
    fn slice_reopens_active_styles() {
        let s = "\x1b[32mHello\x1b[39m";
        assert_eq!(slice(s, 1, 4), "\x1b[32mell\x1b[39m");
        assert_eq!(slice(s, 0, 5), s);
    }

    #[test]
    fn slice_full_range_roundtrips_bytes() {
        let s = "\x1b[34mA \x1b[1mB\x1b[22m C\x1b[39m";
        assert_eq!(slice(s, 0, visible_width(s)), s);
    }

    #[test]
    fn slice_width_matches_range() {
        let s = "\x1b[2m\x1b[31mabcdef\x1b[39m\x1b[22m";
        for i in 0..=6 {
            for j in i..=6 {
                assert_eq!(visible_width(&slice(s, i, j)), j - i, "({i},{j})");
            }
        }
    }

    #[test]
    fn slice_drops_straddling_wide_char() {
        // 世 is 2 cells at columns 0-1; cutting at 1 drops it.
        let s = "\u{4e16}x";
        assert_eq!(slice(s, 1, 3), "x");
        assert_eq!(slice(s, 0, 1), "");
    }

    #[test]
    fn slice_passes_foreign_sequences() {
        let s = "a\x1b]8;;https://e\x07b\x1b]8;;\x07c";
        let sliced = slice(s, 0, 3);
        assert!(sliced.contains("\x1b]8;;https://e\x07"));
        assert_eq!(strip(&sliced), "abc");
    }

    #[test]
    fn stack_tracks_color_replacement() {
        let mut stack = StyleStack::new();
        stack.apply("\x1b[31m");
        stack.apply("\x1b[34m");
        assert_eq!(stack.entries().len(), 1);
        assert_eq!(stack.open_all(), "\x1b[34m");
    }

    #[test]
    fn stack_close_removes_matching() {
        let mut stack = StyleStack::new();
        stack.apply("\x1b[1m");
        stack.apply("\x1b[31m");
        stack.apply("\x1b[39m");
        assert_eq!(stack.open_all(), "\x1b[1m");
        stack.apply("\x1b[22m");
        assert!(stack.is_empty());
    }

    #[test]
    fn stack_reset_clears() {
        let mut stack = StyleStack::new();
        stack.apply("\x1b[1;31m");
        assert_eq!(stack.entries().len(), 2);
        stack.apply("\x1b[0m");
        assert!(stack.is_empty());
    }

    #[test]
    fn stack_extended_color_is_one_entry() {
        let mut stack = StyleStack::new();
        stack.apply("\x1b[38;2;1;2;3m");
        assert_eq!(stack.entries().len(), 1);
        assert_eq!(stack.entries()[0].open, "\x1b[38;2;1;2;3m");
        assert_eq!(stack.entries()[0].close, 39);
    }

    #[test]
    fn stack_foreign_not_consumed() {
        let mut stack = StyleStack::new();
        assert!(!stack.apply("\x1b[2J"));
        assert!(!stack.apply("\x1b]8;;x\x07"));
        assert!(stack.is_empty());
    }

    #[test]
    fn tokenizer_splits_escapes_and_text() {
        let toks: Vec<_> = tokens("a\x1b[31mb\x1b[39m").collect();
        assert_eq!(
            toks,
            vec![
                AnsiToken::Text("a"),
                AnsiToken::Escape("\x1b[31m"),
                AnsiToken::Text("b"),
                AnsiToken::Escape("\x1b[39m"),
            ]
        );
    }

    #[test]
    fn tokenizer_truncated_escape() {
        let toks: Vec<_> = tokens("a\x1b[3").collect();
        assert_eq!(
            toks,
            vec![AnsiToken::Text("a"), AnsiToken::Escape("\x1b[3")]
        );
    }
}
