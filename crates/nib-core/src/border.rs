//! Box border rendering.
//!
//! Draws box-drawing glyphs around a node's outer rectangle. Corner
//! glyphs are drawn as part of the horizontal lines, so a corner shared
//! with a side edge always takes the horizontal edge's color and dim
//! flag, and partially disabled borders stay unambiguous.

use crate::ansi::{TextStyle, style_text};
use crate::canvas::Canvas;
use crate::color::ColorSupport;
use crate::layout::Layout;
use crate::style::{BorderChars, BorderKind, Style};

/// Glyph set for a named border kind.
pub fn glyphs(kind: &BorderKind) -> BorderChars {
    match kind {
        BorderKind::Single => BorderChars {
            top_left: '┌',
            top: '─',
            top_right: '┐',
            left: '│',
            right: '│',
            bottom_left: '└',
            bottom: '─',
            bottom_right: '┘',
        },
        BorderKind::Double => BorderChars {
            top_left: '╔',
            top: '═',
            top_right: '╗',
            left: '║',
            right: '║',
            bottom_left: '╚',
            bottom: '═',
            bottom_right: '╝',
        },
        BorderKind::Round => BorderChars {
            top_left: '╭',
            top: '─',
            top_right: '╮',
            left: '│',
            right: '│',
            bottom_left: '╰',
            bottom: '─',
            bottom_right: '╯',
        },
        BorderKind::Bold => BorderChars {
            top_left: '┏',
            top: '━',
            top_right: '┓',
            left: '┃',
            right: '┃',
            bottom_left: '┗',
            bottom: '━',
            bottom_right: '┛',
        },
        BorderKind::Custom(chars) => *chars,
    }
}

/// Draw the enabled border edges of a node at `(x, y)` on the canvas.
pub fn render_border(
    canvas: &mut Canvas,
    x: i32,
    y: i32,
    layout: &Layout,
    style: &Style,
    support: ColorSupport,
) {
    let [top, right, bottom, left] = style.border_edges();
    if !(top || right || bottom || left) {
        return;
    }
    let Some(kind) = &style.border_style else {
        return;
    };
    if layout.width == 0 || layout.height == 0 {
        return;
    }

    let chars = glyphs(kind);
    let colors = style.border_edge_colors();
    let dims = style.border_edge_dim();
    let edge_style = |edge: usize| TextStyle {
        fg: colors[edge],
        dim: dims[edge],
        ..TextStyle::default()
    };

    let width = usize::from(layout.width);
    let height = i32::from(layout.height);

    if top {
        let mut line = String::with_capacity(width * 3);
        if left {
            line.push(chars.top_left);
        }
        let run = width - usize::from(left) - usize::from(right);
        line.extend(std::iter::repeat_n(chars.top, run));
        if right {
            line.push(chars.top_right);
        }
        canvas.write(x, y, &style_text(&line, &edge_style(0), support));
    }

    let side_top = y + i32::from(top);
    let side_bottom = y + height - i32::from(bottom);
    if left {
        let glyph = style_text(&chars.left.to_string(), &edge_style(3), support);
        for row in side_top..side_bottom {
            canvas.write(x, row, &glyph);
        }
    }
    if right {
        let glyph = style_text(&chars.right.to_string(), &edge_style(1), support);
        for row in side_top..side_bottom {
            canvas.write(x + layout.width as i32 - 1, row, &glyph);
        }
    }

    if bottom && height > 1 {
        let mut line = String::with_capacity(width * 3);
        if left {
            line.push(chars.bottom_left);
        }
        let run = width - usize::from(left) - usize::from(right);
        line.extend(std::iter::repeat_n(chars.bottom, run));
        if right {
            line.push(chars.bottom_right);
        }
        canvas.write(x, y + height - 1, &style_text(&line, &edge_style(2), support));
    }
}
