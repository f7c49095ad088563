//! Output compositor.
//!
//! Walks the laid-out node tree in pre-order, accumulating ancestor
//! offsets, painting borders, pushing clip rectangles for hidden
//! overflow, and writing squashed, wrapped, transformed text onto the
//! canvas. Produces a single styled string plus its height, with the
//! static region composed separately.

use crate::ansi::style_text;
use crate::border;
use crate::canvas::{Canvas, Clip};
use crate::color::ColorSupport;
use crate::error::Result;
use crate::node::{NodeId, NodeKind, Tree};
use crate::style::{Display, Overflow};
use crate::text;

/// Compositor options.
#[derive(Clone, Copy, Debug)]
pub struct ComposeOptions {
    /// Skip subtrees carrying the `static` marker.
    pub skip_static: bool,
    /// Color capability used when emitting styles.
    pub color: ColorSupport,
}

/// A composed region: styled output plus line count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Composed {
    /// Styled output, rows joined with `\n`.
    pub output: String,
    /// Number of rows.
    pub height: usize,
}

/// A full frame: the dynamic region plus the static region, composed
/// separately so the driver can append static content above the diffed
/// area.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// Dynamic region output.
    pub output: String,
    /// Dynamic region height in rows.
    pub height: usize,
    /// Static region output; empty when no static subtree produced rows.
    pub static_output: String,
    /// Static region height in rows.
    pub static_height: usize,
}

impl Frame {
    /// Whether this frame carries new static rows.
    pub fn has_static(&self) -> bool {
        self.static_height > 0
    }
}

/// Compose the subtree under `root` into a single styled string.
pub fn compose(tree: &Tree, root: NodeId, opts: &ComposeOptions) -> Result<Composed> {
    let mut canvas = Canvas::new();
    walk(tree, root, 0, 0, &mut canvas, opts)?;
    let (output, height) = canvas.render();
    Ok(Composed { output, height })
}

/// Compose both regions of a frame: the dynamic tree (static subtrees
/// skipped) and the static subtree rooted at its own origin.
pub fn render_frame(tree: &Tree, root: NodeId, color: ColorSupport) -> Result<Frame> {
    let main = compose(
        tree,
        root,
        &ComposeOptions {
            skip_static: true,
            color,
        },
    )?;

    let mut static_output = String::new();
    let mut static_height = 0;
    if let Some(static_node) = find_static(tree, root) {
        let layout = tree.layout_of(static_node)?;
        let mut canvas = Canvas::new();
        walk(
            tree,
            static_node,
            -i32::from(layout.x),
            -i32::from(layout.y),
            &mut canvas,
            &ComposeOptions {
                skip_static: false,
                color,
            },
        )?;
        let (out, height) = canvas.render();
        static_output = out;
        static_height = height;
    }

    Ok(Frame {
        output: main.output,
        height: main.height,
        static_output,
        static_height,
    })
}

/// Squash a text subtree into one string.
///
/// Text leaves concatenate in order; nested `Text`/`VirtualText`
/// fragments are styled and transformed innermost-first, so an enclosing
/// transform sees the ANSI codes its inner siblings produced.
pub fn squash_text(tree: &Tree, id: NodeId, support: ColorSupport) -> String {
    let Some(node) = tree.node(id) else {
        return String::new();
    };
    let mut out = String::new();
    for &child in &node.children {
        let Some(c) = tree.node(child) else {
            continue;
        };
        match c.kind {
            NodeKind::TextLeaf => out.push_str(&c.text),
            NodeKind::Text | NodeKind::VirtualText => {
                let inner = squash_text(tree, child, support);
                let styled = style_text(&inner, &c.style.text_style(), support);
                match &c.transform {
                    Some(transform) if !styled.is_empty() => {
                        out.push_str(&transform(&styled, 0));
                    }
                    _ => out.push_str(&styled),
                }
            }
            _ => {}
        }
    }
    out
}

/// Pre-order search for the first node carrying the `static` marker.
fn find_static(tree: &Tree, id: NodeId) -> Option<NodeId> {
    let node = tree.node(id)?;
    if node.is_static() {
        return Some(id);
    }
    for &child in &node.children {
        if let Some(found) = find_static(tree, child) {
            return Some(found);
        }
    }
    None
}

/// Recursive traversal writing one node and its children.
fn walk(
    tree: &Tree,
    id: NodeId,
    base_x: i32,
    base_y: i32,
    canvas: &mut Canvas,
    opts: &ComposeOptions,
) -> Result<()> {
    let Some(node) = tree.node(id) else {
        return Ok(());
    };
    if node.style.display == Some(Display::None) {
        return Ok(());
    }
    if opts.skip_static && node.is_static() {
        return Ok(());
    }
    if !node.kind.has_layout() {
        // Virtual text and leaves are composed by their Text ancestor.
        return Ok(());
    }

    let layout = tree.layout_of(id)?;
    let x = base_x + i32::from(layout.x);
    let y = base_y + i32::from(layout.y);

    border::render_border(canvas, x, y, &layout, &node.style, opts.color);

    let clip_x = node.style.resolved_overflow_x() == Overflow::Hidden;
    let clip_y = node.style.resolved_overflow_y() == Overflow::Hidden;
    let clipped = clip_x || clip_y;
    if clipped {
        let inner_x = x + i32::from(layout.border[3]) + i32::from(layout.padding[3]);
        let inner_y = y + i32::from(layout.border[0]) + i32::from(layout.padding[0]);
        canvas.push_clip(Clip {
            x1: clip_x.then_some(inner_x.max(0) as usize),
            x2: clip_x.then_some(
                (inner_x + i32::from(layout.inner_width())).max(0) as usize,
            ),
            y1: clip_y.then_some(inner_y.max(0) as usize),
            y2: clip_y.then_some(
                (inner_y + i32::from(layout.inner_height())).max(0) as usize,
            ),
        });
    }

    if node.kind == NodeKind::Text {
        let content = squash_text(tree, id, opts.color);
        if !content.is_empty() {
            let styled = style_text(&content, &node.style.text_style(), opts.color);
            let wrapped = text::wrap(
                &styled,
                usize::from(layout.inner_width()),
                node.wrap_mode(),
            );
            let tx = x + i32::from(layout.border[3]) + i32::from(layout.padding[3]);
            let ty = y + i32::from(layout.border[0]) + i32::from(layout.padding[0]);
            for (i, line) in wrapped.split('\n').enumerate() {
                match &node.transform {
                    Some(transform) => canvas.write(tx, ty + i as i32, &transform(line, i)),
                    None => canvas.write(tx, ty + i as i32, line),
                }
            }
        }
    } else {
        for &child in &node.children {
            walk(tree, child, x, y, canvas, opts)?;
        }
    }

    if clipped {
        canvas.pop_clip();
    }
    Ok(())
}
