//! Flexbox layout adapter.
//!
//! Wraps a [`taffy::TaffyTree`] and maps declarative [`Style`] records to
//! solver attributes. Text nodes carry a measure context that the solver
//! consults during layout; results come back as integer-cell rectangles
//! with per-edge border and padding.

use taffy::style_helpers::{auto, length, percent};
use taffy::{AvailableSpace, TaffyTree, TraversePartialTree};

use crate::error::{NibCoreError, Result};
use crate::style::{
    AlignItems, AlignSelf, Dimension, Display, Edges, FlexDirection, JustifyContent, Position,
    Style,
};
use crate::text::{self, TextWrap};

/// Handle to a node in the layout solver.
pub type LayoutHandle = taffy::NodeId;

/// Measure context installed on `Text` nodes.
///
/// Refreshed before every layout pass with the node's squashed text, so
/// the solver's measure callback stays a pure function of its context.
#[derive(Clone, Debug, Default)]
pub struct MeasureCtx {
    /// Squashed, styled text of the node's subtree.
    pub text: String,
    /// Wrap mode from the node's style.
    pub wrap: TextWrap,
}

/// A computed layout rectangle in integer cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    /// Column offset relative to the parent.
    pub x: u16,
    /// Row offset relative to the parent.
    pub y: u16,
    /// Width in columns.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
    /// Border width per edge (top, right, bottom, left).
    pub border: Edges<u16>,
    /// Padding per edge (top, right, bottom, left).
    pub padding: Edges<u16>,
}

impl Layout {
    /// Width of the content box (inside borders and padding).
    pub fn inner_width(&self) -> u16 {
        self.width
            .saturating_sub(self.border[1] + self.border[3])
            .saturating_sub(self.padding[1] + self.padding[3])
    }

    /// Height of the content box (inside borders and padding).
    pub fn inner_height(&self) -> u16 {
        self.height
            .saturating_sub(self.border[0] + self.border[2])
            .saturating_sub(self.padding[0] + self.padding[2])
    }
}

/// Layout engine backed by the Flexbox solver.
///
/// Node creation defaults to `flex-direction: row` and `flex-wrap: nowrap`;
/// the adapter only writes attributes the style record sets.
pub struct LayoutEngine {
    taffy: TaffyTree<MeasureCtx>,
}

impl LayoutEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self {
            taffy: TaffyTree::new(),
        }
    }

    /// Allocate a leaf handle with the given style.
    pub fn new_leaf(&mut self, style: &Style) -> Result<LayoutHandle> {
        self.taffy
            .new_leaf(to_taffy(style))
            .map_err(|e| NibCoreError::Layout(format!("{e}")))
    }

    /// Allocate a leaf handle carrying a measure context.
    pub fn new_measured_leaf(&mut self, style: &Style) -> Result<LayoutHandle> {
        self.taffy
            .new_leaf_with_context(to_taffy(style), MeasureCtx::default())
            .map_err(|e| NibCoreError::Layout(format!("{e}")))
    }

    /// Push a style record to an existing handle.
    pub fn set_style(&mut self, handle: LayoutHandle, style: &Style) -> Result<()> {
        self.taffy
            .set_style(handle, to_taffy(style))
            .map_err(|e| NibCoreError::Layout(format!("{e}")))
    }

    /// Replace or clear a handle's measure context.
    ///
    /// Marks the node dirty so the solver re-measures instead of reusing
    /// a cached size for the previous text.
    pub fn set_measure_ctx(&mut self, handle: LayoutHandle, ctx: Option<MeasureCtx>) -> Result<()> {
        self.taffy
            .set_node_context(handle, ctx)
            .map_err(|e| NibCoreError::Layout(format!("{e}")))?;
        self.taffy
            .mark_dirty(handle)
            .map_err(|e| NibCoreError::Layout(format!("{e}")))
    }

    /// Insert `child` under `parent` at the given index.
    pub fn insert_child_at(
        &mut self,
        parent: LayoutHandle,
        index: usize,
        child: LayoutHandle,
    ) -> Result<()> {
        self.taffy
            .insert_child_at_index(parent, index, child)
            .map_err(|e| NibCoreError::Layout(format!("{e}")))
    }

    /// Detach `child` from `parent` without freeing it.
    pub fn remove_child(&mut self, parent: LayoutHandle, child: LayoutHandle) -> Result<()> {
        self.taffy
            .remove_child(parent, child)
            .map(|_| ())
            .map_err(|e| NibCoreError::Layout(format!("{e}")))
    }

    /// Free a handle. Must be called exactly once per allocated handle.
    pub fn free(&mut self, handle: LayoutHandle) -> Result<()> {
        self.taffy
            .remove(handle)
            .map(|_| ())
            .map_err(|e| NibCoreError::Layout(format!("{e}")))
    }

    /// Number of children attached to a handle in the solver.
    pub fn child_count(&self, handle: LayoutHandle) -> usize {
        self.taffy.child_count(handle)
    }

    /// Run one layout pass with the given outer width and unconstrained
    /// height.
    pub fn compute(&mut self, root: LayoutHandle, available_width: u16) -> Result<()> {
        let available = taffy::Size {
            width: AvailableSpace::Definite(f32::from(available_width)),
            height: AvailableSpace::MaxContent,
        };
        self.taffy
            .compute_layout_with_measure(
                root,
                available,
                |known, avail, _node, ctx, _style| measure_node(known, avail, ctx),
            )
            .map_err(|e| NibCoreError::Layout(format!("{e}")))
    }

    /// Read back the computed layout of a handle.
    pub fn layout(&self, handle: LayoutHandle) -> Result<Layout> {
        let l = self
            .taffy
            .layout(handle)
            .map_err(|e| NibCoreError::Layout(format!("{e}")))?;
        Ok(Layout {
            x: round_position(l.location.x),
            y: round_position(l.location.y),
            width: round_size(l.size.width),
            height: round_size(l.size.height),
            border: [
                round_size(l.border.top),
                round_size(l.border.right),
                round_size(l.border.bottom),
                round_size(l.border.left),
            ],
            padding: [
                round_size(l.padding.top),
                round_size(l.padding.right),
                round_size(l.padding.bottom),
                round_size(l.padding.left),
            ],
        })
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a text measure request against a node's context.
fn measure_node(
    known: taffy::Size<Option<f32>>,
    avail: taffy::Size<AvailableSpace>,
    ctx: Option<&mut MeasureCtx>,
) -> taffy::Size<f32> {
    let Some(ctx) = ctx else {
        return taffy::Size {
            width: 0.0,
            height: 0.0,
        };
    };
    let max_width = match (known.width, avail.width) {
        (Some(w), _) => w as usize,
        (None, AvailableSpace::Definite(w)) => w as usize,
        (None, AvailableSpace::MaxContent) => usize::MAX,
        (None, AvailableSpace::MinContent) => 1,
    };
    let (w, h) = text::measure(&ctx.text, max_width, ctx.wrap);
    taffy::Size {
        width: w as f32,
        height: h as f32,
    }
}

/// Translate a declarative style record into solver attributes.
fn to_taffy(style: &Style) -> taffy::Style {
    let mut out = taffy::Style::default();

    out.display = match style.display {
        Some(Display::None) => taffy::Display::None,
        _ => taffy::Display::Flex,
    };
    out.position = match style.position {
        Some(Position::Absolute) => taffy::Position::Absolute,
        _ => taffy::Position::Relative,
    };

    out.size = taffy::Size {
        width: dimension(style.width),
        height: dimension(style.height),
    };
    out.min_size = taffy::Size {
        width: dimension(style.min_width),
        height: dimension(style.min_height),
    };
    out.max_size = taffy::Size {
        width: dimension(style.max_width),
        height: dimension(style.max_height),
    };

    if let Some(dir) = style.flex_direction {
        out.flex_direction = match dir {
            FlexDirection::Row => taffy::FlexDirection::Row,
            FlexDirection::RowReverse => taffy::FlexDirection::RowReverse,
            FlexDirection::Column => taffy::FlexDirection::Column,
            FlexDirection::ColumnReverse => taffy::FlexDirection::ColumnReverse,
        };
    }
    if let Some(grow) = style.flex_grow {
        out.flex_grow = grow;
    }
    if let Some(shrink) = style.flex_shrink {
        out.flex_shrink = shrink;
    }
    out.flex_basis = dimension(style.flex_basis);

    out.justify_content = style.justify_content.map(|j| match j {
        JustifyContent::FlexStart => taffy::JustifyContent::FlexStart,
        JustifyContent::FlexEnd => taffy::JustifyContent::FlexEnd,
        JustifyContent::Center => taffy::JustifyContent::Center,
        JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
        JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
    });
    out.align_items = style.align_items.map(|a| match a {
        AlignItems::FlexStart => taffy::AlignItems::FlexStart,
        AlignItems::FlexEnd => taffy::AlignItems::FlexEnd,
        AlignItems::Center => taffy::AlignItems::Center,
        AlignItems::Stretch => taffy::AlignItems::Stretch,
    });
    out.align_self = match style.align_self {
        Some(AlignSelf::FlexStart) => Some(taffy::AlignSelf::FlexStart),
        Some(AlignSelf::FlexEnd) => Some(taffy::AlignSelf::FlexEnd),
        Some(AlignSelf::Center) => Some(taffy::AlignSelf::Center),
        Some(AlignSelf::Auto) | None => None,
    };

    let column = style.column_gap.or(style.gap).unwrap_or(0);
    let row = style.row_gap.or(style.gap).unwrap_or(0);
    out.gap = taffy::Size {
        width: length(f32::from(column)),
        height: length(f32::from(row)),
    };

    let [pt, pr, pb, pl] = style.padding_edges();
    out.padding = taffy::Rect {
        top: length(f32::from(pt)),
        right: length(f32::from(pr)),
        bottom: length(f32::from(pb)),
        left: length(f32::from(pl)),
    };

    let [mt, mr, mb, ml] = style.margin_edges();
    out.margin = taffy::Rect {
        top: length(f32::from(mt)),
        right: length(f32::from(mr)),
        bottom: length(f32::from(mb)),
        left: length(f32::from(ml)),
    };

    // A border consumes one cell on every enabled edge.
    let [bt, br, bb, bl] = style.border_edges();
    out.border = taffy::Rect {
        top: length(if bt { 1.0 } else { 0.0 }),
        right: length(if br { 1.0 } else { 0.0 }),
        bottom: length(if bb { 1.0 } else { 0.0 }),
        left: length(if bl { 1.0 } else { 0.0 }),
    };

    // Overflow is consumed by the compositor and never affects layout.

    out
}

/// Map an optional dimension to a solver dimension.
fn dimension(d: Option<Dimension>) -> taffy::Dimension {
    match d {
        Some(Dimension::Cells(n)) => length(f32::from(n)),
        Some(Dimension::Percent(p)) => percent(p / 100.0),
        Some(Dimension::Auto) | None => auto(),
    }
}

/// Floor a position value to integer cells, clamping negatives.
fn round_position(value: f32) -> u16 {
    if value < 0.0 {
        0
    } else if value > f32::from(u16::MAX) {
        u16::MAX
    } else {
        value.floor() as u16
    }
}

/// Round a size value to the nearest integer cell.
fn round_size(value: f32) -> u16 {
    if value < 0.0 {
        0
    } else if value > f32::from(u16::MAX) {
        u16::MAX
    } else {
        value.round() as u16
    }
}
