//! Declarative style records.
//!
//! Styles are sparse key→value records produced by component authors,
//! modelled as a struct of optionals with a builder. The reconciler's
//! style diff reduces to a whole-record comparison, and unset fields fall
//! back to solver defaults.

use crate::ansi::TextStyle;
use crate::color::Color;
use crate::text::TextWrap;

/// A size along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dimension {
    /// Absolute size in cells.
    Cells(u16),
    /// Percentage of the parent (0-100).
    Percent(f32),
    /// Sized by content / solver.
    Auto,
}

/// Main-axis direction of a flex container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FlexDirection {
    /// Left to right.
    #[default]
    Row,
    /// Right to left.
    RowReverse,
    /// Top to bottom.
    Column,
    /// Bottom to top.
    ColumnReverse,
}

/// Main-axis distribution of free space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JustifyContent {
    /// Pack children at the start.
    FlexStart,
    /// Pack children at the end.
    FlexEnd,
    /// Center children.
    Center,
    /// Even gaps between children.
    SpaceBetween,
    /// Even gaps around children.
    SpaceAround,
}

/// Cross-axis alignment of children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlignItems {
    /// Align to the cross-axis start.
    FlexStart,
    /// Align to the cross-axis end.
    FlexEnd,
    /// Center on the cross axis.
    Center,
    /// Stretch to fill the cross axis.
    Stretch,
}

/// Per-child override of [`AlignItems`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlignSelf {
    /// Inherit the parent's alignment.
    Auto,
    /// Align to the cross-axis start.
    FlexStart,
    /// Align to the cross-axis end.
    FlexEnd,
    /// Center on the cross axis.
    Center,
}

/// Positioning scheme of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Position {
    /// Placed by the parent's flex flow.
    #[default]
    Relative,
    /// Taken out of the flow; siblings lay out as if it were absent.
    Absolute,
}

/// Whether a node participates in layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Display {
    /// Flexbox layout.
    #[default]
    Flex,
    /// Removed from layout and composition.
    None,
}

/// Content clipping behaviour on one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Overflow {
    /// Content may paint outside the node's rectangle.
    #[default]
    Visible,
    /// Content outside the inner rectangle is clipped.
    Hidden,
}

/// The glyph set used to draw a border.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BorderKind {
    /// `┌─┐` light box drawing.
    Single,
    /// `╔═╗` double lines.
    Double,
    /// `╭─╮` rounded corners.
    Round,
    /// `┏━┓` heavy lines.
    Bold,
    /// A caller-supplied glyph set.
    Custom(BorderChars),
}

/// The eight glyphs of a box border.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BorderChars {
    /// Top-left corner.
    pub top_left: char,
    /// Horizontal top edge.
    pub top: char,
    /// Top-right corner.
    pub top_right: char,
    /// Vertical left edge.
    pub left: char,
    /// Vertical right edge.
    pub right: char,
    /// Bottom-left corner.
    pub bottom_left: char,
    /// Horizontal bottom edge.
    pub bottom: char,
    /// Bottom-right corner.
    pub bottom_right: char,
}

/// Box-model edges in top, right, bottom, left order.
pub type Edges<T> = [T; 4];

/// A sparse declarative style record.
///
/// Every field is optional; unset fields keep the solver's or codec's
/// default. Equality is field-by-field, which is what the reconciler's
/// style diff relies on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Style {
    /// Layout participation.
    pub display: Option<Display>,
    /// Positioning scheme.
    pub position: Option<Position>,
    /// Preferred width.
    pub width: Option<Dimension>,
    /// Preferred height.
    pub height: Option<Dimension>,
    /// Minimum width.
    pub min_width: Option<Dimension>,
    /// Minimum height.
    pub min_height: Option<Dimension>,
    /// Maximum width.
    pub max_width: Option<Dimension>,
    /// Maximum height.
    pub max_height: Option<Dimension>,
    /// Main-axis direction.
    pub flex_direction: Option<FlexDirection>,
    /// Growth factor.
    pub flex_grow: Option<f32>,
    /// Shrink factor.
    pub flex_shrink: Option<f32>,
    /// Flex basis.
    pub flex_basis: Option<Dimension>,
    /// Main-axis distribution.
    pub justify_content: Option<JustifyContent>,
    /// Cross-axis alignment of children.
    pub align_items: Option<AlignItems>,
    /// Per-child alignment override.
    pub align_self: Option<AlignSelf>,
    /// Gutter on both axes.
    pub gap: Option<u16>,
    /// Column gutter.
    pub column_gap: Option<u16>,
    /// Row gutter.
    pub row_gap: Option<u16>,

    /// Padding shorthand for all edges.
    pub padding: Option<u16>,
    /// Horizontal padding shorthand.
    pub padding_x: Option<u16>,
    /// Vertical padding shorthand.
    pub padding_y: Option<u16>,
    /// Top padding.
    pub padding_top: Option<u16>,
    /// Right padding.
    pub padding_right: Option<u16>,
    /// Bottom padding.
    pub padding_bottom: Option<u16>,
    /// Left padding.
    pub padding_left: Option<u16>,

    /// Margin shorthand for all edges.
    pub margin: Option<u16>,
    /// Horizontal margin shorthand.
    pub margin_x: Option<u16>,
    /// Vertical margin shorthand.
    pub margin_y: Option<u16>,
    /// Top margin.
    pub margin_top: Option<u16>,
    /// Right margin.
    pub margin_right: Option<u16>,
    /// Bottom margin.
    pub margin_bottom: Option<u16>,
    /// Left margin.
    pub margin_left: Option<u16>,

    /// Border glyph set; setting it enables all four edges.
    pub border_style: Option<BorderKind>,
    /// Top edge enable override.
    pub border_top: Option<bool>,
    /// Right edge enable override.
    pub border_right: Option<bool>,
    /// Bottom edge enable override.
    pub border_bottom: Option<bool>,
    /// Left edge enable override.
    pub border_left: Option<bool>,
    /// Border color for all edges.
    pub border_color: Option<Color>,
    /// Top edge color override.
    pub border_top_color: Option<Color>,
    /// Right edge color override.
    pub border_right_color: Option<Color>,
    /// Bottom edge color override.
    pub border_bottom_color: Option<Color>,
    /// Left edge color override.
    pub border_left_color: Option<Color>,
    /// Dim the border on all edges.
    pub border_dim: Option<bool>,
    /// Top edge dim override.
    pub border_top_dim: Option<bool>,
    /// Right edge dim override.
    pub border_right_dim: Option<bool>,
    /// Bottom edge dim override.
    pub border_bottom_dim: Option<bool>,
    /// Left edge dim override.
    pub border_left_dim: Option<bool>,

    /// Clipping shorthand for both axes.
    pub overflow: Option<Overflow>,
    /// Horizontal clipping.
    pub overflow_x: Option<Overflow>,
    /// Vertical clipping.
    pub overflow_y: Option<Overflow>,

    /// Wrapping behaviour of text content.
    pub text_wrap: Option<TextWrap>,

    /// Foreground color of text content.
    pub color: Option<Color>,
    /// Background color of text content.
    pub background_color: Option<Color>,
    /// Dim text.
    pub dim: bool,
    /// Bold text.
    pub bold: bool,
    /// Italic text.
    pub italic: bool,
    /// Underlined text.
    pub underline: bool,
    /// Strikethrough text.
    pub strikethrough: bool,
    /// Reverse video text.
    pub inverse: bool,
}

impl Style {
    /// Create an empty style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the preferred width in cells.
    #[must_use]
    pub fn width(mut self, cells: u16) -> Self {
        self.width = Some(Dimension::Cells(cells));
        self
    }

    /// Set the preferred height in cells.
    #[must_use]
    pub fn height(mut self, cells: u16) -> Self {
        self.height = Some(Dimension::Cells(cells));
        self
    }

    /// Set the preferred width as a percentage of the parent.
    #[must_use]
    pub fn width_percent(mut self, percent: f32) -> Self {
        self.width = Some(Dimension::Percent(percent));
        self
    }

    /// Set the preferred height as a percentage of the parent.
    #[must_use]
    pub fn height_percent(mut self, percent: f32) -> Self {
        self.height = Some(Dimension::Percent(percent));
        self
    }

    /// Set the main-axis direction.
    #[must_use]
    pub fn flex_direction(mut self, dir: FlexDirection) -> Self {
        self.flex_direction = Some(dir);
        self
    }

    /// Set the growth factor.
    #[must_use]
    pub fn flex_grow(mut self, grow: f32) -> Self {
        self.flex_grow = Some(grow);
        self
    }

    /// Set the main-axis distribution.
    #[must_use]
    pub fn justify_content(mut self, justify: JustifyContent) -> Self {
        self.justify_content = Some(justify);
        self
    }

    /// Set the cross-axis alignment.
    #[must_use]
    pub fn align_items(mut self, align: AlignItems) -> Self {
        self.align_items = Some(align);
        self
    }

    /// Set the gutter on both axes.
    #[must_use]
    pub fn gap(mut self, cells: u16) -> Self {
        self.gap = Some(cells);
        self
    }

    /// Set padding on all edges.
    #[must_use]
    pub fn padding(mut self, cells: u16) -> Self {
        self.padding = Some(cells);
        self
    }

    /// Set margin on all edges.
    #[must_use]
    pub fn margin(mut self, cells: u16) -> Self {
        self.margin = Some(cells);
        self
    }

    /// Enable a border with the given glyph set.
    #[must_use]
    pub fn border(mut self, kind: BorderKind) -> Self {
        self.border_style = Some(kind);
        self
    }

    /// Set the border color on all edges.
    #[must_use]
    pub fn border_color(mut self, color: Color) -> Self {
        self.border_color = Some(color);
        self
    }

    /// Set layout participation.
    #[must_use]
    pub fn display(mut self, display: Display) -> Self {
        self.display = Some(display);
        self
    }

    /// Set the positioning scheme.
    #[must_use]
    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Set horizontal clipping.
    #[must_use]
    pub fn overflow_x(mut self, overflow: Overflow) -> Self {
        self.overflow_x = Some(overflow);
        self
    }

    /// Set vertical clipping.
    #[must_use]
    pub fn overflow_y(mut self, overflow: Overflow) -> Self {
        self.overflow_y = Some(overflow);
        self
    }

    /// Set the text wrapping behaviour.
    #[must_use]
    pub fn text_wrap(mut self, wrap: TextWrap) -> Self {
        self.text_wrap = Some(wrap);
        self
    }

    /// Set the text foreground color.
    #[must_use]
    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the text background color.
    #[must_use]
    pub fn background_color(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    /// Set bold.
    #[must_use]
    pub fn bold(mut self, val: bool) -> Self {
        self.bold = val;
        self
    }

    /// Set dim.
    #[must_use]
    pub fn dim(mut self, val: bool) -> Self {
        self.dim = val;
        self
    }

    /// Set italic.
    #[must_use]
    pub fn italic(mut self, val: bool) -> Self {
        self.italic = val;
        self
    }

    /// Set underline.
    #[must_use]
    pub fn underline(mut self, val: bool) -> Self {
        self.underline = val;
        self
    }

    /// Set strikethrough.
    #[must_use]
    pub fn strikethrough(mut self, val: bool) -> Self {
        self.strikethrough = val;
        self
    }

    /// Set reverse video.
    #[must_use]
    pub fn inverse(mut self, val: bool) -> Self {
        self.inverse = val;
        self
    }

    /// The text-styling dimensions of this record, for the ANSI codec.
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            fg: self.color,
            bg: self.background_color,
            dim: self.dim,
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            strikethrough: self.strikethrough,
            inverse: self.inverse,
        }
    }

    /// Resolved padding per edge (top, right, bottom, left).
    ///
    /// Specific edges win over axis shorthands, which win over the
    /// all-edges shorthand.
    pub fn padding_edges(&self) -> Edges<u16> {
        let base = self.padding.unwrap_or(0);
        let x = self.padding_x.unwrap_or(base);
        let y = self.padding_y.unwrap_or(base);
        [
            self.padding_top.unwrap_or(y),
            self.padding_right.unwrap_or(x),
            self.padding_bottom.unwrap_or(y),
            self.padding_left.unwrap_or(x),
        ]
    }

    /// Resolved margin per edge (top, right, bottom, left).
    pub fn margin_edges(&self) -> Edges<u16> {
        let base = self.margin.unwrap_or(0);
        let x = self.margin_x.unwrap_or(base);
        let y = self.margin_y.unwrap_or(base);
        [
            self.margin_top.unwrap_or(y),
            self.margin_right.unwrap_or(x),
            self.margin_bottom.unwrap_or(y),
            self.margin_left.unwrap_or(x),
        ]
    }

    /// Which border edges are enabled (top, right, bottom, left).
    ///
    /// A border exists on an edge when a glyph set is configured and the
    /// edge has not been explicitly disabled.
    pub fn border_edges(&self) -> Edges<bool> {
        if self.border_style.is_none() {
            return [false; 4];
        }
        [
            self.border_top.unwrap_or(true),
            self.border_right.unwrap_or(true),
            self.border_bottom.unwrap_or(true),
            self.border_left.unwrap_or(true),
        ]
    }

    /// Border color per edge (top, right, bottom, left).
    pub fn border_edge_colors(&self) -> Edges<Option<Color>> {
        [
            self.border_top_color.or(self.border_color),
            self.border_right_color.or(self.border_color),
            self.border_bottom_color.or(self.border_color),
            self.border_left_color.or(self.border_color),
        ]
    }

    /// Border dim flag per edge (top, right, bottom, left).
    pub fn border_edge_dim(&self) -> Edges<bool> {
        let base = self.border_dim.unwrap_or(false);
        [
            self.border_top_dim.unwrap_or(base),
            self.border_right_dim.unwrap_or(base),
            self.border_bottom_dim.unwrap_or(base),
            self.border_left_dim.unwrap_or(base),
        ]
    }

    /// Resolved horizontal clipping.
    pub fn resolved_overflow_x(&self) -> Overflow {
        self.overflow_x.or(self.overflow).unwrap_or_default()
    }

    /// Resolved vertical clipping.
    pub fn resolved_overflow_y(&self) -> Overflow {
        self.overflow_y.or(self.overflow).unwrap_or_default()
    }
}
