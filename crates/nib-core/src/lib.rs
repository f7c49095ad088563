//! nib-core: a retained-mode terminal UI rendering core.
//!
//! This crate provides the rendering pipeline of a declarative terminal
//! UI framework: a reconciler host-config over a persistent node tree,
//! Flexbox layout with ANSI-aware text measurement, an output compositor
//! with clipping and borders, and a frame driver that rate-limits
//! redraws and patches the terminal in place.

pub mod ansi;
pub mod border;
pub mod canvas;
pub mod color;
pub mod compositor;
pub mod error;
pub mod layout;
pub mod node;
pub mod reconciler;
pub mod screen;
pub mod style;
pub mod terminal;
pub mod text;
pub mod throttle;

pub use ansi::{TextStyle, slice, strip, style_text, visible_width};
pub use canvas::{Canvas, Clip};
pub use color::{Color, ColorSupport, NamedColor};
pub use compositor::{Composed, ComposeOptions, Frame, compose, render_frame};
pub use error::{NibCoreError, Result};
pub use layout::{Layout, LayoutEngine, MeasureCtx};
pub use node::{ATTR_STATIC, AttrValue, Node, NodeId, NodeKind, TextTransform, Tree};
pub use reconciler::{
    ElementKind, HostContext, Priority, Props, Reconciler, RenderSink, UpdatePayload,
    get_current_event_priority, prepare_update, resolve_update_priority,
    set_current_update_priority,
};
pub use screen::{FrameSink, Screen, ScreenOptions};
pub use style::{
    AlignItems, AlignSelf, BorderChars, BorderKind, Dimension, Display, Edges, FlexDirection,
    JustifyContent, Overflow, Position, Style,
};
pub use terminal::{CrosstermBackend, DEFAULT_COLUMNS, Terminal, TestBackend};
pub use text::{TextWrap, measure, wrap};
pub use throttle::{RENDER_WINDOW, Throttle};
