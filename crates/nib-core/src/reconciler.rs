//! Host-config surface of the retained-mode diffing runtime.
//!
//! The surrounding framework performs the element-tree diff and delivers
//! mutations through the named callbacks here: instance creation (with
//! text-context switching), container ops, prop diffing, and the commit
//! lifecycle. `reset_after_commit` drives exactly one repaint per commit
//! through a [`RenderSink`] installed by the frame driver.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{NibCoreError, Result};
use crate::node::{AttrValue, NodeId, NodeKind, TextTransform, Tree};
use crate::style::Style;

/// The element kinds a host can instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Generic container element.
    Box,
    /// Inline text element.
    Text,
}

/// Host context threaded through instance creation.
///
/// Identity is preserved while the flag does not change, so the runtime
/// can skip propagation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostContext {
    /// Whether creation happens under a `Text` ancestor.
    pub inside_text: bool,
}

/// Update priorities exposed to the host scheduler.
///
/// These are a batching back-channel only; they do not affect
/// correctness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Discrete user interaction.
    Discrete,
    /// Continuous user interaction.
    Continuous,
    /// Ordinary update.
    #[default]
    Default,
    /// Background work.
    Idle,
}

thread_local! {
    static CURRENT_PRIORITY: Cell<Option<Priority>> = const { Cell::new(None) };
}

/// The priority of the event currently being processed.
pub fn get_current_event_priority() -> Priority {
    CURRENT_PRIORITY.with(|p| p.get()).unwrap_or_default()
}

/// Resolve the priority the current update should batch under.
pub fn resolve_update_priority() -> Priority {
    CURRENT_PRIORITY.with(|p| p.get()).unwrap_or_default()
}

/// Set or clear the current update priority.
pub fn set_current_update_priority(priority: Option<Priority>) {
    CURRENT_PRIORITY.with(|p| p.set(priority));
}

/// Props delivered by the host for one element instance.
#[derive(Clone, Default)]
pub struct Props {
    /// Declarative style record.
    pub style: Style,
    /// Optional per-line text transform.
    pub transform: Option<TextTransform>,
    /// Remaining opaque props, stored as attributes.
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Props {
    /// Create empty props.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the style record.
    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Set the text transform.
    #[must_use]
    pub fn transform(mut self, transform: TextTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Add an attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("style", &self.style)
            .field("has_transform", &self.transform.is_some())
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// The differing keys between two prop records.
#[derive(Clone, Default)]
pub struct UpdatePayload {
    /// New style record, present when any style field differs.
    pub style: Option<Style>,
    /// New transform, present when the transform identity changed.
    pub transform: Option<Option<TextTransform>>,
    /// Attribute changes; `None` values remove the key.
    pub attributes: Vec<(String, Option<AttrValue>)>,
}

impl fmt::Debug for UpdatePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdatePayload")
            .field("style", &self.style)
            .field("transform_changed", &self.transform.is_some())
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Diff two prop records.
///
/// Keys present in `old` but missing in `new` are recorded as removals;
/// keys whose value differs are included with the new value. The style
/// record is sub-diffed as a whole so layout can be patched in one call.
/// Returns `None` when nothing differs.
pub fn prepare_update(old: &Props, new: &Props) -> Option<UpdatePayload> {
    let style = (old.style != new.style).then(|| new.style.clone());

    let transform = if same_transform(&old.transform, &new.transform) {
        None
    } else {
        Some(new.transform.clone())
    };

    let mut attributes: Vec<(String, Option<AttrValue>)> = Vec::new();
    for key in old.attributes.keys() {
        if !new.attributes.contains_key(key) {
            attributes.push((key.clone(), None));
        }
    }
    for (key, value) in &new.attributes {
        if old.attributes.get(key) != Some(value) {
            attributes.push((key.clone(), Some(value.clone())));
        }
    }

    if style.is_none() && transform.is_none() && attributes.is_empty() {
        return None;
    }
    Some(UpdatePayload {
        style,
        transform,
        attributes,
    })
}

/// Transform identity comparison.
fn same_transform(a: &Option<TextTransform>, b: &Option<TextTransform>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

/// The driver-installed commit hooks of the root node.
pub trait RenderSink {
    /// Recompute layout for the whole tree.
    fn compute_layout(&mut self, tree: &mut Tree, root: NodeId) -> Result<()>;
    /// Paint one frame through the rate limiter.
    fn render(&mut self, tree: &mut Tree, root: NodeId) -> Result<()>;
    /// Paint one frame immediately, bypassing the rate limiter.
    fn immediate_render(&mut self, tree: &mut Tree, root: NodeId) -> Result<()>;
}

/// The host-side of the diffing runtime: owns the node tree and applies
/// mutations delivered by the framework.
pub struct Reconciler<S: RenderSink> {
    tree: Tree,
    root: NodeId,
    sink: S,
}

impl<S: RenderSink> Reconciler<S> {
    /// Create a reconciler with a fresh tree and root.
    pub fn new(sink: S) -> Result<Self> {
        let mut tree = Tree::new();
        let root = tree.create_node(NodeKind::Root)?;
        Ok(Self { tree, root, sink })
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrow the node tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Borrow the node tree mutably.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Borrow the render sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Borrow the render sink mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Split borrows for driver-level operations.
    pub(crate) fn parts(&mut self) -> (&mut Tree, NodeId, &mut S) {
        (&mut self.tree, self.root, &mut self.sink)
    }

    /// The context the container root provides.
    pub fn get_root_host_context(&self) -> HostContext {
        HostContext::default()
    }

    /// The context children of an element of `kind` see.
    pub fn get_child_host_context(&self, parent: HostContext, kind: ElementKind) -> HostContext {
        let inside_text = kind == ElementKind::Text;
        if parent.inside_text == inside_text {
            parent
        } else {
            HostContext { inside_text }
        }
    }

    /// Allocate a node for an element.
    ///
    /// Inside text content an inline-text element collapses to virtual
    /// text; a box there violates the text-subtree invariant and aborts
    /// the commit.
    pub fn create_instance(
        &mut self,
        kind: ElementKind,
        props: &Props,
        ctx: HostContext,
    ) -> Result<NodeId> {
        let node_kind = match (kind, ctx.inside_text) {
            (ElementKind::Text, true) => NodeKind::VirtualText,
            (ElementKind::Text, false) => NodeKind::Text,
            (ElementKind::Box, false) => NodeKind::Box,
            (ElementKind::Box, true) => {
                return Err(NibCoreError::Invariant(
                    "box element created inside text content".into(),
                ));
            }
        };
        let id = self.tree.create_node(node_kind)?;
        self.tree.set_style(id, props.style.clone())?;
        self.tree.set_transform(id, props.transform.clone());
        for (key, value) in &props.attributes {
            self.tree.set_attribute(id, key, Some(value.clone()));
        }
        Ok(id)
    }

    /// Allocate a raw text leaf. Fatal outside a text ancestor.
    pub fn create_text_instance(&mut self, text: &str, ctx: HostContext) -> Result<NodeId> {
        if !ctx.inside_text {
            return Err(NibCoreError::Invariant(format!(
                "text node {text:?} created outside a text ancestor"
            )));
        }
        let id = self.tree.create_node(NodeKind::TextLeaf)?;
        self.tree.set_text(id, text)?;
        Ok(id)
    }

    /// Append during initial mount.
    pub fn append_initial_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.tree.append_child(parent, child)
    }

    /// Append after mount.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.tree.append_child(parent, child)
    }

    /// Append directly to the root container.
    pub fn append_child_to_container(&mut self, child: NodeId) -> Result<()> {
        self.tree.append_child(self.root, child)
    }

    /// Insert `child` before `anchor` under `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, anchor: NodeId) -> Result<()> {
        self.tree.insert_before(parent, child, anchor)
    }

    /// Insert `child` before `anchor` in the root container.
    pub fn insert_in_container_before(&mut self, child: NodeId, anchor: NodeId) -> Result<()> {
        self.tree.insert_before(self.root, child, anchor)
    }

    /// Record the deletion of `child`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.tree.remove_child(parent, child)
    }

    /// Record the deletion of a root-level child.
    pub fn remove_child_from_container(&mut self, child: NodeId) -> Result<()> {
        self.tree.remove_child(self.root, child)
    }

    /// Apply a prepared update payload to a node.
    pub fn commit_update(&mut self, node: NodeId, payload: &UpdatePayload) -> Result<()> {
        if let Some(style) = &payload.style {
            self.tree.set_style(node, style.clone())?;
        }
        if let Some(transform) = &payload.transform {
            self.tree.set_transform(node, transform.clone());
        }
        for (key, value) in &payload.attributes {
            self.tree.set_attribute(node, key, value.clone());
        }
        Ok(())
    }

    /// Clear a text leaf's value.
    pub fn reset_text_content(&mut self, node: NodeId) -> Result<()> {
        self.tree.set_text(node, "")
    }

    /// Replace a text leaf's value.
    pub fn commit_text_update(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.tree.set_text(node, text)
    }

    /// Called before the framework applies a mutation batch.
    pub fn prepare_for_commit(&mut self) {}

    /// Called once per commit regardless of whether any host node
    /// changed. Drives exactly one repaint: layout first, then the
    /// immediate path when a static subtree grew (so static content
    /// reaches the terminal on the same commit, bypassing the rate
    /// limiter), otherwise the rate-limited render.
    pub fn reset_after_commit(&mut self) -> Result<()> {
        self.tree.sweep_detached()?;
        self.sink.compute_layout(&mut self.tree, self.root)?;
        if self.tree.take_static_dirty(self.root) {
            tracing::debug!("static subtree grew; immediate render");
            return self.sink.immediate_render(&mut self.tree, self.root);
        }
        self.sink.render(&mut self.tree, self.root)
    }
}
