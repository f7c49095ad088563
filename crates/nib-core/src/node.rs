//! The host node tree.
//!
//! A mutable tree of element and text nodes carrying style, attributes,
//! a layout handle, and an optional text transform. Structural primitives
//! mirror every mutation into the layout solver index-for-index, and
//! layout handles of removed nodes are freed by a deferred sweep so that a
//! subtree can be moved by detaching and reattaching within one commit.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{NibCoreError, Result};
use crate::layout::{Layout, LayoutEngine, LayoutHandle, MeasureCtx};
use crate::style::Style;
use crate::text::TextWrap;

/// Node identifier, stable for the node's lifetime.
pub type NodeId = u64;

/// A text transform applied per composed line: `(line, line_index) → line`.
pub type TextTransform = Rc<dyn Fn(&str, usize) -> String>;

/// The kind of a tree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Unique tree root, owned by the frame driver.
    Root,
    /// Generic flex container.
    Box,
    /// Inline text container with a measure callback.
    Text,
    /// Collapsed inline text fragment inside a `Text` ancestor; no layout
    /// handle.
    VirtualText,
    /// Raw string leaf; valid only under a `Text`/`VirtualText` chain.
    TextLeaf,
}

impl NodeKind {
    /// Whether this kind lives inside a text subtree.
    pub fn is_inline(self) -> bool {
        matches!(self, Self::Text | Self::VirtualText | Self::TextLeaf)
    }

    /// Whether nodes of this kind own a layout handle.
    pub fn has_layout(self) -> bool {
        matches!(self, Self::Root | Self::Box | Self::Text)
    }
}

/// An opaque attribute value preserved across updates.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    /// String value.
    Str(String),
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
}

impl AttrValue {
    /// Loose truthiness used for marker attributes such as `static`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Str(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// The `static` marker attribute key.
pub const ATTR_STATIC: &str = "static";

/// A node in the host tree.
pub struct Node {
    /// Node kind.
    pub kind: NodeKind,
    /// Declarative style record.
    pub style: Style,
    /// Opaque attributes.
    pub attributes: HashMap<String, AttrValue>,
    /// Parent back-pointer. Never owning.
    pub parent: Option<NodeId>,
    /// Children in paint order.
    pub children: Vec<NodeId>,
    /// Text content of a `TextLeaf`.
    pub text: String,
    /// Optional per-line transform of composed text.
    pub transform: Option<TextTransform>,
    /// Layout handle, owned 1:1 by this node.
    pub layout: Option<LayoutHandle>,
    /// On `Root` only: a static subtree grew this commit.
    pub static_dirty: bool,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("text", &self.text)
            .field("has_transform", &self.transform.is_some())
            .finish()
    }
}

impl Node {
    /// Whether this node carries the `static` marker.
    pub fn is_static(&self) -> bool {
        self.attributes
            .get(ATTR_STATIC)
            .is_some_and(AttrValue::is_truthy)
    }

    /// The wrap mode of this node's text content.
    pub fn wrap_mode(&self) -> TextWrap {
        self.style.text_wrap.unwrap_or_default()
    }
}

/// The mutable host tree plus its layout solver state.
pub struct Tree {
    nodes: HashMap<NodeId, Node>,
    next_id: NodeId,
    detached: Vec<NodeId>,
    pub(crate) layout: LayoutEngine,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 1,
            detached: Vec::new(),
            layout: LayoutEngine::new(),
        }
    }

    /// Allocate a node of the given kind with default style and, except
    /// for virtual text and leaves, a fresh layout handle.
    pub fn create_node(&mut self, kind: NodeKind) -> Result<NodeId> {
        let style = Style::default();
        let layout = if kind.has_layout() {
            Some(if kind == NodeKind::Text {
                self.layout.new_measured_leaf(&style)?
            } else {
                self.layout.new_leaf(&style)?
            })
        } else {
            None
        };

        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                kind,
                style,
                attributes: HashMap::new(),
                parent: None,
                children: Vec::new(),
                text: String::new(),
                transform: None,
                layout,
                static_dirty: false,
            },
        );
        Ok(id)
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Borrow a node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Borrow a node or fail with an invariant error.
    fn expect(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| NibCoreError::Invariant(format!("unknown node {id}")))
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.expect(parent)?;
        self.expect(child)?;
        if parent == child {
            return Err(NibCoreError::Invariant(format!(
                "node {child} cannot be its own parent"
            )));
        }
        self.detach(child)?;
        self.detached.retain(|&d| d != child);

        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        self.mirror_insert(parent, child)?;
        self.mark_static_growth(parent, child);
        Ok(())
    }

    /// Insert `child` into `parent`'s child list before `anchor`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, anchor: NodeId) -> Result<()> {
        self.expect(parent)?;
        self.expect(child)?;
        self.detach(child)?;
        self.detached.retain(|&d| d != child);

        let index = self
            .expect(parent)?
            .children
            .iter()
            .position(|&c| c == anchor)
            .ok_or_else(|| {
                NibCoreError::Invariant(format!(
                    "anchor {anchor} is not a child of node {parent}"
                ))
            })?;
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.insert(index, child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        self.mirror_insert(parent, child)?;
        self.mark_static_growth(parent, child);
        Ok(())
    }

    /// Detach `child` from `parent` and record it for the deferred free
    /// sweep. The layout handle stays alive until the commit ends, so a
    /// reinsertion before then moves the node instead of recreating it.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let actual = self.expect(child)?.parent;
        if actual != Some(parent) {
            return Err(NibCoreError::Invariant(format!(
                "node {child} is not a child of node {parent}"
            )));
        }
        self.detach(child)?;
        if let Some(node) = self.nodes.get(&child)
            && node.kind == NodeKind::Text
            && let Some(handle) = node.layout
        {
            self.layout.set_measure_ctx(handle, None)?;
        }
        self.detached.push(child);
        Ok(())
    }

    /// Remove a key→value attribute; `None` removes the key. The `style`
    /// and `children` keys are reserved and ignored here.
    pub fn set_attribute(&mut self, id: NodeId, key: &str, value: Option<AttrValue>) {
        if key == "style" || key == "children" {
            tracing::debug!(key, "ignoring reserved attribute key");
            return;
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            match value {
                Some(v) => {
                    node.attributes.insert(key.to_string(), v);
                }
                None => {
                    node.attributes.remove(key);
                }
            }
        }
    }

    /// Replace a node's style record and push it to the layout solver in
    /// one call.
    pub fn set_style(&mut self, id: NodeId, style: Style) -> Result<()> {
        let handle = self.expect(id)?.layout;
        if let Some(handle) = handle {
            self.layout.set_style(handle, &style)?;
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.style = style;
        }
        Ok(())
    }

    /// Replace the text of a `TextLeaf`.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| NibCoreError::Invariant(format!("unknown node {id}")))?;
        if node.kind != NodeKind::TextLeaf {
            return Err(NibCoreError::Invariant(format!(
                "set_text on {:?} node {id}",
                node.kind
            )));
        }
        node.text = text.to_string();
        Ok(())
    }

    /// Store or clear a node's text transform.
    pub fn set_transform(&mut self, id: NodeId, transform: Option<TextTransform>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.transform = transform;
        }
    }

    /// Consume the root's static-dirty flag.
    pub fn take_static_dirty(&mut self, root: NodeId) -> bool {
        match self.nodes.get_mut(&root) {
            Some(node) if node.static_dirty => {
                node.static_dirty = false;
                true
            }
            _ => false,
        }
    }

    /// Free the layout handles of every node detached during this commit
    /// and not reattached, and drop those nodes.
    pub fn sweep_detached(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.detached);
        for id in pending {
            let still_detached = self.nodes.get(&id).is_some_and(|n| n.parent.is_none());
            if still_detached {
                tracing::trace!(node = id, "freeing detached subtree");
                self.free_subtree(id)?;
            }
        }
        Ok(())
    }

    /// Free every node and layout handle in the tree.
    pub fn clear(&mut self) -> Result<()> {
        let roots: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(&id, _)| id)
            .collect();
        for id in roots {
            self.free_subtree(id)?;
        }
        self.detached.clear();
        Ok(())
    }

    /// Read the computed layout of a node's handle.
    pub fn layout_of(&self, id: NodeId) -> Result<Layout> {
        let handle = self.expect(id)?.layout.ok_or_else(|| {
            NibCoreError::Layout(format!("node {id} has no layout handle"))
        })?;
        self.layout.layout(handle)
    }

    /// Refresh every `Text` node's measure context from its current
    /// descendants, then run one layout pass.
    pub fn compute_layout(&mut self, root: NodeId, available_width: u16) -> Result<()> {
        let texts: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.kind == NodeKind::Text && n.parent.is_some())
            .map(|(&id, _)| id)
            .collect();
        for id in texts {
            let content =
                crate::compositor::squash_text(self, id, crate::color::ColorSupport::TrueColor);
            let (wrap, handle) = match self.nodes.get(&id) {
                Some(n) => (n.wrap_mode(), n.layout),
                None => continue,
            };
            if let Some(handle) = handle {
                self.layout
                    .set_measure_ctx(handle, Some(MeasureCtx { text: content, wrap }))?;
            }
        }

        let handle = self.expect(root)?.layout.ok_or_else(|| {
            NibCoreError::Layout(format!("root {root} has no layout handle"))
        })?;
        self.layout.compute(handle, available_width)
    }

    /// Detach a node from its current parent, mirroring the removal into
    /// the layout solver. No-op for parentless nodes.
    fn detach(&mut self, child: NodeId) -> Result<()> {
        let Some(parent) = self.expect(child)?.parent else {
            return Ok(());
        };
        let child_handle = self.expect(child)?.layout;
        let parent_handle = self.expect(parent)?.layout;
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
        if let (Some(ph), Some(ch)) = (parent_handle, child_handle) {
            self.layout.remove_child(ph, ch)?;
        }
        Ok(())
    }

    /// Mirror a just-performed list insertion into the layout solver,
    /// keeping solver child order aligned index-for-index with the child
    /// list (children without handles are skipped).
    fn mirror_insert(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_node = self.expect(parent)?;
        let (Some(ph), Some(ch)) = (parent_node.layout, self.expect(child)?.layout) else {
            return Ok(());
        };
        let list_index = parent_node
            .children
            .iter()
            .position(|&c| c == child)
            .unwrap_or(parent_node.children.len());
        let layout_index = parent_node.children[..list_index]
            .iter()
            .filter(|&&c| self.nodes.get(&c).is_some_and(|n| n.layout.is_some()))
            .count();
        self.layout.insert_child_at(ph, layout_index, ch)
    }

    /// Set the root's static-dirty flag when a subtree marked `static`
    /// grew (the inserted child, the mutated parent, or one of its
    /// ancestors carries the marker).
    fn mark_static_growth(&mut self, parent: NodeId, child: NodeId) {
        let mut saw_static = self.nodes.get(&child).is_some_and(Node::is_static);
        let mut top = parent;
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            let Some(node) = self.nodes.get(&id) else {
                return;
            };
            if node.is_static() {
                saw_static = true;
            }
            top = id;
            cursor = node.parent;
        }
        if saw_static
            && let Some(root) = self.nodes.get_mut(&top)
            && root.kind == NodeKind::Root
        {
            root.static_dirty = true;
        }
    }

    /// Free a subtree's layout handles (leaves first) and drop its nodes.
    fn free_subtree(&mut self, id: NodeId) -> Result<()> {
        let mut order = Vec::new();
        self.post_order(id, &mut order);
        for nid in order {
            if let Some(node) = self.nodes.remove(&nid)
                && let Some(handle) = node.layout
            {
                self.layout.free(handle)?;
            }
        }
        Ok(())
    }

    /// Collect a subtree in post-order (leaves first).
    fn post_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(&id) {
            for &child in &node.children {
                self.post_order(child, out);
            }
            out.push(id);
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_root() -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.create_node(NodeKind::Root).unwrap_or_default();
        (tree, root)
    }

    #[test]
    fn create_kinds_and_handles() {
        let mut tree = Tree::new();
        let root = tree.create_node(NodeKind::Root).ok();
        let boxed = tree.create_node(NodeKind::Box).ok();
        let text = tree.create_node(NodeKind::Text).ok();
        let virt = tree.create_node(NodeKind::VirtualText).ok();
        let leaf = tree.create_node(NodeKind::TextLeaf).ok();

        for id in [root, boxed, text] {
            let id = id.unwrap_or_default();
            assert!(tree.node(id).is_some_and(|n| n.layout.is_some()));
        }
        for id in [virt, leaf] {
            let id = id.unwrap_or_default();
            assert!(tree.node(id).is_some_and(|n| n.layout.is_none()));
        }
    }

    #[test]
    fn append_sets_backpointer() {
        let (mut tree, root) = tree_with_root();
        let child = tree.create_node(NodeKind::Box).unwrap_or_default();
        tree.append_child(root, child).ok();
        assert_eq!(tree.node(child).and_then(|n| n.parent), Some(root));
        assert_eq!(tree.node(root).map(|n| n.children.clone()), Some(vec![child]));
    }

    #[test]
    fn append_detaches_from_previous_parent() {
        let (mut tree, root) = tree_with_root();
        let a = tree.create_node(NodeKind::Box).unwrap_or_default();
        let b = tree.create_node(NodeKind::Box).unwrap_or_default();
        let child = tree.create_node(NodeKind::Box).unwrap_or_default();
        tree.append_child(root, a).ok();
        tree.append_child(root, b).ok();
        tree.append_child(a, child).ok();
        tree.append_child(b, child).ok();

        assert_eq!(tree.node(child).and_then(|n| n.parent), Some(b));
        assert!(tree.node(a).is_some_and(|n| n.children.is_empty()));
    }

    #[test]
    fn insert_before_orders_children() {
        let (mut tree, root) = tree_with_root();
        let a = tree.create_node(NodeKind::Box).unwrap_or_default();
        let b = tree.create_node(NodeKind::Box).unwrap_or_default();
        let c = tree.create_node(NodeKind::Box).unwrap_or_default();
        tree.append_child(root, a).ok();
        tree.append_child(root, b).ok();
        tree.insert_before(root, c, b).ok();
        assert_eq!(
            tree.node(root).map(|n| n.children.clone()),
            Some(vec![a, c, b])
        );
    }

    #[test]
    fn insert_before_unknown_anchor_fails() {
        let (mut tree, root) = tree_with_root();
        let a = tree.create_node(NodeKind::Box).unwrap_or_default();
        let stranger = tree.create_node(NodeKind::Box).unwrap_or_default();
        let result = tree.insert_before(root, a, stranger);
        assert!(matches!(result, Err(NibCoreError::Invariant(_))));
    }

    #[test]
    fn reorder_keeps_layout_handles() {
        let (mut tree, root) = tree_with_root();
        let a = tree.create_node(NodeKind::Text).unwrap_or_default();
        let b = tree.create_node(NodeKind::Text).unwrap_or_default();
        tree.append_child(root, a).ok();
        tree.append_child(root, b).ok();

        let handle_a = tree.node(a).and_then(|n| n.layout);
        let handle_b = tree.node(b).and_then(|n| n.layout);

        // Reorder to [b, a] the way a keyed diff does it.
        tree.remove_child(root, b).ok();
        tree.insert_before(root, b, a).ok();
        tree.sweep_detached().ok();

        assert_eq!(
            tree.node(root).map(|n| n.children.clone()),
            Some(vec![b, a])
        );
        assert_eq!(tree.node(a).and_then(|n| n.layout), handle_a);
        assert_eq!(tree.node(b).and_then(|n| n.layout), handle_b);
    }

    #[test]
    fn sweep_frees_detached_subtree() {
        let (mut tree, root) = tree_with_root();
        let parent = tree.create_node(NodeKind::Box).unwrap_or_default();
        let child = tree.create_node(NodeKind::Box).unwrap_or_default();
        tree.append_child(root, parent).ok();
        tree.append_child(parent, child).ok();
        assert_eq!(tree.len(), 3);

        tree.remove_child(root, parent).ok();
        // Nodes survive until the sweep so they can be reattached.
        assert_eq!(tree.len(), 3);
        tree.sweep_detached().ok();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn layout_order_skips_virtual_children() {
        let (mut tree, root) = tree_with_root();
        let text = tree.create_node(NodeKind::Text).unwrap_or_default();
        let virt = tree.create_node(NodeKind::VirtualText).unwrap_or_default();
        let boxed = tree.create_node(NodeKind::Box).unwrap_or_default();
        tree.append_child(root, text).ok();
        tree.append_child(root, virt).ok();
        tree.append_child(root, boxed).ok();

        let root_handle = tree.node(root).and_then(|n| n.layout);
        assert!(root_handle.is_some());
        if let Some(handle) = root_handle {
            // Two of three children own handles.
            assert_eq!(tree.layout.child_count(handle), 2);
        }
    }

    #[test]
    fn set_attribute_and_reserved_keys() {
        let (mut tree, root) = tree_with_root();
        tree.set_attribute(root, "key", Some(AttrValue::from("a")));
        assert_eq!(
            tree.node(root).and_then(|n| n.attributes.get("key").cloned()),
            Some(AttrValue::Str("a".into()))
        );
        tree.set_attribute(root, "key", None);
        assert!(tree.node(root).is_some_and(|n| n.attributes.is_empty()));

        tree.set_attribute(root, "style", Some(AttrValue::from("x")));
        tree.set_attribute(root, "children", Some(AttrValue::from("x")));
        assert!(tree.node(root).is_some_and(|n| n.attributes.is_empty()));
    }

    #[test]
    fn set_text_only_on_leaves() {
        let (mut tree, root) = tree_with_root();
        let leaf = tree.create_node(NodeKind::TextLeaf).unwrap_or_default();
        assert!(tree.set_text(leaf, "hi").is_ok());
        assert_eq!(tree.node(leaf).map(|n| n.text.clone()), Some("hi".into()));
        assert!(matches!(
            tree.set_text(root, "hi"),
            Err(NibCoreError::Invariant(_))
        ));
    }

    #[test]
    fn static_growth_sets_root_flag() {
        let (mut tree, root) = tree_with_root();
        let static_box = tree.create_node(NodeKind::Box).unwrap_or_default();
        tree.set_attribute(static_box, ATTR_STATIC, Some(AttrValue::Bool(true)));
        tree.append_child(root, static_box).ok();
        // Appending the static container itself grows a static subtree.
        assert!(tree.take_static_dirty(root));
        assert!(!tree.take_static_dirty(root));

        let item = tree.create_node(NodeKind::Text).unwrap_or_default();
        tree.append_child(static_box, item).ok();
        assert!(tree.take_static_dirty(root));
    }

    #[test]
    fn non_static_growth_leaves_flag_clear() {
        let (mut tree, root) = tree_with_root();
        let plain = tree.create_node(NodeKind::Box).unwrap_or_default();
        tree.append_child(root, plain).ok();
        assert!(!tree.take_static_dirty(root));
    }

    #[test]
    fn clear_frees_everything() {
        let (mut tree, root) = tree_with_root();
        let a = tree.create_node(NodeKind::Box).unwrap_or_default();
        tree.append_child(root, a).ok();
        tree.clear().ok();
        assert!(tree.is_empty());
    }

    #[test]
    fn self_parenting_is_rejected() {
        let (mut tree, root) = tree_with_root();
        assert!(matches!(
            tree.append_child(root, root),
            Err(NibCoreError::Invariant(_))
        ));
    }
}
