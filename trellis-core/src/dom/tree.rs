//! Host Tree
//!
//! An arena of nodes rooted at a single document node. This is the structure
//! sections reconcile against, standing in for a browser DOM.
//!
//! # Mutation accounting
//!
//! Only changes to nodes connected to the document are visible to a user, so
//! only those are counted in [`MutationStats`]. Building a subtree off-tree
//! and attaching it with one [`DomTree::insert_batch`] call costs a single
//! commit no matter how many nodes it contains.

use std::collections::HashMap;

use tracing::trace;

use super::node::{DomNode, NodeId, NodeKind};
use crate::error::DomError;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Counters for mutations applied to connected nodes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MutationStats {
    /// Batched insertions into the live tree. Each one is a reflow.
    pub commits: usize,
    /// Nodes attached by those insertions.
    pub inserted: usize,
    /// Subtrees detached from the live tree.
    pub removals: usize,
    /// Text node rewrites.
    pub text_updates: usize,
    /// Attribute rewrites.
    pub attribute_updates: usize,
}

impl MutationStats {
    /// True if nothing in the live tree changed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The host tree.
#[derive(Debug)]
pub struct DomTree {
    /// All nodes, indexed by ID.
    nodes: HashMap<NodeId, DomNode>,

    /// The document node.
    root: NodeId,

    stats: MutationStats,
}

impl DomTree {
    /// Create a tree containing only a document node.
    pub fn new() -> Self {
        let root = NodeId::new();
        let mut nodes = HashMap::new();
        nodes.insert(root, DomNode::new(NodeKind::Document));
        Self {
            nodes,
            root,
            stats: MutationStats::default(),
        }
    }

    /// The document node.
    pub fn document(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(&id)
    }

    fn node(&self, id: NodeId) -> Result<&DomNode, DomError> {
        self.nodes.get(&id).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut DomNode, DomError> {
        self.nodes.get_mut(&id).ok_or(DomError::UnknownNode(id))
    }

    /// Whether the node exists in the arena.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes in the arena, attached or not, including the document.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.insert_node(NodeKind::Element {
            tag: tag.into(),
            attributes: Default::default(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.insert_node(NodeKind::Text(text.into()))
    }

    fn insert_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, DomNode::new(kind));
        id
    }

    /// Replace the content of a text node.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        match self.node_mut(node)?.kind_mut() {
            NodeKind::Text(current) => *current = text.into(),
            _ => return Err(DomError::NotText(node)),
        }
        if self.is_connected(node) {
            self.stats.text_updates += 1;
        }
        Ok(())
    }

    /// Set an attribute on an element, keeping its original position if it
    /// already exists.
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        match self.node_mut(node)?.kind_mut() {
            NodeKind::Element { attributes, .. } => {
                attributes.insert(name.into(), value.into());
            }
            _ => return Err(DomError::NotAnElement(node)),
        }
        if self.is_connected(node) {
            self.stats.attribute_updates += 1;
        }
        Ok(())
    }

    /// Append a single node to `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_batch(parent, &[child], None)
    }

    /// Insert `nodes`, in order, into `parent` before `before` (or at the end
    /// when `before` is `None`).
    ///
    /// Nodes that are already attached somewhere are moved.
    pub fn insert_batch(
        &mut self,
        parent: NodeId,
        nodes: &[NodeId],
        before: Option<NodeId>,
    ) -> Result<(), DomError> {
        if nodes.is_empty() {
            return Ok(());
        }

        self.node(parent)?;
        for &node in nodes {
            self.node(node)?;
        }
        for &node in nodes {
            self.detach(node)?;
        }

        let position = {
            let children = self.node(parent)?.children();
            match before {
                Some(anchor) => children
                    .iter()
                    .position(|child| *child == anchor)
                    .ok_or(DomError::NotAChild {
                        parent,
                        child: anchor,
                    })?,
                None => children.len(),
            }
        };

        self.node_mut(parent)?
            .children_mut()
            .splice(position..position, nodes.iter().copied());
        for &node in nodes {
            self.node_mut(node)?.set_parent(Some(parent));
        }

        if self.is_connected(parent) {
            self.stats.commits += 1;
            self.stats.inserted += nodes.len();
            trace!(?parent, ?before, count = nodes.len(), "committed batch");
        }
        Ok(())
    }

    /// Detach a node from its parent, keeping it in the arena.
    fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        if let Some(parent) = self.node(node)?.parent() {
            self.node_mut(parent)?.children_mut().retain(|child| *child != node);
            self.node_mut(node)?.set_parent(None);
        }
        Ok(())
    }

    /// Detach a node and free it together with its whole subtree.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        if node == self.root {
            return Ok(());
        }

        let connected = self.is_connected(node);
        self.detach(node)?;

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&id) {
                stack.extend_from_slice(removed.children());
            }
        }

        if connected {
            self.stats.removals += 1;
        }
        Ok(())
    }

    /// Get a node's parent.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(DomNode::parent)
    }

    /// Get a node's children. Unknown nodes have none.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(DomNode::children)
            .unwrap_or_default()
    }

    /// The sibling following `node`, if any.
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|child| *child == node)?;
        siblings.get(position + 1).copied()
    }

    /// Whether `node` is reachable from the document node.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// All connected nodes in document (pre-)order, starting with the
    /// document node.
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    /// Concatenated text of a node and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(text) = self.nodes.get(&id).and_then(DomNode::text) {
                out.push_str(text);
            }
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    /// Serialize a node, including itself.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Serialize a node's children.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        match node.kind() {
            NodeKind::Document => {
                for &child in node.children() {
                    self.write_node(child, out);
                }
            }
            NodeKind::Text(text) => out.push_str(&escape(text)),
            NodeKind::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for &child in node.children() {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    /// Mutations applied to the live tree since creation or the last
    /// [`DomTree::take_stats`].
    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    /// Return the counters and reset them.
    pub fn take_stats(&mut self) -> MutationStats {
        std::mem::take(&mut self.stats)
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn list(tree: &mut DomTree) -> NodeId {
        let ul = tree.create_element("ul");
        tree.append_child(tree.document(), ul).unwrap();
        ul
    }

    #[test]
    fn batch_insert_is_one_commit() {
        let mut tree = DomTree::new();
        let ul = list(&mut tree);
        tree.take_stats();

        let items: Vec<_> = (0..3)
            .map(|i| {
                let li = tree.create_element("li");
                let text = tree.create_text(i.to_string());
                tree.append_child(li, text).unwrap();
                li
            })
            .collect();

        // Building off-tree is free
        assert!(tree.stats().is_empty());

        tree.insert_batch(ul, &items, None).unwrap();
        let stats = tree.stats();
        assert_eq!(stats.commits, 1);
        assert_eq!(stats.inserted, 3);
        assert_eq!(tree.inner_html(ul), "<li>0</li><li>1</li><li>2</li>");
    }

    #[test]
    fn insert_before_anchor() {
        let mut tree = DomTree::new();
        let ul = list(&mut tree);
        let a = tree.create_text("a");
        let c = tree.create_text("c");
        tree.insert_batch(ul, &[a, c], None).unwrap();

        let b = tree.create_text("b");
        tree.insert_batch(ul, &[b], Some(c)).unwrap();
        assert_eq!(tree.children(ul), &[a, b, c]);
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.next_sibling(c), None);
    }

    #[test]
    fn anchor_must_be_a_child() {
        let mut tree = DomTree::new();
        let ul = list(&mut tree);
        let stray = tree.create_text("stray");
        let node = tree.create_text("x");
        assert_eq!(
            tree.insert_batch(ul, &[node], Some(stray)),
            Err(DomError::NotAChild {
                parent: ul,
                child: stray
            })
        );
    }

    #[test]
    fn remove_frees_subtree() {
        let mut tree = DomTree::new();
        let ul = list(&mut tree);
        let li = tree.create_element("li");
        let text = tree.create_text("gone");
        tree.append_child(li, text).unwrap();
        tree.append_child(ul, li).unwrap();
        tree.take_stats();

        tree.remove(li).unwrap();
        assert!(!tree.contains(li));
        assert!(!tree.contains(text));
        assert!(tree.children(ul).is_empty());
        assert_eq!(tree.stats().removals, 1);
    }

    #[test]
    fn off_tree_updates_are_not_counted() {
        let mut tree = DomTree::new();
        let text = tree.create_text("a");
        tree.set_text(text, "b").unwrap();
        assert!(tree.stats().is_empty());

        tree.append_child(tree.document(), text).unwrap();
        tree.set_text(text, "c").unwrap();
        assert_eq!(tree.stats().text_updates, 1);
        assert_eq!(tree.text_content(tree.document()), "c");
    }

    #[test]
    fn serialization_escapes_and_handles_void_elements() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        tree.set_attribute(p, "title", "say \"hi\"").unwrap();
        let text = tree.create_text("a < \"b\" & c");
        let input = tree.create_element("input");
        tree.insert_batch(p, &[text, input], None).unwrap();

        assert_eq!(
            tree.outer_html(p),
            "<p title=\"say &quot;hi&quot;\">a &lt; &quot;b&quot; &amp; c<input></p>"
        );
    }

    #[test]
    fn type_mismatches_are_errors() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let text = tree.create_text("t");
        assert_eq!(tree.set_text(p, "x"), Err(DomError::NotText(p)));
        assert_eq!(
            tree.set_attribute(text, "a", "b"),
            Err(DomError::NotAnElement(text))
        );
    }

    #[test]
    fn document_order_is_preorder() {
        let mut tree = DomTree::new();
        let ul = list(&mut tree);
        let li = tree.create_element("li");
        let inner = tree.create_text("inner");
        tree.append_child(li, inner).unwrap();
        let after = tree.create_text("after");
        tree.insert_batch(ul, &[li, after], None).unwrap();

        assert_eq!(
            tree.document_order(),
            vec![tree.document(), ul, li, inner, after]
        );
    }
}
