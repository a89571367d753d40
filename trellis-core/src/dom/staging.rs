//! Staging Buffer
//!
//! New fragments render their top-level nodes into a staging buffer instead
//! of the live tree. Flushing the buffer attaches everything it holds with a
//! single batched insertion, so a mutation that adds a hundred rows still
//! costs one reflow.
//!
//! Both [`StagingBuffer::flush`] and [`StagingBuffer::discard`] consume the
//! buffer, which keeps it from outliving the mutation that created it.

use smallvec::SmallVec;
use tracing::trace;

use super::node::NodeId;
use super::tree::DomTree;
use crate::error::DomError;

/// Ordered, off-tree storage for nodes pending insertion.
#[derive(Debug, Default)]
pub struct StagingBuffer {
    nodes: SmallVec<[NodeId; 8]>,
}

impl StagingBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a detached node. Order of calls is document order.
    pub fn push(&mut self, node: NodeId) {
        self.nodes.push(node);
    }

    /// Number of queued nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The queued nodes.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Insert every queued node into `parent` before `before` in one batch.
    ///
    /// Returns the number of nodes inserted. An empty buffer does not touch
    /// the tree.
    pub fn flush(
        self,
        tree: &mut DomTree,
        parent: NodeId,
        before: Option<NodeId>,
    ) -> Result<usize, DomError> {
        if self.nodes.is_empty() {
            return Ok(0);
        }
        trace!(?parent, ?before, count = self.nodes.len(), "flushing staging buffer");
        tree.insert_batch(parent, &self.nodes, before)?;
        Ok(self.nodes.len())
    }

    /// Free every queued node without inserting it.
    pub fn discard(self, tree: &mut DomTree) -> Result<(), DomError> {
        for node in self.nodes {
            tree.remove(node)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_inserts_in_order_with_one_commit() {
        let mut tree = DomTree::new();
        let parent = tree.create_element("div");
        tree.append_child(tree.document(), parent).unwrap();
        let tail = tree.create_text("tail");
        tree.append_child(parent, tail).unwrap();
        tree.take_stats();

        let mut staging = StagingBuffer::new();
        for text in ["a", "b", "c"] {
            staging.push(tree.create_text(text));
        }
        assert_eq!(staging.len(), 3);

        let inserted = staging.flush(&mut tree, parent, Some(tail)).unwrap();
        assert_eq!(inserted, 3);
        assert_eq!(tree.inner_html(parent), "abctail");
        assert_eq!(tree.stats().commits, 1);
    }

    #[test]
    fn empty_flush_is_a_no_op() {
        let mut tree = DomTree::new();
        let parent = tree.document();
        let inserted = StagingBuffer::new().flush(&mut tree, parent, None).unwrap();
        assert_eq!(inserted, 0);
        assert!(tree.stats().is_empty());
    }

    #[test]
    fn discard_frees_nodes() {
        let mut tree = DomTree::new();
        let mut staging = StagingBuffer::new();
        let node = tree.create_text("x");
        staging.push(node);
        staging.discard(&mut tree).unwrap();
        assert!(!tree.contains(node));
        assert_eq!(tree.node_count(), 1);
    }
}
