//! Host Tree
//!
//! This module implements the node tree that rendered fragments live in,
//! together with the staging buffer used to batch insertions.
//!
//! # Overview
//!
//! - [`DomTree`] is an arena of nodes indexed by [`NodeId`], rooted at a
//!   document node. Nodes can exist detached from the document, which is how
//!   new fragments are built before they are inserted.
//! - [`StagingBuffer`] collects detached top-level nodes in order and attaches
//!   them with one insertion.
//! - [`MutationStats`] counts what actually reached the live tree, which is
//!   how callers (and the tests) observe that a mutation caused at most one
//!   reflow.

mod node;
mod staging;
mod tree;

pub use node::{DomNode, NodeId, NodeKind};
pub use staging::StagingBuffer;
pub use tree::{DomTree, MutationStats};
