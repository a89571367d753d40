//! Error types.
//!
//! Reconciliation itself has no recoverable failure modes. The errors below
//! describe broken collaborator contracts (a node handle that does not exist,
//! a partial that was never registered) and are propagated to the caller
//! untouched.

use thiserror::Error;

use crate::dom::NodeId;
use crate::model::Keypath;
use crate::render::SectionId;

/// Failures reported by the host tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),

    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0:?} is not a text node")]
    NotText(NodeId),
}

/// Failures surfaced while rendering or reconciling a view.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("host tree error: {0}")]
    Dom(#[from] DomError),

    #[error("template error: {0}")]
    Template(#[from] serde_json::Error),

    #[error("unknown partial `{name}`")]
    UnknownPartial { name: String },

    #[error("partial `{name}` exceeds the maximum nesting depth of {limit}")]
    PartialDepthExceeded { name: String, limit: usize },

    #[error("value at `{keypath}` is not an array")]
    NotAnArray { keypath: Keypath },

    #[error("cannot assign a value at `{keypath}`")]
    InvalidSet { keypath: Keypath },

    #[error("section {0:?} is not part of this view")]
    UnknownSection(SectionId),

    #[error("section {section:?} bound to `{keypath}` is inconsistent: {detail}")]
    InvariantViolation {
        section: SectionId,
        keypath: Keypath,
        detail: String,
    },
}
