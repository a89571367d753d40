//! Render Context
//!
//! Everything a fragment needs while rendering or reconciling, borrowed from
//! the owning [`View`](crate::View) for the duration of one call.

use serde_json::Value;

use crate::config::RenderOptions;
use crate::dom::DomTree;
use crate::error::RenderError;
use crate::model::Keypath;
use crate::template::{Descriptor, Partials};

use std::sync::Arc;

/// Borrowed collaborators for one render or mutation call.
pub struct RenderContext<'a> {
    pub tree: &'a mut DomTree,
    pub data: &'a Value,
    pub partials: &'a Partials,
    pub options: &'a RenderOptions,

    /// Partials currently being expanded.
    partial_depth: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        tree: &'a mut DomTree,
        data: &'a Value,
        partials: &'a Partials,
        options: &'a RenderOptions,
    ) -> Self {
        Self {
            tree,
            data,
            partials,
            options,
            partial_depth: 0,
        }
    }

    /// Look up a partial and enter it. Pair with [`RenderContext::exit_partial`].
    pub(crate) fn enter_partial(&mut self, name: &str) -> Result<Arc<[Descriptor]>, RenderError> {
        let partial = self
            .partials
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownPartial {
                name: name.to_string(),
            })?;
        if self.partial_depth >= self.options.max_partial_depth {
            return Err(RenderError::PartialDepthExceeded {
                name: name.to_string(),
                limit: self.options.max_partial_depth,
            });
        }
        self.partial_depth += 1;
        Ok(partial)
    }

    pub(crate) fn exit_partial(&mut self) {
        self.partial_depth = self.partial_depth.saturating_sub(1);
    }
}

/// How a keypath changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The value was replaced wholesale.
    Replaced,
    /// The array at the keypath was mutated in place.
    Mutated,
}

/// A data change that bindings may need to follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub keypath: Keypath,
    pub kind: ChangeKind,
}

impl Change {
    pub fn replaced(keypath: Keypath) -> Self {
        Self {
            keypath,
            kind: ChangeKind::Replaced,
        }
    }

    pub fn mutated(keypath: Keypath) -> Self {
        Self {
            keypath,
            kind: ChangeKind::Mutated,
        }
    }
}
