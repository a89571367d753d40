//! Templates
//!
//! A [`Template`] is a compiled descriptor tree plus the named partials it
//! may include. Parsing template source is done upstream; this module only
//! defines the descriptor format and loads it from JSON.

mod descriptor;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use descriptor::{AttributeDescriptor, AttributePart, Descriptor, SectionDescriptor};

/// Named partials, shared by every fragment that includes them.
pub type Partials = IndexMap<String, Arc<[Descriptor]>>;

/// A compiled template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Top-level descriptors.
    pub nodes: Arc<[Descriptor]>,

    #[serde(default)]
    pub partials: Partials,
}

impl Template {
    /// A template without partials.
    pub fn new(nodes: Vec<Descriptor>) -> Self {
        Self {
            nodes: nodes.into(),
            partials: Partials::new(),
        }
    }

    /// Register a partial.
    pub fn with_partial(mut self, name: impl Into<String>, nodes: Vec<Descriptor>) -> Self {
        self.partials.insert(name.into(), nodes.into());
        self
    }

    /// Parse a template from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
