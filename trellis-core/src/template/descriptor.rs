//! Template Descriptors
//!
//! Descriptors are the already-compiled form of a template. They are
//! produced upstream and consumed here as-is; child lists are shared
//! (`Arc<[Descriptor]>`) so every fragment of a list section points at the
//! same descriptor slice.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

fn no_descriptors() -> Arc<[Descriptor]> {
    Arc::from(Vec::new())
}

/// One node of a compiled template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Descriptor {
    /// Static text.
    Text { text: String },

    /// `{{reference}}`
    Interpolator { reference: String },

    /// An element with attributes and children.
    Element {
        tag: String,
        #[serde(default)]
        attributes: Vec<AttributeDescriptor>,
        #[serde(default = "no_descriptors")]
        children: Arc<[Descriptor]>,
    },

    /// `{{#reference:index_ref}}...{{/reference}}` or `{{^reference}}`
    Section(SectionDescriptor),

    /// `{{>name}}`
    Partial { name: String },
}

impl Descriptor {
    /// Static text.
    pub fn text(text: impl Into<String>) -> Self {
        Descriptor::Text { text: text.into() }
    }

    /// An interpolator.
    pub fn interpolator(reference: impl Into<String>) -> Self {
        Descriptor::Interpolator {
            reference: reference.into(),
        }
    }

    /// An element without attributes.
    pub fn element(tag: impl Into<String>, children: Vec<Descriptor>) -> Self {
        Self::element_with(tag, Vec::new(), children)
    }

    /// An element with attributes.
    pub fn element_with(
        tag: impl Into<String>,
        attributes: Vec<AttributeDescriptor>,
        children: Vec<Descriptor>,
    ) -> Self {
        Descriptor::Element {
            tag: tag.into(),
            attributes,
            children: children.into(),
        }
    }

    /// A partial reference.
    pub fn partial(name: impl Into<String>) -> Self {
        Descriptor::Partial { name: name.into() }
    }
}

impl From<SectionDescriptor> for Descriptor {
    fn from(section: SectionDescriptor) -> Self {
        Descriptor::Section(section)
    }
}

/// A repeated, conditional or inverted block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDescriptor {
    /// Reference to the bound value.
    pub reference: String,

    /// Name under which each fragment's index is exposed.
    #[serde(default)]
    pub index_ref: Option<String>,

    /// Render when the value is falsy instead of truthy.
    #[serde(default)]
    pub inverted: bool,

    #[serde(default = "no_descriptors")]
    pub children: Arc<[Descriptor]>,
}

impl SectionDescriptor {
    /// A section over `reference` with no children yet.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            index_ref: None,
            inverted: false,
            children: no_descriptors(),
        }
    }

    /// Declare an index-ref alias.
    pub fn index_ref(mut self, alias: impl Into<String>) -> Self {
        self.index_ref = Some(alias.into());
        self
    }

    /// Make this an inverted section.
    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    /// Set the repeated content.
    pub fn children(mut self, children: Vec<Descriptor>) -> Self {
        self.children = children.into();
        self
    }
}

/// An attribute whose value is a sequence of text and interpolator parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    #[serde(default)]
    pub value: Vec<AttributePart>,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, value: Vec<AttributePart>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// An attribute with a fixed value.
    pub fn fixed(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, vec![AttributePart::text(value)])
    }
}

/// Part of an attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributePart {
    Text { text: String },
    Interpolator { reference: String },
}

impl AttributePart {
    pub fn text(text: impl Into<String>) -> Self {
        AttributePart::Text { text: text.into() }
    }

    pub fn interpolator(reference: impl Into<String>) -> Self {
        AttributePart::Interpolator {
            reference: reference.into(),
        }
    }
}
