//! Fragments
//!
//! A fragment is one rendered instance of a descriptor list. The root of a
//! [`View`](crate::View) is a fragment; every row of a list section is a
//! fragment too, carrying its `index` and `keypath` within that list.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::dom::{DomTree, NodeId, StagingBuffer};
use crate::error::{DomError, RenderError};
use crate::model::{Keypath, Scope};
use crate::template::Descriptor;

use super::context::RenderContext;
use super::item::{self, render_items, Item};
use super::section::{Section, SectionId};

/// Unique identifier for a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(u64);

impl FragmentId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Everything needed to build a fragment.
#[derive(Debug, Clone)]
pub struct FragmentOptions {
    pub descriptor: Arc<[Descriptor]>,
    pub parent_node: NodeId,
    pub owner: Option<SectionId>,
    pub scope: Scope,
    pub index: Option<usize>,
    pub keypath: Option<Keypath>,
}

/// One rendered instance of a descriptor list.
#[derive(Debug)]
pub struct Fragment {
    id: FragmentId,
    descriptor: Arc<[Descriptor]>,
    parent_node: NodeId,
    owner: Option<SectionId>,
    pub(crate) scope: Scope,
    pub(crate) index: Option<usize>,
    pub(crate) keypath: Option<Keypath>,
    pub(crate) items: Vec<Item>,
}

impl Fragment {
    pub fn new(options: FragmentOptions) -> Self {
        Self {
            id: FragmentId::new(),
            descriptor: options.descriptor,
            parent_node: options.parent_node,
            owner: options.owner,
            scope: options.scope,
            index: options.index,
            keypath: options.keypath,
            items: Vec::new(),
        }
    }

    /// Build the fragment's content, queueing its top-level nodes on `out`.
    pub fn render(
        &mut self,
        ctx: &mut RenderContext<'_>,
        out: &mut StagingBuffer,
    ) -> Result<(), RenderError> {
        let items = render_items(&self.descriptor, &self.scope, self.parent_node, ctx, out)?;
        self.items = items;
        Ok(())
    }

    pub fn id(&self) -> FragmentId {
        self.id
    }

    /// Position within the owning list section.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Keypath of the list element this fragment renders.
    pub fn keypath(&self) -> Option<&Keypath> {
        self.keypath.as_ref()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The section this fragment belongs to, `None` for a view root.
    pub fn owner(&self) -> Option<SectionId> {
        self.owner
    }

    pub fn parent_node(&self) -> NodeId {
        self.parent_node
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// First DOM node, or `None` when every item is an empty section.
    pub fn first_node(&self) -> Option<NodeId> {
        item::first_node(&self.items)
    }

    /// Release the fragment, removing its top-level nodes when `detach`.
    pub fn teardown(self, tree: &mut DomTree, detach: bool) -> Result<(), DomError> {
        for item in self.items {
            item.teardown(tree, detach)?;
        }
        Ok(())
    }

    /// Serialize the fragment's nodes.
    pub fn to_html(&self, tree: &DomTree) -> String {
        let mut out = String::new();
        for item in &self.items {
            item.write_html(tree, &mut out);
        }
        out
    }

    pub fn find_section(&self, id: SectionId) -> Option<&Section> {
        item::find_section(&self.items, id)
    }

    pub(crate) fn find_section_mut(
        &mut self,
        id: SectionId,
        next: Option<NodeId>,
    ) -> Option<(&mut Section, Option<NodeId>)> {
        item::find_section_mut(&mut self.items, id, next)
    }

    /// Every section under this fragment bound exactly to `keypath`.
    pub fn sections_bound_to(&self, keypath: &Keypath) -> Vec<SectionId> {
        let mut found = Vec::new();
        for section in item::child_sections(&self.items) {
            section.collect_bound_to(keypath, &mut found);
        }
        found
    }

    /// Check the invariants of every section under this fragment.
    pub fn verify(&self, tree: &DomTree) -> Result<(), RenderError> {
        for section in item::child_sections(&self.items) {
            section.verify(tree)?;
        }
        Ok(())
    }
}
