//! Sections
//!
//! A section renders a block of its template once per element of a bound
//! array, once for a truthy or object value, or (inverted) once for a falsy
//! value or empty array.
//!
//! # List Reconciliation
//!
//! When the bound array is mutated in place, a list section does not rebuild.
//! Every mutation is reduced to a canonical [`Splice`] and applied as a single
//! minimal change:
//!
//! ```text
//!   balance = added - removed
//!   pivot   = start + min(added, removed)
//!
//!   [0, start)                  untouched
//!   [start, pivot)              kept in place, values re-read
//!   balance < 0: [pivot, start + removed)   torn down
//!   balance > 0: balance new fragments at pivot, one DOM insertion
//!   [start + added, len)        reassigned by `balance`
//! ```
//!
//! Fragments before `start` are never touched. New fragments are rendered
//! into a [`StagingBuffer`] and inserted before the first node of whatever
//! follows them, which is either a later fragment or the node following the
//! whole section.
//!
//! Reorders (sort, reverse) keep every fragment where it is. The data moved
//! underneath them, so re-reading values is enough to show the new order.
//!
//! # Invariants
//!
//! After every mutation, for every fragment `k` of a list section:
//!
//! - `index == k`
//! - `keypath == <section keypath>.k`
//! - the index-ref alias, if any, is `k`
//! - first nodes appear in fragment order under the parent node
//!
//! [`Section::verify`] checks these.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, debug_span, error, trace};

use crate::dom::{DomTree, NodeId, StagingBuffer};
use crate::error::{DomError, RenderError};
use crate::model::{data, Keypath, Scope};
use crate::template::{Descriptor, SectionDescriptor};

use super::context::RenderContext;
use super::fragment::{Fragment, FragmentOptions};
use super::item;
use super::mutation::{Mutation, Splice};

/// Unique identifier for a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(u64);

impl SectionId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// What the section is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionMode {
    /// Nothing rendered.
    Empty,
    /// One fragment per array element.
    List,
    /// One fragment with the bound object as context.
    Context,
    /// One fragment in the enclosing scope.
    Conditional,
}

/// Shape the section should have for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Empty,
    List(usize),
    Context,
    Conditional,
}

/// A rendered section.
#[derive(Debug)]
pub struct Section {
    id: SectionId,
    reference: String,
    index_ref: Option<String>,
    inverted: bool,
    children: Arc<[Descriptor]>,

    pub(crate) keypath: Keypath,
    /// The scope the section itself lives in.
    pub(crate) scope: Scope,
    parent_node: NodeId,
    pub(crate) fragments: Vec<Fragment>,
    mode: SectionMode,
}

impl Section {
    /// Resolve `descriptor` in `scope`. Nothing is rendered yet.
    pub(crate) fn new(
        descriptor: &SectionDescriptor,
        scope: &Scope,
        parent_node: NodeId,
        data: &Value,
    ) -> Self {
        Self {
            id: SectionId::new(),
            reference: descriptor.reference.clone(),
            index_ref: descriptor.index_ref.clone(),
            inverted: descriptor.inverted,
            children: Arc::clone(&descriptor.children),
            keypath: scope.resolve_keypath(&descriptor.reference, data),
            scope: scope.clone(),
            parent_node,
            fragments: Vec::new(),
            mode: SectionMode::Empty,
        }
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    /// The reference as written in the template.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The bound keypath.
    pub fn keypath(&self) -> &Keypath {
        &self.keypath
    }

    pub fn index_ref(&self) -> Option<&str> {
        self.index_ref.as_deref()
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn mode(&self) -> SectionMode {
        self.mode
    }

    pub fn parent_node(&self) -> NodeId {
        self.parent_node
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// First node of the first fragment that has one.
    pub fn first_node(&self) -> Option<NodeId> {
        self.fragments.iter().find_map(Fragment::first_node)
    }

    /// The node following fragment `position`: the first node of a later
    /// fragment, or `next` (the node following the whole section).
    pub fn find_next_node(&self, position: usize, next: Option<NodeId>) -> Option<NodeId> {
        self.first_node_from(position.saturating_add(1), next)
    }

    fn first_node_from(&self, position: usize, next: Option<NodeId>) -> Option<NodeId> {
        self.fragments
            .get(position..)
            .unwrap_or_default()
            .iter()
            .find_map(Fragment::first_node)
            .or(next)
    }

    /// Serialize every fragment in order.
    pub fn to_html(&self, tree: &DomTree) -> String {
        self.fragments
            .iter()
            .map(|fragment| fragment.to_html(tree))
            .collect()
    }

    fn shape_for(&self, value: Option<&Value>) -> Shape {
        if self.inverted {
            let empty = match value {
                Some(Value::Array(items)) => items.is_empty(),
                other => !data::is_truthy(other),
            };
            return if empty { Shape::Conditional } else { Shape::Empty };
        }
        match value {
            Some(Value::Array(items)) => Shape::List(items.len()),
            Some(Value::Object(_)) => Shape::Context,
            other if data::is_truthy(other) => Shape::Conditional,
            _ => Shape::Empty,
        }
    }

    fn shape(&self) -> Shape {
        match self.mode {
            SectionMode::Empty => Shape::Empty,
            SectionMode::List => Shape::List(self.fragments.len()),
            SectionMode::Context => Shape::Context,
            SectionMode::Conditional => Shape::Conditional,
        }
    }

    /// Whether the rendered shape still fits the bound value.
    pub(crate) fn fits(&self, data: &Value) -> bool {
        let value = data::get(data, &self.keypath);
        self.shape_for(value.as_deref()) == self.shape()
    }

    /// Render for the current value, queueing top-level nodes on `out`.
    pub fn render(
        &mut self,
        ctx: &mut RenderContext<'_>,
        out: &mut StagingBuffer,
    ) -> Result<(), RenderError> {
        let value = data::get(ctx.data, &self.keypath);
        let shape = self.shape_for(value.as_deref());
        trace!(section = self.id.raw(), keypath = %self.keypath, ?shape, "rendering section");

        self.mode = match shape {
            Shape::Empty => SectionMode::Empty,
            Shape::List(len) => {
                self.fragments.reserve(len);
                for index in 0..len {
                    let fragment = self.create_fragment(index, ctx, out)?;
                    self.fragments.push(fragment);
                }
                SectionMode::List
            }
            Shape::Context => {
                let scope = Scope {
                    context: self.scope.context.extended(self.keypath.clone()),
                    index_refs: self.scope.index_refs.clone(),
                };
                let fragment = self.single_fragment(scope, Some(self.keypath.clone()), ctx, out)?;
                self.fragments.push(fragment);
                SectionMode::Context
            }
            Shape::Conditional => {
                let fragment = self.single_fragment(self.scope.clone(), None, ctx, out)?;
                self.fragments.push(fragment);
                SectionMode::Conditional
            }
        };
        Ok(())
    }

    fn single_fragment(
        &self,
        scope: Scope,
        keypath: Option<Keypath>,
        ctx: &mut RenderContext<'_>,
        out: &mut StagingBuffer,
    ) -> Result<Fragment, RenderError> {
        let mut fragment = Fragment::new(FragmentOptions {
            descriptor: Arc::clone(&self.children),
            parent_node: self.parent_node,
            owner: Some(self.id),
            scope,
            index: None,
            keypath,
        });
        fragment.render(ctx, out)?;
        Ok(fragment)
    }

    /// Render the fragment for list element `index`.
    fn create_fragment(
        &self,
        index: usize,
        ctx: &mut RenderContext<'_>,
        out: &mut StagingBuffer,
    ) -> Result<Fragment, RenderError> {
        let keypath = self.keypath.index(index);
        let index_refs = match &self.index_ref {
            Some(alias) => self.scope.index_refs.with(alias, index),
            None => self.scope.index_refs.clone(),
        };
        let mut fragment = Fragment::new(FragmentOptions {
            descriptor: Arc::clone(&self.children),
            parent_node: self.parent_node,
            owner: Some(self.id),
            scope: Scope {
                context: self.scope.context.extended(keypath.clone()),
                index_refs,
            },
            index: Some(index),
            keypath: Some(keypath),
        });
        fragment.render(ctx, out)?;
        Ok(fragment)
    }

    /// Render the fragments for `indices` into `out`. Every node they
    /// create, including those of a fragment that fails halfway, is staged.
    fn create_fragments(
        &self,
        indices: Range<usize>,
        ctx: &mut RenderContext<'_>,
        out: &mut StagingBuffer,
    ) -> Result<Vec<Fragment>, RenderError> {
        let mut created = Vec::with_capacity(indices.len());
        for index in indices {
            created.push(self.create_fragment(index, ctx, out)?);
        }
        Ok(created)
    }

    /// Tear everything down and render again before `next`.
    pub fn rerender(
        &mut self,
        ctx: &mut RenderContext<'_>,
        next: Option<NodeId>,
    ) -> Result<(), RenderError> {
        debug!(section = self.id.raw(), keypath = %self.keypath, "rebuilding section");
        self.teardown(ctx.tree, true)?;
        let mut staging = StagingBuffer::new();
        if let Err(err) = self.render(ctx, &mut staging) {
            staging.discard(ctx.tree)?;
            self.fragments.clear();
            self.mode = SectionMode::Empty;
            return Err(err);
        }
        staging.flush(ctx.tree, self.parent_node, next)?;
        Ok(())
    }

    /// Release every fragment, removing their nodes when `detach`.
    pub fn teardown(&mut self, tree: &mut DomTree, detach: bool) -> Result<(), DomError> {
        for fragment in self.fragments.drain(..) {
            fragment.teardown(tree, detach)?;
        }
        self.mode = SectionMode::Empty;
        Ok(())
    }

    /// Apply a raw mutation by operation name. Unknown names are ignored.
    pub fn apply_raw(
        &mut self,
        op: &str,
        args: Vec<Value>,
        ctx: &mut RenderContext<'_>,
        next: Option<NodeId>,
    ) -> Result<(), RenderError> {
        match Mutation::from_raw(op, args) {
            Some(mutation) => self.apply_mutation(&mutation, ctx, next),
            None => {
                debug!(section = self.id.raw(), op, "ignoring unknown operation");
                Ok(())
            }
        }
    }

    /// Reconcile after `mutation` was applied to the bound array.
    ///
    /// `next` is the node following the section, used when new fragments
    /// are appended at the end.
    pub fn apply_mutation(
        &mut self,
        mutation: &Mutation,
        ctx: &mut RenderContext<'_>,
        next: Option<NodeId>,
    ) -> Result<(), RenderError> {
        let span = debug_span!(
            "apply_mutation",
            section = self.id.raw(),
            keypath = %self.keypath,
            op = mutation.name()
        );
        let _guard = span.enter();

        let Some(splice) = mutation.to_splice(self.len()) else {
            debug!("reorder keeps fragments in place");
            return Ok(());
        };
        if self.inverted || self.mode != SectionMode::List {
            return self.rerender(ctx, next);
        }
        self.splice(splice, ctx, next)
    }

    /// Apply a canonical splice to the fragment list.
    pub(crate) fn splice(
        &mut self,
        splice: Splice,
        ctx: &mut RenderContext<'_>,
        next: Option<NodeId>,
    ) -> Result<(), RenderError> {
        let Splice {
            start,
            removed,
            added,
        } = splice.clamped(self.len());
        let balance = added as isize - removed as isize;
        trace!(start, removed, added, balance, "splice");
        if balance == 0 {
            return Ok(());
        }

        let pivot = start + added.min(removed);
        if balance < 0 {
            let doomed: Vec<Fragment> = self.fragments.drain(pivot..start + removed).collect();
            for fragment in doomed {
                fragment.teardown(ctx.tree, true)?;
            }
        } else {
            let insertion_point = self.first_node_from(pivot, next);
            let mut staging = StagingBuffer::new();
            let created = match self.create_fragments(pivot..start + added, ctx, &mut staging) {
                Ok(created) => created,
                Err(err) => {
                    staging.discard(ctx.tree)?;
                    return Err(err);
                }
            };
            let tail = self.fragments.split_off(pivot);
            self.fragments.extend(created);
            self.fragments.extend(tail);
            staging.flush(ctx.tree, self.parent_node, insertion_point)?;
        }

        let len = self.len();
        self.reassign(start + added, len, balance, ctx)
    }

    /// Check the list invariants here and in every nested section.
    pub fn verify(&self, tree: &DomTree) -> Result<(), RenderError> {
        if self.mode == SectionMode::List {
            for (position, fragment) in self.fragments.iter().enumerate() {
                if fragment.index != Some(position) {
                    return Err(self.violation(format!(
                        "fragment {position} has index {:?}",
                        fragment.index
                    )));
                }
                let expected = self.keypath.index(position);
                if fragment.keypath.as_ref() != Some(&expected) {
                    return Err(self.violation(format!(
                        "fragment {position} has keypath {:?}, expected {expected}",
                        fragment.keypath.as_ref().map(ToString::to_string)
                    )));
                }
                if let Some(alias) = &self.index_ref {
                    let value = fragment.scope.index_refs.get(alias);
                    if value != Some(position) {
                        return Err(self.violation(format!(
                            "fragment {position} has {alias} = {value:?}"
                        )));
                    }
                }
            }
        }

        let positions: HashMap<NodeId, usize> = tree
            .children(self.parent_node)
            .iter()
            .enumerate()
            .map(|(position, child)| (*child, position))
            .collect();
        let mut previous: Option<usize> = None;
        for (position, fragment) in self.fragments.iter().enumerate() {
            let Some(node) = fragment.first_node() else {
                continue;
            };
            let Some(&found) = positions.get(&node) else {
                return Err(self.violation(format!(
                    "first node of fragment {position} is not under the parent node"
                )));
            };
            if previous.is_some_and(|before| found <= before) {
                return Err(self.violation(format!("fragment {position} is out of order")));
            }
            previous = Some(found);
        }

        for fragment in &self.fragments {
            fragment.verify(tree)?;
        }
        Ok(())
    }

    fn violation(&self, detail: String) -> RenderError {
        error!(section = self.id.raw(), keypath = %self.keypath, %detail, "section invariant violated");
        RenderError::InvariantViolation {
            section: self.id,
            keypath: self.keypath.clone(),
            detail,
        }
    }

    pub(crate) fn find_section(&self, id: SectionId) -> Option<&Section> {
        if self.id == id {
            return Some(self);
        }
        self.fragments
            .iter()
            .find_map(|fragment| fragment.find_section(id))
    }

    pub(crate) fn find_section_mut(
        &mut self,
        id: SectionId,
        next: Option<NodeId>,
    ) -> Option<(&mut Section, Option<NodeId>)> {
        if self.id == id {
            return Some((self, next));
        }
        let mut anchors = vec![None; self.fragments.len()];
        let mut following = next;
        for (position, fragment) in self.fragments.iter().enumerate().rev() {
            anchors[position] = following;
            if let Some(node) = fragment.first_node() {
                following = Some(node);
            }
        }
        for (fragment, anchor) in self.fragments.iter_mut().zip(anchors) {
            if let Some(found) = fragment.find_section_mut(id, anchor) {
                return Some(found);
            }
        }
        None
    }

    pub(crate) fn collect_bound_to(&self, keypath: &Keypath, out: &mut Vec<SectionId>) {
        if self.keypath == *keypath {
            out.push(self.id);
        }
        for fragment in &self.fragments {
            for section in item::child_sections(&fragment.items) {
                section.collect_bound_to(keypath, out);
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderOptions;
    use crate::render::Reorder;
    use crate::template::Partials;
    use serde_json::json;

    struct Harness {
        tree: DomTree,
        container: NodeId,
        options: RenderOptions,
        partials: Partials,
    }

    impl Harness {
        fn new() -> Self {
            let mut tree = DomTree::new();
            let container = tree.create_element("ul");
            let document = tree.document();
            tree.append_child(document, container).unwrap();
            Self {
                tree,
                container,
                options: RenderOptions::default(),
                partials: Partials::new(),
            }
        }

        fn section(&mut self, descriptor: &SectionDescriptor, data: &Value) -> Section {
            let mut section = Section::new(descriptor, &Scope::root(), self.container, data);
            let mut staging = StagingBuffer::new();
            let mut ctx = RenderContext::new(&mut self.tree, data, &self.partials, &self.options);
            section.render(&mut ctx, &mut staging).unwrap();
            staging.flush(&mut self.tree, self.container, None).unwrap();
            self.tree.take_stats();
            section
        }

        fn mutate(&mut self, section: &mut Section, data: &Value, mutation: Mutation) {
            let mut ctx = RenderContext::new(&mut self.tree, data, &self.partials, &self.options);
            section.apply_mutation(&mutation, &mut ctx, None).unwrap();
        }

        fn html(&self) -> String {
            self.tree.inner_html(self.container)
        }
    }

    fn rows() -> SectionDescriptor {
        SectionDescriptor::new("items").index_ref("i").children(vec![Descriptor::element(
            "li",
            vec![Descriptor::interpolator("i"), Descriptor::interpolator(".")],
        )])
    }

    #[test]
    fn renders_one_fragment_per_element() {
        let mut harness = Harness::new();
        let data = json!({ "items": ["a", "b"] });
        let section = harness.section(&rows(), &data);

        assert_eq!(section.mode(), SectionMode::List);
        assert_eq!(section.len(), 2);
        assert_eq!(harness.html(), "<li>0a</li><li>1b</li>");
        assert_eq!(section.to_html(&harness.tree), harness.html());
        section.verify(&harness.tree).unwrap();
    }

    #[test]
    fn append_inserts_in_one_commit() {
        let mut harness = Harness::new();
        let mut data = json!({ "items": ["a"] });
        let mut section = harness.section(&rows(), &data);
        let first = section.fragments()[0].id();

        data["items"] = json!(["a", "b", "c"]);
        harness.mutate(&mut section, &data, Mutation::Append(vec![json!("b"), json!("c")]));

        assert_eq!(harness.html(), "<li>0a</li><li>1b</li><li>2c</li>");
        assert_eq!(section.fragments()[0].id(), first);
        let stats = harness.tree.take_stats();
        assert_eq!(stats.commits, 1);
        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.removals, 0);
        section.verify(&harness.tree).unwrap();
    }

    #[test]
    fn remove_first_reassigns_the_rest() {
        let mut harness = Harness::new();
        let mut data = json!({ "items": ["a", "b", "c"] });
        let mut section = harness.section(&rows(), &data);

        data["items"] = json!(["b", "c"]);
        harness.mutate(&mut section, &data, Mutation::RemoveFirst);

        assert_eq!(section.len(), 2);
        assert_eq!(section.fragments()[0].keypath(), Some(&Keypath::parse("items.0")));
        assert_eq!(harness.html(), "<li>0b</li><li>1c</li>");
        section.verify(&harness.tree).unwrap();
    }

    #[test]
    fn balanced_splice_touches_nothing() {
        let mut harness = Harness::new();
        let data = json!({ "items": ["a", "b", "c"] });
        let mut section = harness.section(&rows(), &data);
        let ids: Vec<_> = section.fragments().iter().map(Fragment::id).collect();

        harness.mutate(
            &mut section,
            &data,
            Mutation::Splice {
                start: 1,
                delete_count: Some(1),
                items: vec![json!("b")],
            },
        );

        let after: Vec<_> = section.fragments().iter().map(Fragment::id).collect();
        assert_eq!(ids, after);
        assert!(harness.tree.take_stats().is_empty());
    }

    #[test]
    fn reorder_keeps_fragments() {
        let mut harness = Harness::new();
        let data = json!({ "items": ["b", "a"] });
        let mut section = harness.section(&rows(), &data);
        let ids: Vec<_> = section.fragments().iter().map(Fragment::id).collect();

        harness.mutate(&mut section, &data, Mutation::Reorder(Reorder::Sort));

        let after: Vec<_> = section.fragments().iter().map(Fragment::id).collect();
        assert_eq!(ids, after);
        assert!(harness.tree.take_stats().is_empty());
    }

    #[test]
    fn find_next_node_skips_empty_fragments() {
        let mut harness = Harness::new();
        let descriptor = SectionDescriptor::new("items").children(vec![SectionDescriptor::new(
            "tags",
        )
        .children(vec![Descriptor::interpolator(".")])
        .into()]);
        let data = json!({ "items": [{ "tags": [] }, { "tags": [] }, { "tags": ["x"] }] });
        let section = harness.section(&descriptor, &data);

        assert_eq!(section.fragments()[0].first_node(), None);
        let last = section.fragments()[2].first_node();
        assert!(last.is_some());
        assert_eq!(section.find_next_node(0, None), last);
        assert_eq!(section.find_next_node(2, None), None);
    }

    #[test]
    fn value_shapes_pick_the_mode() {
        let mut harness = Harness::new();
        let body = vec![Descriptor::text("x")];

        let data = json!({ "flag": true, "user": { "name": "n" }, "none": null, "empty": [] });
        let conditional = harness.section(&SectionDescriptor::new("flag").children(body.clone()), &data);
        let context = harness.section(&SectionDescriptor::new("user").children(body.clone()), &data);
        let empty = harness.section(&SectionDescriptor::new("none").children(body.clone()), &data);
        let inverted = harness.section(
            &SectionDescriptor::new("empty").inverted().children(body),
            &data,
        );

        assert_eq!(conditional.mode(), SectionMode::Conditional);
        assert_eq!(context.mode(), SectionMode::Context);
        assert_eq!(context.fragments()[0].scope().context.innermost(), Some(&Keypath::parse("user")));
        assert_eq!(empty.mode(), SectionMode::Empty);
        assert!(empty.is_empty());
        assert_eq!(inverted.mode(), SectionMode::Conditional);
        assert_eq!(inverted.len(), 1);
    }

    #[test]
    fn verify_reports_broken_order() {
        let mut harness = Harness::new();
        let data = json!({ "items": ["a", "b"] });
        let section = harness.section(&rows(), &data);

        // Move the first row to the end behind the section's back.
        let first = section.fragments()[0].first_node().unwrap();
        harness.tree.append_child(harness.container, first).unwrap();

        let err = section.verify(&harness.tree).unwrap_err();
        assert!(matches!(err, RenderError::InvariantViolation { .. }));
    }
}
