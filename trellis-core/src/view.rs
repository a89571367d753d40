//! Views
//!
//! A [`View`] owns everything needed to keep one rendered template in sync
//! with its data: the host tree, the data, the template and the root
//! fragment. Data changes go through the view so the affected sections can
//! be notified.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, debug_span, trace};

use crate::config::RenderOptions;
use crate::dom::{DomTree, MutationStats, NodeId, StagingBuffer};
use crate::error::RenderError;
use crate::model::{data, Keypath, Scope};
use crate::render::{
    Change, Fragment, FragmentOptions, Mutation, RenderContext, Section, SectionId,
};
use crate::template::Template;

/// A rendered template bound to its data.
#[derive(Debug)]
pub struct View {
    tree: DomTree,
    data: Value,
    template: Template,
    options: RenderOptions,
    container: NodeId,
    root: Fragment,
}

impl View {
    /// Render `template` against `data` into a fresh container element.
    pub fn new(template: Template, data: Value, options: RenderOptions) -> Result<Self, RenderError> {
        let mut tree = DomTree::new();
        let container = tree.create_element(options.container_tag.clone());
        let document = tree.document();
        tree.append_child(document, container)?;

        let mut root = Fragment::new(FragmentOptions {
            descriptor: Arc::clone(&template.nodes),
            parent_node: container,
            owner: None,
            scope: Scope::root(),
            index: None,
            keypath: None,
        });

        let mut staging = StagingBuffer::new();
        let mut ctx = RenderContext::new(&mut tree, &data, &template.partials, &options);
        root.render(&mut ctx, &mut staging)?;
        staging.flush(&mut tree, container, None)?;
        tree.take_stats();
        debug!(nodes = tree.node_count(), "rendered view");

        Ok(Self {
            tree,
            data,
            template,
            options,
            container,
            root,
        })
    }

    /// Serialized contents of the container, read from the tree.
    pub fn html(&self) -> String {
        self.tree.inner_html(self.container)
    }

    /// Serialized contents, walked through the fragment structure.
    pub fn to_html(&self) -> String {
        self.root.to_html(&self.tree)
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The element the view renders into.
    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn root(&self) -> &Fragment {
        &self.root
    }

    /// Tree mutation counters since the last call.
    pub fn take_stats(&mut self) -> MutationStats {
        self.tree.take_stats()
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.root.find_section(id)
    }

    /// Sections bound exactly to `keypath`.
    pub fn sections_bound_to(&self, keypath: impl Into<Keypath>) -> Vec<SectionId> {
        self.root.sections_bound_to(&keypath.into())
    }

    /// Mutate the array at `keypath` and reconcile every section bound to it.
    pub fn mutate(&mut self, keypath: impl Into<Keypath>, mutation: Mutation) -> Result<(), RenderError> {
        let keypath = keypath.into();
        let span = debug_span!("mutate", %keypath, op = mutation.name());
        let _guard = span.enter();

        let array = data::get_mut(&mut self.data, &keypath)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| RenderError::NotAnArray {
                keypath: keypath.clone(),
            })?;
        mutation.apply_to(array);

        for id in self.root.sections_bound_to(&keypath) {
            // Rows removed by an enclosing section take their sections along.
            if self.root.find_section(id).is_none() {
                trace!(section = id.raw(), "section torn down before notification");
                continue;
            }
            self.notify(id, &mutation)?;
        }
        self.refresh(Change::mutated(keypath))
    }

    /// [`View::mutate`] by operation name. Unknown names are ignored.
    pub fn mutate_raw(
        &mut self,
        keypath: impl Into<Keypath>,
        op: &str,
        args: Vec<Value>,
    ) -> Result<(), RenderError> {
        match Mutation::from_raw(op, args) {
            Some(mutation) => self.mutate(keypath, mutation),
            None => {
                debug!(op, "ignoring unknown operation");
                Ok(())
            }
        }
    }

    /// Tell one section that its array was mutated. The data must already
    /// reflect the mutation.
    pub fn notify(&mut self, id: SectionId, mutation: &Mutation) -> Result<(), RenderError> {
        let Self {
            tree,
            data,
            template,
            options,
            root,
            ..
        } = self;
        let mut ctx = RenderContext::new(tree, data, &template.partials, options);
        let (section, next) = root
            .find_section_mut(id, None)
            .ok_or(RenderError::UnknownSection(id))?;
        section.apply_mutation(mutation, &mut ctx, next)?;
        if options.verify_invariants {
            section.verify(ctx.tree)?;
        }
        Ok(())
    }

    /// Replace the value at `keypath`.
    pub fn set(&mut self, keypath: impl Into<Keypath>, value: Value) -> Result<(), RenderError> {
        let keypath = keypath.into();
        let span = debug_span!("set", %keypath);
        let _guard = span.enter();

        data::set(&mut self.data, &keypath, value)?;
        self.refresh(Change::replaced(keypath))
    }

    fn refresh(&mut self, change: Change) -> Result<(), RenderError> {
        let Self {
            tree,
            data,
            template,
            options,
            root,
            ..
        } = self;
        let mut ctx = RenderContext::new(tree, data, &template.partials, options);
        root.refresh(&change, &mut ctx, None)?;
        if options.verify_invariants {
            root.verify(ctx.tree)?;
        }
        Ok(())
    }

    /// Check every section's invariants.
    pub fn verify(&self) -> Result<(), RenderError> {
        self.root.verify(&self.tree)
    }

    /// Remove the rendered content and its container. Returns the tree
    /// counters for the teardown itself.
    pub fn teardown(mut self) -> Result<MutationStats, RenderError> {
        self.tree.take_stats();
        self.root.teardown(&mut self.tree, false)?;
        self.tree.remove(self.container)?;
        Ok(self.tree.take_stats())
    }
}
