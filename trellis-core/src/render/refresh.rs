//! Refresh
//!
//! After data changes, bindings that depend on the changed keypath re-read
//! their values. Sections bound at or below the change check that their
//! rendered shape still fits the value and rebuild if it does not; a list
//! whose array was mutated in place has already been reconciled and only
//! needs its values re-read.

use tracing::trace;

use crate::dom::NodeId;
use crate::error::RenderError;
use crate::model::Scope;

use super::context::{Change, ChangeKind, RenderContext};
use super::fragment::Fragment;
use super::item::Item;
use super::section::Section;

impl Fragment {
    /// Follow `change`. `next` is the node following the fragment.
    pub(crate) fn refresh(
        &mut self,
        change: &Change,
        ctx: &mut RenderContext<'_>,
        next: Option<NodeId>,
    ) -> Result<(), RenderError> {
        refresh_items(&mut self.items, change, &self.scope, ctx, next)
    }
}

impl Section {
    pub(crate) fn refresh(
        &mut self,
        change: &Change,
        ctx: &mut RenderContext<'_>,
        next: Option<NodeId>,
    ) -> Result<(), RenderError> {
        if self.keypath.starts_with(&change.keypath) {
            let replaced = change.kind == ChangeKind::Replaced && self.keypath == change.keypath;
            if replaced || !self.fits(ctx.data) {
                trace!(section = self.id().raw(), keypath = %self.keypath, "value no longer fits");
                return self.rerender(ctx, next);
            }
        }

        let mut following = next;
        for fragment in self.fragments.iter_mut().rev() {
            fragment.refresh(change, ctx, following)?;
            if let Some(node) = fragment.first_node() {
                following = Some(node);
            }
        }
        Ok(())
    }
}

/// Refresh a run of items. Walks backwards so each section knows which node
/// follows it.
fn refresh_items(
    items: &mut [Item],
    change: &Change,
    scope: &Scope,
    ctx: &mut RenderContext<'_>,
    next: Option<NodeId>,
) -> Result<(), RenderError> {
    let mut following = next;
    for item in items.iter_mut().rev() {
        match item {
            Item::Text(_) => {}
            Item::Interpolator(interpolator) => {
                if interpolator.depends_on(&change.keypath) {
                    interpolator.update(scope, ctx)?;
                }
            }
            Item::Element(element) => {
                for attribute in &mut element.attributes {
                    if attribute.depends_on(&change.keypath) {
                        attribute.update(scope, ctx)?;
                    }
                }
                refresh_items(&mut element.children, change, scope, ctx, None)?;
            }
            Item::Section(section) => section.refresh(change, ctx, following)?,
        }
        if let Some(node) = item.first_node() {
            following = Some(node);
        }
    }
    Ok(())
}
