//! Reassignment
//!
//! After a splice changes the length of a list, every fragment after the
//! splice point sits at a new index. Reassignment relabels those fragments in
//! place instead of rebuilding them:
//!
//! - the fragment's `index` and `keypath` move to the new position
//! - every keypath under `<list>.<old>` is rewritten to `<list>.<new>`, in
//!   bindings, context stacks and nested sections alike
//! - the section's index-ref alias takes the new index, and anything bound
//!   to that alias re-renders its text
//!
//! A nested section that declares the same alias shadows it; relabelling
//! continues into it with the alias left alone.
//!
//! A nested section bound outside the moved row (for instance to the list
//! itself) owns rows whose keypaths can coincide with the moved one. Those
//! rows are kept: their own keypaths stay put and only references into the
//! enclosing row follow the move. The nested section reconciles its rows
//! when it is notified itself.

use tracing::trace;

use crate::error::RenderError;
use crate::model::{Keypath, Scope};

use super::context::RenderContext;
use super::fragment::Fragment;
use super::item::Item;
use super::section::Section;

/// A keypath move plus an optional alias update.
#[derive(Debug, Clone)]
pub(crate) struct Relabel<'a> {
    pub old: Keypath,
    pub new: Keypath,
    pub alias: Option<(&'a str, usize)>,
    /// Keypaths under any of these prefixes do not move.
    pub kept: Vec<Keypath>,
}

impl<'a> Relabel<'a> {
    pub(crate) fn new(old: Keypath, new: Keypath, alias: Option<(&'a str, usize)>) -> Self {
        Self {
            old,
            new,
            alias,
            kept: Vec::new(),
        }
    }

    fn alias_name(&self) -> Option<&str> {
        self.alias.map(|(name, _)| name)
    }

    /// Where `keypath` moves to, if it moves at all.
    fn moved(&self, keypath: &Keypath) -> Option<Keypath> {
        if self.kept.iter().any(|kept| keypath.starts_with(kept)) {
            return None;
        }
        keypath.replace_prefix(&self.old, &self.new)
    }

    /// Same move, alias untouched.
    fn shadowed(&self) -> Relabel<'static> {
        Relabel {
            old: self.old.clone(),
            new: self.new.clone(),
            alias: None,
            kept: self.kept.clone(),
        }
    }

    fn keeping(&self, keypath: Keypath) -> Self {
        let mut relabel = self.clone();
        relabel.kept.push(keypath);
        relabel
    }
}

impl Section {
    /// Shift the fragments in `start..end` by `shift` positions: fragment `i`
    /// used to be at `i - shift`.
    pub(crate) fn reassign(
        &mut self,
        start: usize,
        end: usize,
        shift: isize,
        ctx: &mut RenderContext<'_>,
    ) -> Result<(), RenderError> {
        if shift == 0 || start >= end {
            return Ok(());
        }
        trace!(section = self.id().raw(), start, end, shift, "reassigning fragments");

        let alias = self.index_ref().map(str::to_owned);
        for index in start..end {
            let old = (index as isize - shift) as usize;
            let relabel = Relabel::new(
                self.keypath.index(old),
                self.keypath.index(index),
                alias.as_deref().map(|alias| (alias, index)),
            );
            self.fragments[index].relabel(&relabel, Some(index), ctx)?;
        }
        Ok(())
    }

    /// Follow a move of an enclosing fragment.
    fn relabel(
        &mut self,
        relabel: &Relabel<'_>,
        ctx: &mut RenderContext<'_>,
    ) -> Result<(), RenderError> {
        let inside = match relabel.moved(&self.keypath) {
            Some(keypath) => {
                self.keypath = keypath;
                true
            }
            None => false,
        };
        self.scope.context.rewrite(|context| relabel.moved(context));
        if let Some((alias, index)) = relabel.alias {
            self.scope.index_refs.set(alias, index);
        }

        let inner = match (self.index_ref(), relabel.alias_name()) {
            (Some(own), Some(outer)) if own == outer => relabel.shadowed(),
            _ => relabel.clone(),
        };
        for fragment in &mut self.fragments {
            let own = fragment
                .keypath
                .clone()
                .filter(|keypath| !inside && relabel.moved(keypath).is_some());
            match own {
                Some(own) => {
                    fragment.scope.context = self.scope.context.extended(own.clone());
                    fragment.relabel(&inner.keeping(own), None, ctx)?;
                }
                None => fragment.relabel(&inner, None, ctx)?,
            }
        }
        Ok(())
    }
}

impl Fragment {
    /// Apply a move to this fragment and everything in it. `index` is set
    /// for fragments of the list being reassigned.
    pub(crate) fn relabel(
        &mut self,
        relabel: &Relabel<'_>,
        index: Option<usize>,
        ctx: &mut RenderContext<'_>,
    ) -> Result<(), RenderError> {
        if index.is_some() {
            self.index = index;
        }
        if let Some(keypath) = self.keypath.as_ref().and_then(|keypath| relabel.moved(keypath)) {
            self.keypath = Some(keypath);
        }
        self.scope.context.rewrite(|context| relabel.moved(context));
        if let Some((alias, index)) = relabel.alias {
            self.scope.index_refs.set(alias, index);
        }
        relabel_items(&mut self.items, relabel, &self.scope, ctx)
    }
}

fn relabel_items(
    items: &mut [Item],
    relabel: &Relabel<'_>,
    scope: &Scope,
    ctx: &mut RenderContext<'_>,
) -> Result<(), RenderError> {
    let alias = relabel.alias_name();
    for item in items {
        match item {
            Item::Text(_) => {}
            Item::Interpolator(interpolator) => {
                interpolator.rewrite(|keypath| relabel.moved(keypath));
                if alias.is_some_and(|alias| interpolator.uses_alias(alias)) {
                    interpolator.update(scope, ctx)?;
                }
            }
            Item::Element(element) => {
                for attribute in &mut element.attributes {
                    attribute.rewrite(|keypath| relabel.moved(keypath));
                    if alias.is_some_and(|alias| attribute.uses_alias(alias)) {
                        attribute.update(scope, ctx)?;
                    }
                }
                relabel_items(&mut element.children, relabel, scope, ctx)?;
            }
            Item::Section(section) => section.relabel(relabel, ctx)?,
        }
    }
    Ok(())
}
