//! Fragment Items
//!
//! A fragment's content is a flat list of [`Item`]s, one per top-level
//! descriptor (partials are inlined). Items own their DOM nodes; sections own
//! their fragments in turn.

use tracing::trace;

use crate::dom::{DomTree, NodeId, StagingBuffer};
use crate::error::{DomError, RenderError};
use crate::model::Scope;
use crate::template::Descriptor;

use super::context::RenderContext;
use super::interpolator::{AttributeBinding, Interpolator};
use super::section::{Section, SectionId};

/// One rendered piece of a fragment.
#[derive(Debug)]
pub enum Item {
    Text(NodeId),
    Interpolator(Interpolator),
    Element(Element),
    Section(Section),
}

/// A rendered element and its children.
#[derive(Debug)]
pub struct Element {
    pub(crate) node: NodeId,
    pub(crate) attributes: Vec<AttributeBinding>,
    pub(crate) children: Vec<Item>,
}

impl Element {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn attributes(&self) -> &[AttributeBinding] {
        &self.attributes
    }

    pub fn children(&self) -> &[Item] {
        &self.children
    }
}

impl Item {
    /// The first DOM node this item contributes, if any. Empty sections
    /// contribute nothing.
    pub fn first_node(&self) -> Option<NodeId> {
        match self {
            Item::Text(node) => Some(*node),
            Item::Interpolator(interpolator) => Some(interpolator.node()),
            Item::Element(element) => Some(element.node),
            Item::Section(section) => section.first_node(),
        }
    }

    /// Release the item. With `detach`, its top-level nodes are removed from
    /// the tree; without it, only bookkeeping is dropped because an ancestor
    /// node is being removed anyway.
    pub(crate) fn teardown(self, tree: &mut DomTree, detach: bool) -> Result<(), DomError> {
        match self {
            Item::Text(node) => {
                if detach {
                    tree.remove(node)?;
                }
            }
            Item::Interpolator(interpolator) => {
                if detach {
                    tree.remove(interpolator.node())?;
                }
            }
            Item::Element(element) => {
                for child in element.children {
                    child.teardown(tree, false)?;
                }
                if detach {
                    tree.remove(element.node)?;
                }
            }
            Item::Section(mut section) => section.teardown(tree, detach)?,
        }
        Ok(())
    }

    pub(crate) fn write_html(&self, tree: &DomTree, out: &mut String) {
        match self {
            Item::Text(node) => out.push_str(&tree.outer_html(*node)),
            Item::Interpolator(interpolator) => out.push_str(&tree.outer_html(interpolator.node())),
            Item::Element(element) => out.push_str(&tree.outer_html(element.node)),
            Item::Section(section) => out.push_str(&section.to_html(tree)),
        }
    }
}

/// Render `descriptors` in `scope`. Top-level nodes are pushed to `out` in
/// document order. An element is queued first and its nested content is
/// attached to it while it is still off the tree. On error every node
/// created so far is reachable from `out`.
pub(crate) fn render_items(
    descriptors: &[Descriptor],
    scope: &Scope,
    parent_node: NodeId,
    ctx: &mut RenderContext<'_>,
    out: &mut StagingBuffer,
) -> Result<Vec<Item>, RenderError> {
    let mut items = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        match descriptor {
            Descriptor::Text { text } => {
                let node = ctx.tree.create_text(text.clone());
                out.push(node);
                items.push(Item::Text(node));
            }
            Descriptor::Interpolator { reference } => {
                let interpolator = Interpolator::render(reference, scope, ctx);
                out.push(interpolator.node());
                items.push(Item::Interpolator(interpolator));
            }
            Descriptor::Element {
                tag,
                attributes,
                children,
            } => {
                let node = ctx.tree.create_element(tag.clone());
                out.push(node);
                let attributes = attributes
                    .iter()
                    .map(|attribute| AttributeBinding::render(node, attribute, scope, ctx))
                    .collect::<Result<Vec<_>, _>>()?;

                let mut inner = StagingBuffer::new();
                let children = match render_items(children, scope, node, ctx, &mut inner) {
                    Ok(children) => children,
                    Err(err) => {
                        inner.discard(ctx.tree)?;
                        return Err(err);
                    }
                };
                inner.flush(ctx.tree, node, None)?;

                items.push(Item::Element(Element {
                    node,
                    attributes,
                    children,
                }));
            }
            Descriptor::Section(section) => {
                let mut section = Section::new(section, scope, parent_node, ctx.data);
                section.render(ctx, out)?;
                items.push(Item::Section(section));
            }
            Descriptor::Partial { name } => {
                let partial = ctx.enter_partial(name)?;
                trace!(partial = %name, "expanding partial");
                let expanded = render_items(&partial, scope, parent_node, ctx, out);
                ctx.exit_partial();
                items.extend(expanded?);
            }
        }
    }

    Ok(items)
}

/// First DOM node of a run of items.
pub(crate) fn first_node(items: &[Item]) -> Option<NodeId> {
    items.iter().find_map(Item::first_node)
}

/// For each item, the node that directly follows its content: the first node
/// of a later sibling item, or `next` when none of them has one.
pub(crate) fn anchors(items: &[Item], next: Option<NodeId>) -> Vec<Option<NodeId>> {
    let mut anchors = vec![None; items.len()];
    let mut following = next;
    for (position, item) in items.iter().enumerate().rev() {
        anchors[position] = following;
        if let Some(node) = item.first_node() {
            following = Some(node);
        }
    }
    anchors
}

/// Find a section by id, together with the node that follows it.
pub(crate) fn find_section_mut(
    items: &mut [Item],
    id: SectionId,
    next: Option<NodeId>,
) -> Option<(&mut Section, Option<NodeId>)> {
    let anchors = anchors(items, next);
    for (item, anchor) in items.iter_mut().zip(anchors) {
        let found = match item {
            Item::Section(section) => section.find_section_mut(id, anchor),
            Item::Element(element) => find_section_mut(&mut element.children, id, None),
            Item::Text(_) | Item::Interpolator(_) => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

pub(crate) fn find_section(items: &[Item], id: SectionId) -> Option<&Section> {
    items.iter().find_map(|item| match item {
        Item::Section(section) => section.find_section(id),
        Item::Element(element) => find_section(&element.children, id),
        Item::Text(_) | Item::Interpolator(_) => None,
    })
}

/// Sections directly among `items`, looking through elements but not into
/// other sections.
pub(crate) fn child_sections(items: &[Item]) -> Vec<&Section> {
    let mut sections = Vec::new();
    let mut stack: Vec<&[Item]> = vec![items];
    while let Some(run) = stack.pop() {
        for item in run {
            match item {
                Item::Section(section) => sections.push(section),
                Item::Element(element) => stack.push(&element.children),
                Item::Text(_) | Item::Interpolator(_) => {}
            }
        }
    }
    sections
}
