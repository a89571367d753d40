//! Interpolators
//!
//! A text interpolator owns one text node. An attribute binding owns one
//! attribute of an element and may mix static text with several references.
//! Both resolve their references once and keep the resulting [`Binding`]s;
//! they only write to the tree when the rendered text actually changes.

use crate::dom::NodeId;
use crate::error::DomError;
use crate::model::{Binding, Keypath, Scope};
use crate::template::{AttributeDescriptor, AttributePart};

use super::context::RenderContext;

/// `{{reference}}` rendered as a text node.
#[derive(Debug)]
pub struct Interpolator {
    reference: String,
    binding: Binding,
    node: NodeId,
    rendered: String,
}

impl Interpolator {
    pub(crate) fn render(reference: &str, scope: &Scope, ctx: &mut RenderContext<'_>) -> Self {
        let binding = scope.resolve(reference, ctx.data);
        let rendered = binding.text(scope, ctx.data);
        let node = ctx.tree.create_text(rendered.clone());
        Self {
            reference: reference.to_string(),
            binding,
            node,
            rendered,
        }
    }

    /// The reference as written in the template.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// What the reference resolved to.
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// The text node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The text currently in the tree.
    pub fn text(&self) -> &str {
        &self.rendered
    }

    /// Re-read the bound value. Returns true if the text node was rewritten.
    pub(crate) fn update(
        &mut self,
        scope: &Scope,
        ctx: &mut RenderContext<'_>,
    ) -> Result<bool, DomError> {
        let text = self.binding.text(scope, ctx.data);
        if text == self.rendered {
            return Ok(false);
        }
        ctx.tree.set_text(self.node, text.clone())?;
        self.rendered = text;
        Ok(true)
    }

    pub(crate) fn depends_on(&self, changed: &Keypath) -> bool {
        self.binding
            .keypath()
            .is_some_and(|keypath| keypath.overlaps(changed))
    }

    pub(crate) fn uses_alias(&self, alias: &str) -> bool {
        matches!(&self.binding, Binding::IndexRef(name) if name == alias)
    }

    pub(crate) fn rewrite(&mut self, map: impl Fn(&Keypath) -> Option<Keypath>) -> bool {
        self.binding.rewrite(map)
    }
}

#[derive(Debug)]
enum BoundPart {
    Text(String),
    Binding(Binding),
}

/// An attribute whose value is recomputed from its parts.
#[derive(Debug)]
pub struct AttributeBinding {
    element: NodeId,
    name: String,
    parts: Vec<BoundPart>,
    rendered: String,
}

impl AttributeBinding {
    pub(crate) fn render(
        element: NodeId,
        descriptor: &AttributeDescriptor,
        scope: &Scope,
        ctx: &mut RenderContext<'_>,
    ) -> Result<Self, DomError> {
        let parts = descriptor
            .value
            .iter()
            .map(|part| match part {
                AttributePart::Text { text } => BoundPart::Text(text.clone()),
                AttributePart::Interpolator { reference } => {
                    BoundPart::Binding(scope.resolve(reference, ctx.data))
                }
            })
            .collect();

        let mut attribute = Self {
            element,
            name: descriptor.name.clone(),
            parts,
            rendered: String::new(),
        };
        attribute.rendered = attribute.compose(scope, ctx);
        ctx.tree
            .set_attribute(element, attribute.name.clone(), attribute.rendered.clone())?;
        Ok(attribute)
    }

    /// The attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value currently in the tree.
    pub fn value(&self) -> &str {
        &self.rendered
    }

    fn compose(&self, scope: &Scope, ctx: &RenderContext<'_>) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                BoundPart::Text(text) => text.clone(),
                BoundPart::Binding(binding) => binding.text(scope, ctx.data),
            })
            .collect()
    }

    /// Recompute the value. Returns true if the attribute was rewritten.
    pub(crate) fn update(
        &mut self,
        scope: &Scope,
        ctx: &mut RenderContext<'_>,
    ) -> Result<bool, DomError> {
        let value = self.compose(scope, ctx);
        if value == self.rendered {
            return Ok(false);
        }
        ctx.tree
            .set_attribute(self.element, self.name.clone(), value.clone())?;
        self.rendered = value;
        Ok(true)
    }

    fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.parts.iter().filter_map(|part| match part {
            BoundPart::Binding(binding) => Some(binding),
            BoundPart::Text(_) => None,
        })
    }

    pub(crate) fn depends_on(&self, changed: &Keypath) -> bool {
        self.bindings()
            .filter_map(Binding::keypath)
            .any(|keypath| keypath.overlaps(changed))
    }

    pub(crate) fn uses_alias(&self, alias: &str) -> bool {
        self.bindings()
            .any(|binding| matches!(binding, Binding::IndexRef(name) if name == alias))
    }

    pub(crate) fn rewrite(&mut self, map: impl Fn(&Keypath) -> Option<Keypath>) -> bool {
        let mut changed = false;
        for part in &mut self.parts {
            if let BoundPart::Binding(binding) = part {
                changed |= binding.rewrite(&map);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderOptions;
    use crate::dom::DomTree;
    use crate::model::{ContextStack, IndexRefs};
    use crate::template::Partials;
    use serde_json::json;

    #[test]
    fn update_only_writes_changed_text() {
        let mut tree = DomTree::new();
        let options = RenderOptions::default();
        let partials = Partials::new();
        let scope = Scope::root();

        let data = json!({ "name": "a" });
        let mut ctx = RenderContext::new(&mut tree, &data, &partials, &options);
        let mut interpolator = Interpolator::render("name", &scope, &mut ctx);
        assert_eq!(interpolator.text(), "a");
        assert!(!interpolator.update(&scope, &mut ctx).unwrap());

        let data = json!({ "name": "b" });
        let mut ctx = RenderContext::new(&mut tree, &data, &partials, &options);
        assert!(interpolator.update(&scope, &mut ctx).unwrap());
        assert_eq!(tree.get(interpolator.node()).unwrap().text(), Some("b"));
    }

    #[test]
    fn attribute_mixes_text_and_aliases() {
        let mut tree = DomTree::new();
        let options = RenderOptions::default();
        let partials = Partials::new();
        let data = json!({ "items": [{ "kind": "odd" }] });
        let mut scope = Scope {
            context: ContextStack::new().extended(Keypath::parse("items.0")),
            index_refs: IndexRefs::new().with("i", 0),
        };

        let element = tree.create_element("li");
        let descriptor = AttributeDescriptor::new(
            "class",
            vec![
                AttributePart::text("row-"),
                AttributePart::interpolator("i"),
                AttributePart::text(" "),
                AttributePart::interpolator("kind"),
            ],
        );
        let mut ctx = RenderContext::new(&mut tree, &data, &partials, &options);
        let mut attribute = AttributeBinding::render(element, &descriptor, &scope, &mut ctx).unwrap();
        assert_eq!(attribute.value(), "row-0 odd");
        assert!(attribute.uses_alias("i"));
        assert!(attribute.depends_on(&Keypath::parse("items")));
        assert!(!attribute.depends_on(&Keypath::parse("other")));

        scope.index_refs.set("i", 3);
        assert!(attribute.update(&scope, &mut ctx).unwrap());
        assert_eq!(tree.get(element).unwrap().attribute("class"), Some("row-3 odd"));
    }
}
