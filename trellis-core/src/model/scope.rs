//! Scopes and Reference Resolution
//!
//! Every fragment renders inside a scope: the stack of context keypaths
//! established by enclosing sections, plus the index-ref aliases they
//! declared. A reference such as `name` or `i` is resolved against the scope
//! once, at render time, into a [`Binding`].
//!
//! # Resolution order
//!
//! 1. `.` and `this` bind to the innermost context.
//! 2. `.name` binds relative to the innermost context.
//! 3. A single-segment reference naming an index ref binds to that alias.
//! 4. Otherwise the innermost context whose value has the reference's first
//!    segment wins. If none does, the reference binds from the root.

use indexmap::IndexMap;
use serde_json::Value;
use smallvec::SmallVec;

use super::data;
use super::keypath::Keypath;

/// Ordered stack of context keypaths, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextStack(SmallVec<[Keypath; 4]>);

impl ContextStack {
    /// An empty stack. References resolve from the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of this stack with `keypath` pushed as the innermost context.
    pub fn extended(&self, keypath: Keypath) -> Self {
        let mut stack = self.0.clone();
        stack.push(keypath);
        Self(stack)
    }

    /// The innermost context.
    pub fn innermost(&self) -> Option<&Keypath> {
        self.0.last()
    }

    /// Contexts from outermost to innermost.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Keypath> {
        self.0.iter()
    }

    /// Number of contexts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there is no context.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rewrite every context under `old` to live under `new` instead.
    pub fn replace_prefix(&mut self, old: &Keypath, new: &Keypath) {
        self.rewrite(|context| context.replace_prefix(old, new));
    }

    /// Replace each context for which `map` returns a new keypath.
    pub fn rewrite(&mut self, map: impl Fn(&Keypath) -> Option<Keypath>) {
        for context in self.0.iter_mut() {
            if let Some(rewritten) = map(context) {
                *context = rewritten;
            }
        }
    }
}

/// Index-ref aliases visible in a scope, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRefs(IndexMap<String, usize>);

impl IndexRefs {
    /// No aliases.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy with `alias` bound to `index`, shadowing any outer alias of the
    /// same name.
    pub fn with(&self, alias: &str, index: usize) -> Self {
        let mut refs = self.0.clone();
        refs.insert(alias.to_string(), index);
        Self(refs)
    }

    /// The index exposed under `alias`.
    pub fn get(&self, alias: &str) -> Option<usize> {
        self.0.get(alias).copied()
    }

    /// Whether `alias` is declared in this scope.
    pub fn contains(&self, alias: &str) -> bool {
        self.0.contains_key(alias)
    }

    /// Update an existing alias. Returns false if it is not declared.
    pub fn set(&mut self, alias: &str, index: usize) -> bool {
        match self.0.get_mut(alias) {
            Some(current) => {
                *current = index;
                true
            }
            None => false,
        }
    }
}

/// What a reference resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A location in the data.
    Keypath(Keypath),
    /// An index-ref alias.
    IndexRef(String),
}

impl Binding {
    /// The bound keypath, for data bindings.
    pub fn keypath(&self) -> Option<&Keypath> {
        match self {
            Binding::Keypath(keypath) => Some(keypath),
            Binding::IndexRef(_) => None,
        }
    }

    /// Current text for this binding.
    pub fn text(&self, scope: &Scope, data: &Value) -> String {
        match self {
            Binding::Keypath(keypath) => {
                data::display(data::get(data, keypath).as_deref())
            }
            Binding::IndexRef(alias) => scope
                .index_refs
                .get(alias)
                .map(|index| index.to_string())
                .unwrap_or_default(),
        }
    }

    /// Rewrite a keypath binding under `old` to live under `new`. Returns
    /// true if the binding changed.
    pub fn replace_prefix(&mut self, old: &Keypath, new: &Keypath) -> bool {
        self.rewrite(|keypath| keypath.replace_prefix(old, new))
    }

    /// Replace a keypath binding if `map` returns a new keypath.
    pub fn rewrite(&mut self, map: impl Fn(&Keypath) -> Option<Keypath>) -> bool {
        if let Binding::Keypath(keypath) = self {
            if let Some(rewritten) = map(keypath) {
                *keypath = rewritten;
                return true;
            }
        }
        false
    }
}

/// The resolution environment of a fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub context: ContextStack,
    pub index_refs: IndexRefs,
}

impl Scope {
    /// The root scope: no contexts, no aliases.
    pub fn root() -> Self {
        Self::default()
    }

    /// Resolve a reference to a binding.
    pub fn resolve(&self, reference: &str, data: &Value) -> Binding {
        if !reference.contains('.') && self.index_refs.contains(reference) {
            return Binding::IndexRef(reference.to_string());
        }
        Binding::Keypath(self.resolve_keypath(reference, data))
    }

    /// Resolve a reference to a keypath, ignoring index refs.
    pub fn resolve_keypath(&self, reference: &str, data: &Value) -> Keypath {
        let innermost = || self.context.innermost().cloned().unwrap_or_default();

        if reference == "." || reference == "this" {
            return innermost();
        }
        if let Some(relative) = reference.strip_prefix('.') {
            return innermost().join(&Keypath::parse(relative));
        }

        let target = Keypath::parse(reference);
        let Some(head) = target.first() else {
            return innermost();
        };

        for context in self.context.iter().rev() {
            if data::get(data, &context.child(head)).is_some() {
                return context.join(&target);
            }
        }
        target
    }
}
