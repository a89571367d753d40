//! Data Model
//!
//! Keypaths, scopes and data access. Bound data is plain
//! [`serde_json::Value`]; the renderer never owns a separate copy of it.
//!
//! # Concepts
//!
//! ## Keypaths
//!
//! A [`Keypath`] names a location such as `items.3.name`. List sections bind
//! fragment `i` to `<section keypath>.i`.
//!
//! ## Scopes
//!
//! A [`Scope`] is the context stack and index-ref aliases a fragment renders
//! in. References are resolved against it once and kept as [`Binding`]s;
//! when a fragment moves, its bindings are rewritten rather than resolved
//! again.

pub mod data;
mod keypath;
mod scope;

pub use keypath::Keypath;
pub use scope::{Binding, ContextStack, IndexRefs, Scope};
