//! Rendering and Reconciliation
//!
//! A view's content is a tree of [`Fragment`]s and [`Section`]s. Fragments
//! own items (text, interpolators, elements, sections); sections own the
//! fragments they render for their bound value.
//!
//! # Architecture
//!
//! ```text
//!  View ─► Fragment (root)
//!            ├─ Item::Element ─► children: Vec<Item>
//!            ├─ Item::Interpolator
//!            └─ Item::Section ─► Vec<Fragment> ─► items ...
//! ```
//!
//! Ownership runs strictly downwards. Nothing holds a pointer back to its
//! owner: the node following a section (its insertion anchor) is computed
//! on the way down and passed in, and sections are addressed by
//! [`SectionId`].
//!
//! When a bound array is mutated in place, the owning section reconciles its
//! fragment list with one [`Splice`]; see [`section`] for the algorithm and
//! [`reassign`] for how shifted fragments are relabelled.

mod context;
mod fragment;
mod interpolator;
mod item;
mod mutation;
pub mod reassign;
mod refresh;
pub mod section;

pub use context::{Change, ChangeKind, RenderContext};
pub use fragment::{Fragment, FragmentId, FragmentOptions};
pub use interpolator::{AttributeBinding, Interpolator};
pub use item::{Element, Item};
pub use mutation::{Mutation, Reorder, Splice};
pub use section::{Section, SectionId, SectionMode};
