//! Trellis Core
//!
//! This crate provides the list rendering engine for the Trellis reactive
//! template renderer. It implements:
//!
//! - A host node tree with batched, counted insertions
//! - Keypaths, scopes and data access over `serde_json` values
//! - Sections that render a block once per array element
//! - Incremental reconciliation of in-place array mutations
//!
//! When a bound array is pushed to, popped, shifted, spliced or sorted, only
//! the affected tail of the section changes: new rows are built off-tree and
//! inserted with a single tree operation, removed rows are torn down, and
//! rows that moved are relabelled in place instead of being rebuilt.
//!
//! # Architecture
//!
//! - `dom`: host node tree and staging buffer
//! - `model`: keypaths, scopes and data access
//! - `template`: compiled template descriptors
//! - `render`: fragments, sections and the reconciliation algorithm
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use trellis_core::template::{Descriptor, SectionDescriptor, Template};
//! use trellis_core::{Mutation, RenderOptions, View};
//!
//! let template = Template::new(vec![SectionDescriptor::new("items")
//!     .children(vec![Descriptor::element("li", vec![Descriptor::interpolator(".")])])
//!     .into()]);
//!
//! let mut view = View::new(template, json!({ "items": ["a", "b"] }), RenderOptions::default())?;
//! view.mutate("items", Mutation::Append(vec![json!("c")]))?;
//!
//! assert_eq!(view.html(), "<li>a</li><li>b</li><li>c</li>");
//! # Ok::<(), trellis_core::RenderError>(())
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod model;
pub mod render;
pub mod template;
mod view;

pub use config::RenderOptions;
pub use error::{DomError, RenderError};
pub use model::Keypath;
pub use render::{Fragment, FragmentId, Mutation, Reorder, Section, SectionId, Splice};
pub use template::Template;
pub use view::View;
