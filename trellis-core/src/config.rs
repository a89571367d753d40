//! Render Options
//!
//! Options are plain data so they can be loaded from JSON alongside a
//! template. Every field has a default, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};

fn default_max_partial_depth() -> usize {
    32
}

fn default_container_tag() -> String {
    "div".to_string()
}

/// Options controlling how a [`View`](crate::View) renders and reconciles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Re-check index, keypath and node-order consistency after every
    /// mutation and fail with
    /// [`RenderError::InvariantViolation`](crate::RenderError::InvariantViolation)
    /// when they do not hold.
    #[serde(default)]
    pub verify_invariants: bool,

    /// How deeply partials may include other partials.
    #[serde(default = "default_max_partial_depth")]
    pub max_partial_depth: usize,

    /// Tag of the element the view renders into.
    #[serde(default = "default_container_tag")]
    pub container_tag: String,
}

impl RenderOptions {
    /// Parse options from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Enable invariant verification.
    pub fn verified(mut self) -> Self {
        self.verify_invariants = true;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            verify_invariants: false,
            max_partial_depth: default_max_partial_depth(),
            container_tag: default_container_tag(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let options = RenderOptions::from_json("{}").unwrap();
        assert_eq!(options, RenderOptions::default());
        assert_eq!(options.max_partial_depth, 32);
        assert_eq!(options.container_tag, "div");
    }

    #[test]
    fn fields_override_defaults() {
        let options = RenderOptions::from_json(
            r#"{"verify_invariants": true, "container_tag": "ul"}"#,
        )
        .unwrap();
        assert!(options.verify_invariants);
        assert_eq!(options.container_tag, "ul");
        assert_eq!(options.max_partial_depth, 32);
    }
}
