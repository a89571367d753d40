//! Keypaths
//!
//! A keypath names a location in the bound data, e.g. `items.3.name`. Each
//! fragment of a list section is bound to `<section keypath>.<index>`, so
//! most of the reassignment work is rewriting keypath prefixes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A dotted path into the data model. The empty keypath is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Keypath {
    segments: SmallVec<[String; 4]>,
}

impl Keypath {
    /// The root keypath.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path. Empty segments are ignored, so `""` is the root.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// True for the root keypath.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Same as [`Keypath::is_root`].
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The first segment, if any.
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The keypath without its last segment.
    pub fn parent(&self) -> Option<Keypath> {
        if self.is_root() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// Append one segment.
    pub fn child(&self, segment: impl Into<String>) -> Keypath {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Append an array index, e.g. `items` -> `items.3`.
    pub fn index(&self, index: usize) -> Keypath {
        self.child(index.to_string())
    }

    /// Append every segment of `other`.
    pub fn join(&self, other: &Keypath) -> Keypath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Segment-wise prefix test. `items.1` is a prefix of `items.1.name` but
    /// not of `items.10`.
    pub fn starts_with(&self, prefix: &Keypath) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// True if one keypath is a prefix of the other, i.e. a change to either
    /// can affect the value at the other.
    pub fn overlaps(&self, other: &Keypath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }

    /// Replace `old` with `new` if this keypath starts with `old`.
    pub fn replace_prefix(&self, old: &Keypath, new: &Keypath) -> Option<Keypath> {
        if !self.starts_with(old) {
            return None;
        }
        let mut segments: SmallVec<[String; 4]> = new.segments.clone();
        segments.extend(self.segments[old.segments.len()..].iter().cloned());
        Some(Self { segments })
    }
}

impl fmt::Display for Keypath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for Keypath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Keypath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for Keypath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<Keypath> for String {
    fn from(keypath: Keypath) -> Self {
        keypath.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let keypath = Keypath::parse("items.3.name");
        assert_eq!(keypath.len(), 3);
        assert_eq!(keypath.first(), Some("items"));
        assert_eq!(keypath.last(), Some("name"));
        assert_eq!(keypath.to_string(), "items.3.name");

        assert!(Keypath::parse("").is_root());
        assert_eq!(Keypath::root().to_string(), "");
    }

    #[test]
    fn index_and_child() {
        let items = Keypath::parse("items");
        assert_eq!(items.index(3).to_string(), "items.3");
        assert_eq!(items.index(3).child("name").to_string(), "items.3.name");
        assert_eq!(items.index(3).parent(), Some(items.clone()));
        assert_eq!(Keypath::root().parent(), None);
    }

    #[test]
    fn prefix_is_segment_wise() {
        let one = Keypath::parse("items.1");
        assert!(Keypath::parse("items.1.name").starts_with(&one));
        assert!(!Keypath::parse("items.10").starts_with(&one));
        assert!(one.starts_with(&Keypath::root()));
        assert!(one.overlaps(&Keypath::parse("items")));
        assert!(!one.overlaps(&Keypath::parse("items.2")));
    }

    #[test]
    fn replace_prefix_rewrites_head() {
        let old = Keypath::parse("items.3");
        let new = Keypath::parse("items.2");
        assert_eq!(
            Keypath::parse("items.3.tags.0").replace_prefix(&old, &new),
            Some(Keypath::parse("items.2.tags.0"))
        );
        assert_eq!(Keypath::parse("items.30").replace_prefix(&old, &new), None);
    }

    #[test]
    fn serializes_as_dotted_string() {
        let keypath = Keypath::parse("a.b");
        let json = serde_json::to_string(&keypath).unwrap();
        assert_eq!(json, "\"a.b\"");
        let back: Keypath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, keypath);
    }
}
