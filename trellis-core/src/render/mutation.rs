//! Array Mutations
//!
//! Every in-place array operation a list section reacts to, and its
//! reduction to a canonical [`Splice`]. Raw operation names (`push`, `pop`,
//! `shift`, `unshift`, `splice`, `sort`, `reverse`) are accepted through
//! [`Mutation::from_raw`]; anything else is not a mutation.

use serde_json::Value;

use crate::model::data;

/// An in-place change to a bound array.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Add items at the end.
    Append(Vec<Value>),
    /// Remove the last item.
    RemoveLast,
    /// Remove the first item.
    RemoveFirst,
    /// Add items at the start.
    Prepend(Vec<Value>),
    /// Remove `delete_count` items at `start` and insert `items` there.
    /// A negative start counts from the end; no delete count removes
    /// everything from `start` on.
    Splice {
        start: i64,
        delete_count: Option<usize>,
        items: Vec<Value>,
    },
    /// Reorder the items without changing the length.
    Reorder(Reorder),
}

/// Kinds of reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reorder {
    Sort,
    Reverse,
    /// The caller already reordered the array.
    External,
}

/// A normalized splice: `removed` items at `start` replaced by `added` new
/// ones. `start + removed` never exceeds the length it was normalized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splice {
    pub start: usize,
    pub removed: usize,
    pub added: usize,
}

impl Splice {
    pub fn new(start: usize, removed: usize, added: usize) -> Self {
        Self {
            start,
            removed,
            added,
        }
    }

    /// Resolve raw splice arguments against an array of length `len`.
    pub fn normalize(start: i64, delete_count: Option<usize>, added: usize, len: usize) -> Self {
        let start = if start < 0 {
            len.saturating_sub(start.unsigned_abs() as usize)
        } else {
            (start as u64).min(len as u64) as usize
        };
        let available = len - start;
        let removed = delete_count.map_or(available, |count| count.min(available));
        Self::new(start, removed, added)
    }

    /// Clamp to an array of length `len`.
    pub fn clamped(self, len: usize) -> Self {
        let start = self.start.min(len);
        Self::new(start, self.removed.min(len - start), self.added)
    }

    /// Net change in length.
    pub fn balance(&self) -> isize {
        self.added as isize - self.removed as isize
    }
}

impl Mutation {
    /// Parse a raw operation. Returns `None` for names that are not array
    /// mutations.
    pub fn from_raw(op: &str, args: Vec<Value>) -> Option<Self> {
        let mutation = match op {
            "push" | "append" => Mutation::Append(args),
            "pop" | "remove-last" => Mutation::RemoveLast,
            "shift" | "remove-first" => Mutation::RemoveFirst,
            "unshift" | "prepend" => Mutation::Prepend(args),
            "splice" => {
                let mut args = args.into_iter();
                match args.next() {
                    // splice() with no arguments changes nothing
                    None => Mutation::Splice {
                        start: 0,
                        delete_count: Some(0),
                        items: Vec::new(),
                    },
                    Some(start) => {
                        let start = to_integer(&start);
                        let delete_count = match args.next() {
                            None | Some(Value::Null) => None,
                            Some(count) => Some(to_integer(&count).max(0) as usize),
                        };
                        Mutation::Splice {
                            start,
                            delete_count,
                            items: args.collect(),
                        }
                    }
                }
            }
            "sort" => Mutation::Reorder(Reorder::Sort),
            "reverse" => Mutation::Reorder(Reorder::Reverse),
            "reorder" => Mutation::Reorder(Reorder::External),
            _ => return None,
        };
        Some(mutation)
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Append(_) => "append",
            Mutation::RemoveLast => "remove-last",
            Mutation::RemoveFirst => "remove-first",
            Mutation::Prepend(_) => "prepend",
            Mutation::Splice { .. } => "splice",
            Mutation::Reorder(Reorder::Sort) => "sort",
            Mutation::Reorder(Reorder::Reverse) => "reverse",
            Mutation::Reorder(Reorder::External) => "reorder",
        }
    }

    /// The splice this mutation amounts to on an array of length `len`.
    /// Reorders have none.
    pub fn to_splice(&self, len: usize) -> Option<Splice> {
        let splice = match self {
            Mutation::Append(items) => Splice::new(len, 0, items.len()),
            Mutation::RemoveLast => match len {
                0 => Splice::new(0, 0, 0),
                _ => Splice::new(len - 1, 1, 0),
            },
            Mutation::RemoveFirst => Splice::new(0, len.min(1), 0),
            Mutation::Prepend(items) => Splice::new(0, 0, items.len()),
            Mutation::Splice {
                start,
                delete_count,
                items,
            } => Splice::normalize(*start, *delete_count, items.len(), len),
            Mutation::Reorder(_) => return None,
        };
        Some(splice)
    }

    /// Perform the mutation on `array`.
    pub fn apply_to(&self, array: &mut Vec<Value>) {
        match self {
            Mutation::Append(items) => array.extend(items.iter().cloned()),
            Mutation::RemoveLast => {
                array.pop();
            }
            Mutation::RemoveFirst => {
                if !array.is_empty() {
                    array.remove(0);
                }
            }
            Mutation::Prepend(items) => {
                array.splice(0..0, items.iter().cloned());
            }
            Mutation::Splice {
                start,
                delete_count,
                items,
            } => {
                let splice = Splice::normalize(*start, *delete_count, items.len(), array.len());
                array.splice(
                    splice.start..splice.start + splice.removed,
                    items.iter().cloned(),
                );
            }
            Mutation::Reorder(Reorder::Sort) => data::sort_values(array),
            Mutation::Reorder(Reorder::Reverse) => array.reverse(),
            Mutation::Reorder(Reorder::External) => {}
        }
    }
}

/// Integer value of a raw argument; non-numbers count as zero.
fn to_integer(value: &Value) -> i64 {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|number| number.trunc() as i64))
        .unwrap_or(0)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
