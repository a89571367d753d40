//! Data access over JSON values.
//!
//! Bound data is a [`serde_json::Value`]. Keypath segments index objects by
//! key and arrays by position; arrays additionally expose a read-only
//! `length`.

use std::borrow::Cow;

use serde_json::{Map, Value};

use super::keypath::Keypath;
use crate::error::RenderError;

/// Look up the value at `keypath`.
///
/// Returns an owned value only for the virtual `length` of an array.
pub fn get<'a>(data: &'a Value, keypath: &Keypath) -> Option<Cow<'a, Value>> {
    let segments = keypath.segments();
    let mut current = data;
    for (position, segment) in segments.iter().enumerate() {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => match segment.parse::<usize>() {
                Ok(index) => items.get(index)?,
                Err(_) if segment == "length" && position + 1 == segments.len() => {
                    return Some(Cow::Owned(Value::from(items.len())));
                }
                Err(_) => return None,
            },
            _ => return None,
        };
    }
    Some(Cow::Borrowed(current))
}

/// Mutable lookup. The virtual `length` is not addressable.
pub fn get_mut<'a>(data: &'a mut Value, keypath: &Keypath) -> Option<&'a mut Value> {
    let mut current = data;
    for segment in keypath.segments() {
        current = match current {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Store `value` at `keypath`, creating intermediate objects where the path
/// runs through missing or `null` values.
///
/// Arrays can be written at an existing index or appended to at their
/// length.
pub fn set(data: &mut Value, keypath: &Keypath, value: Value) -> Result<(), RenderError> {
    let invalid = || RenderError::InvalidSet {
        keypath: keypath.clone(),
    };

    let Some((last, parents)) = keypath.segments().split_last() else {
        *data = value;
        return Ok(());
    };

    let mut current = data;
    for segment in parents {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map.entry(segment.clone()).or_insert(Value::Null),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get_mut(index))
                .ok_or_else(invalid)?,
            _ => return Err(invalid()),
        };
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => {
            map.insert(last.clone(), value);
        }
        Value::Array(items) => {
            let index = last.parse::<usize>().map_err(|_| invalid())?;
            if index < items.len() {
                items[index] = value;
            } else if index == items.len() {
                items.push(value);
            } else {
                return Err(invalid());
            }
        }
        _ => return Err(invalid()),
    }
    Ok(())
}

/// Section truthiness. Empty arrays count as falsy, as do `null`, `false`,
/// `0`, the empty string and missing values.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(_)) => true,
    }
}

/// Text rendered for a value by an interpolator.
pub fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| display(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

/// Sort values by their displayed text, the default ordering of array
/// `sort` without a comparator.
pub fn sort_values(items: &mut [Value]) {
    items.sort_by_cached_key(|item| display(Some(item)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_walks_objects_and_arrays() {
        let data = json!({ "items": [{ "name": "a" }, { "name": "b" }] });
        let name = get(&data, &Keypath::parse("items.1.name")).unwrap();
        assert_eq!(name.as_ref(), &json!("b"));
        assert!(get(&data, &Keypath::parse("items.2.name")).is_none());
        assert!(get(&data, &Keypath::parse("items.x")).is_none());
        assert_eq!(get(&data, &Keypath::root()).unwrap().as_ref(), &data);
    }

    #[test]
    fn arrays_expose_length() {
        let data = json!({ "items": [1, 2, 3] });
        let length = get(&data, &Keypath::parse("items.length")).unwrap();
        assert_eq!(length.as_ref(), &json!(3));
        assert!(get_mut(&mut data.clone(), &Keypath::parse("items.length")).is_none());
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut data = json!({});
        set(&mut data, &Keypath::parse("a.b.c"), json!(1)).unwrap();
        assert_eq!(data, json!({ "a": { "b": { "c": 1 } } }));

        set(&mut data, &Keypath::root(), json!([1])).unwrap();
        assert_eq!(data, json!([1]));
    }

    #[test]
    fn set_into_arrays() {
        let mut data = json!({ "items": ["a", "b"] });
        set(&mut data, &Keypath::parse("items.1"), json!("x")).unwrap();
        set(&mut data, &Keypath::parse("items.2"), json!("c")).unwrap();
        assert_eq!(data, json!({ "items": ["a", "x", "c"] }));

        let err = set(&mut data, &Keypath::parse("items.9"), json!("z")).unwrap_err();
        assert!(matches!(err, RenderError::InvalidSet { .. }));
        let err = set(&mut data, &Keypath::parse("items.0.name"), json!("z")).unwrap_err();
        assert!(matches!(err, RenderError::InvalidSet { .. }));
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!([0]))));
        assert!(is_truthy(Some(&json!({}))));
        assert!(is_truthy(Some(&json!("no"))));
    }

    #[test]
    fn display_values() {
        assert_eq!(display(None), "");
        assert_eq!(display(Some(&json!("a"))), "a");
        assert_eq!(display(Some(&json!(2))), "2");
        assert_eq!(display(Some(&json!(true))), "true");
        assert_eq!(display(Some(&json!([1, "b", null]))), "1,b,");
        assert_eq!(display(Some(&json!({ "a": 1 }))), "[object Object]");
    }

    #[test]
    fn sort_uses_displayed_text() {
        let mut items = vec![json!(10), json!(9), json!(1)];
        sort_values(&mut items);
        assert_eq!(items, vec![json!(1), json!(10), json!(9)]);
    }
}
