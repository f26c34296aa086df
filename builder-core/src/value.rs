//! Property values carried by component nodes.
//!
//! A property is either a [`BoundValue`] (a literal or a data-binding path with
//! a fallback default), a child reference ([`ChildList`] or a single id), or a
//! raw JSON value kept verbatim for shapes the registry does not know.
//!
//! ```json
//! {
//!   "content": { "literalString": "Hello" },
//!   "count":   { "path": "/cart/items", "defaultValue": 3 },
//!   "children": { "explicitList": ["title", "body"] },
//!   "child": "body"
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property bag of a node, ordered by property name.
pub type Props = BTreeMap<String, PropValue>;

/// Preview value used when a path binding has no data yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathDefault {
    /// String fallback.
    String(String),
    /// Numeric fallback.
    Number(f64),
    /// Boolean fallback.
    Bool(bool),
}

impl PathDefault {
    /// Convert the fallback to JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Number(n) => number_value(*n),
            Self::Bool(b) => Value::Bool(*b),
        }
    }
}

/// Runtime data-binding path with an optional fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathBinding {
    /// Slash-separated path into the surface data model.
    pub path: String,
    /// Value used when the path does not resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<PathDefault>,
}

/// One entry of an options list (select, radio group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Text shown to the user.
    pub label: String,
    /// Value reported on selection.
    pub value: String,
}

impl SelectOption {
    /// Create an option.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A literal or a data-bound property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundValue {
    /// Value read from the data model at runtime.
    Path(PathBinding),
    /// Literal string.
    LiteralString {
        /// The string.
        #[serde(rename = "literalString")]
        value: String,
    },
    /// Literal number.
    LiteralNumber {
        /// The number.
        #[serde(rename = "literalNumber")]
        value: f64,
    },
    /// Literal boolean.
    LiteralBool {
        /// The flag.
        #[serde(rename = "literalBool")]
        value: bool,
    },
    /// Literal options list.
    LiteralOptions {
        /// The options.
        #[serde(rename = "literalOptions")]
        value: Vec<SelectOption>,
    },
    /// Literal arbitrary JSON (chart data, action payloads).
    LiteralJson {
        /// The JSON document.
        #[serde(rename = "literalJson")]
        value: Value,
    },
}

impl BoundValue {
    /// Literal string value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::LiteralString {
            value: value.into(),
        }
    }

    /// Literal number value.
    #[must_use]
    pub fn number(value: f64) -> Self {
        Self::LiteralNumber { value }
    }

    /// Literal boolean value.
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::LiteralBool { value }
    }

    /// Literal options list.
    #[must_use]
    pub fn options(value: Vec<SelectOption>) -> Self {
        Self::LiteralOptions { value }
    }

    /// Literal JSON value.
    #[must_use]
    pub fn json(value: Value) -> Self {
        Self::LiteralJson { value }
    }

    /// Data-binding path without a fallback.
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(PathBinding {
            path: path.into(),
            default_value: None,
        })
    }

    /// Data-binding path with a fallback.
    #[must_use]
    pub fn path_with_default(path: impl Into<String>, default: PathDefault) -> Self {
        Self::Path(PathBinding {
            path: path.into(),
            default_value: Some(default),
        })
    }

    /// Whether this is a literal (not a binding).
    #[must_use]
    pub fn is_literal(&self) -> bool {
        !matches!(self, Self::Path(_))
    }

    /// The literal string, if this is one.
    #[must_use]
    pub fn as_literal_str(&self) -> Option<&str> {
        match self {
            Self::LiteralString { value } => Some(value),
            _ => None,
        }
    }

    /// Evaluate against a data model.
    ///
    /// Paths are JSON pointers (`/user/name`); a missing leading slash is
    /// tolerated. Unresolved paths yield the fallback, or `null`.
    #[must_use]
    pub fn resolve(&self, data: &Value) -> Value {
        match self {
            Self::LiteralString { value } => Value::String(value.clone()),
            Self::LiteralNumber { value } => number_value(*value),
            Self::LiteralBool { value } => Value::Bool(*value),
            Self::LiteralOptions { value } => {
                serde_json::to_value(value).unwrap_or(Value::Null)
            }
            Self::LiteralJson { value } => value.clone(),
            Self::Path(binding) => {
                let pointer = if binding.path.starts_with('/') {
                    binding.path.clone()
                } else {
                    format!("/{}", binding.path)
                };
                data.pointer(&pointer).cloned().unwrap_or_else(|| {
                    binding
                        .default_value
                        .as_ref()
                        .map_or(Value::Null, PathDefault::to_value)
                })
            }
        }
    }
}

/// Ordered list of child ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildList {
    /// Child ids in render order.
    pub explicit_list: Vec<String>,
}

impl ChildList {
    /// Create a list from ids.
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            explicit_list: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// A single property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// Literal or bound value.
    Bound(BoundValue),
    /// Explicit list of child ids.
    Children(ChildList),
    /// Single child id (slot reference).
    Ref(String),
    /// Any other JSON shape, kept verbatim.
    Raw(Value),
}

impl PropValue {
    /// Literal string property.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Bound(BoundValue::string(value))
    }

    /// Literal number property.
    #[must_use]
    pub fn number(value: f64) -> Self {
        Self::Bound(BoundValue::number(value))
    }

    /// Literal boolean property.
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::Bound(BoundValue::bool(value))
    }

    /// Child list property.
    #[must_use]
    pub fn children<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Children(ChildList::new(ids))
    }

    /// Single child reference property.
    #[must_use]
    pub fn reference(id: impl Into<String>) -> Self {
        Self::Ref(id.into())
    }

    /// The literal string, if this is one.
    #[must_use]
    pub fn as_literal_str(&self) -> Option<&str> {
        match self {
            Self::Bound(bound) => bound.as_literal_str(),
            _ => None,
        }
    }

    /// Ids referenced by this value when it is used as a child reference.
    #[must_use]
    pub fn referenced_ids(&self) -> Vec<&str> {
        match self {
            Self::Children(list) => list.explicit_list.iter().map(String::as_str).collect(),
            Self::Ref(id) => vec![id.as_str()],
            Self::Bound(_) | Self::Raw(_) => Vec::new(),
        }
    }

    /// Rewrite referenced ids found in `map`; others are left alone.
    pub fn remap_ids(&mut self, map: &HashMap<String, String>) {
        match self {
            Self::Children(list) => {
                for id in &mut list.explicit_list {
                    if let Some(new_id) = map.get(id.as_str()) {
                        id.clone_from(new_id);
                    }
                }
            }
            Self::Ref(id) => {
                if let Some(new_id) = map.get(id.as_str()) {
                    id.clone_from(new_id);
                }
            }
            Self::Bound(_) | Self::Raw(_) => {}
        }
    }
}

fn number_value(n: f64) -> Value {
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_literals() {
        let s: BoundValue = serde_json::from_value(json!({"literalString": "hi"})).expect("parse");
        assert_eq!(s, BoundValue::string("hi"));

        let n: BoundValue = serde_json::from_value(json!({"literalNumber": 4.5})).expect("parse");
        assert_eq!(n, BoundValue::number(4.5));

        let b: BoundValue = serde_json::from_value(json!({"literalBool": true})).expect("parse");
        assert_eq!(b, BoundValue::bool(true));
    }

    #[test]
    fn test_parse_path_with_default() {
        let v: BoundValue =
            serde_json::from_value(json!({"path": "/user/name", "defaultValue": "Ada"}))
                .expect("parse");
        match v {
            BoundValue::Path(binding) => {
                assert_eq!(binding.path, "/user/name");
                assert_eq!(
                    binding.default_value,
                    Some(PathDefault::String("Ada".to_string()))
                );
            }
            other => panic!("Expected path binding, got {other:?}"),
        }
    }

    #[test]
    fn test_prop_value_shapes() {
        let list: PropValue =
            serde_json::from_value(json!({"explicitList": ["a", "b"]})).expect("parse");
        assert_eq!(list, PropValue::children(["a", "b"]));

        let slot: PropValue = serde_json::from_value(json!("body")).expect("parse");
        assert_eq!(slot, PropValue::reference("body"));

        let raw: PropValue = serde_json::from_value(json!(12)).expect("parse");
        assert_eq!(raw, PropValue::Raw(json!(12)));

        let bound: PropValue =
            serde_json::from_value(json!({"literalString": "x"})).expect("parse");
        assert_eq!(bound, PropValue::string("x"));
    }

    #[test]
    fn test_options_serialize_shape() {
        let value = PropValue::Bound(BoundValue::options(vec![SelectOption::new("One", "1")]));
        let json = serde_json::to_value(&value).expect("serialize");
        assert_eq!(json, json!({"literalOptions": [{"label": "One", "value": "1"}]}));
    }

    #[test]
    fn test_resolve_path_and_fallback() {
        let data = json!({"user": {"name": "Grace"}});
        assert_eq!(BoundValue::path("/user/name").resolve(&data), json!("Grace"));
        assert_eq!(BoundValue::path("user/name").resolve(&data), json!("Grace"));

        let missing = BoundValue::path_with_default("/user/age", PathDefault::Number(30.0));
        assert_eq!(missing.resolve(&data), json!(30.0));
        assert_eq!(BoundValue::path("/nope").resolve(&data), Value::Null);
    }

    #[test]
    fn test_remap_ids_only_touches_references() {
        let map: HashMap<String, String> =
            [("a".to_string(), "a-copy".to_string())].into_iter().collect();

        let mut list = PropValue::children(["a", "b"]);
        list.remap_ids(&map);
        assert_eq!(list, PropValue::children(["a-copy", "b"]));

        let mut literal = PropValue::string("a");
        literal.remap_ids(&map);
        assert_eq!(literal, PropValue::string("a"));
    }
}
