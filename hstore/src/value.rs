use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use serde_json::Number;

/// An immutable JSON value with structurally shared composites.
///
/// Arrays and objects hold their children behind an [`Arc`], so cloning a
/// value - or a subtree of one - is cheap and never copies the underlying
/// data. Because no mutable access to shared children exists, every value is
/// deeply immutable through any reference that escapes the store: this is the
/// owned-language rendering of a deeply frozen snapshot.
///
/// Object entries live in a [`BTreeMap`], which keeps keys in code-point
/// order; two objects built from the same entries in any insertion order are
/// identical, while arrays preserve their element order. Numbers are
/// [`serde_json::Number`], so NaN and the infinities are unrepresentable by
/// construction.
///
/// The conversion [`From<serde_json::Value>`] is the defensive copy at the
/// caller boundary; [`From<&Value>`] back into `serde_json::Value` is a
/// structural copy out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// The JSON `null`
    Null,
    /// A JSON boolean
    Bool(bool),
    /// A JSON number
    Number(Number),
    /// A JSON string
    String(Arc<str>),
    /// An ordered sequence of values
    Array(Arc<[Value]>),
    /// A mapping of string keys to values, ordered by key
    Object(Arc<BTreeMap<String, Value>>),
}

impl Value {
    /// Assemble an array value from any sequence of values.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Value::Array(items.into_iter().collect())
    }

    /// Assemble an object value from key/value pairs. Later duplicates of a
    /// key replace earlier ones.
    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(Arc::new(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        ))
    }

    /// Whether this value is `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The value under `key`, when this value is an object that has one.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries.get(key),
            _ => None,
        }
    }

    /// The value at `index`, when this value is an array that is long enough.
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(index),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(value) => Value::Bool(value),
            serde_json::Value::Number(value) => Value::Number(value),
            serde_json::Value::String(value) => Value::String(value.into()),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Object(Arc::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            )),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Number(value) => serde_json::Value::Number(value.clone()),
            Value::String(value) => serde_json::Value::String(value.to_string()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value.into())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", serde_json::Value::from(self))
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_round_trips_through_serde_json() {
        let source = json!({
            "name": "Alice",
            "age": 42,
            "tags": ["a", "b"],
            "nested": { "flag": true, "nothing": null }
        });

        let value = Value::from(source.clone());
        assert_eq!(serde_json::Value::from(&value), source);
    }

    #[test]
    fn it_orders_object_keys_by_code_point() {
        let value = Value::object([("b", Value::Null), ("", Value::Null), ("a", Value::Null)]);

        let Value::Object(entries) = &value else {
            panic!("expected an object");
        };
        let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["", "a", "b"]);
    }

    #[test]
    fn it_treats_insertion_order_as_irrelevant_for_objects() {
        let forward = Value::object([("a", Value::from(1i64)), ("b", Value::from(2i64))]);
        let backward = Value::object([("b", Value::from(2i64)), ("a", Value::from(1i64))]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn it_preserves_array_order() {
        let ab = Value::array([Value::from("a"), Value::from("b")]);
        let ba = Value::array([Value::from("b"), Value::from("a")]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn it_shares_structure_between_clones() {
        let value = Value::from(json!({ "items": [1, 2, 3] }));
        let clone = value.clone();

        let (Value::Object(left), Value::Object(right)) = (&value, &clone) else {
            panic!("expected objects");
        };
        assert!(Arc::ptr_eq(left, right));
    }

    #[test]
    fn it_accesses_members_by_key_and_index() {
        let value = Value::from(json!({ "items": ["zero", "one"] }));

        let items = value.get("items").expect("key should exist");
        assert_eq!(items.at(1), Some(&Value::from("one")));
        assert_eq!(items.at(2), None);
        assert_eq!(value.get("absent"), None);
    }

    #[test]
    fn it_displays_as_compact_json() {
        let value = Value::from(json!({ "b": 1, "a": [true, null] }));
        assert_eq!(value.to_string(), r#"{"a":[true,null],"b":1}"#);
    }
}
