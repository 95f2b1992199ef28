use std::sync::Arc;

use hstore_storage::BlockHash;

use crate::{Number, Value};

/// A scalar leaf of the persisted DAG.
///
/// Primitives are `Eq + Hash` so they can key the object store's scalar hint
/// cache by value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// The JSON `null`
    Null,
    /// A JSON boolean
    Bool(bool),
    /// A JSON number
    Number(Number),
    /// A JSON string
    String(Arc<str>),
}

/// One logical element of the persisted DAG. Exactly one [`Node`] corresponds
/// to exactly one stored block.
///
/// Composite nodes carry no child data, only the hashes of their children;
/// this indirection is what lets structurally equal subtrees collapse into a
/// single stored block no matter where they appear.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// A scalar leaf
    Primitive(Primitive),
    /// An array: child hashes in element order
    Array(Vec<BlockHash>),
    /// An object: `(key, child hash)` entries in code-point key order
    Object(Vec<(String, BlockHash)>),
}

impl Node {
    /// Assemble an object node, sorting `entries` into canonical key order.
    pub fn object(mut entries: Vec<(String, BlockHash)>) -> Self {
        entries.sort_by(|(left, _), (right, _)| left.cmp(right));
        Node::Object(entries)
    }
}

impl Value {
    /// This value's scalar form, when it has one.
    pub(crate) fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Value::Null => Some(Primitive::Null),
            Value::Bool(value) => Some(Primitive::Bool(*value)),
            Value::Number(value) => Some(Primitive::Number(value.clone())),
            Value::String(value) => Some(Primitive::String(value.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<Primitive> for Value {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Null => Value::Null,
            Primitive::Bool(value) => Value::Bool(value),
            Primitive::Number(value) => Value::Number(value),
            Primitive::String(value) => Value::String(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_sorts_object_entries_on_construction() {
        let node = Node::object(vec![
            ("b".into(), BlockHash::from("h2")),
            ("".into(), BlockHash::from("h0")),
            ("a".into(), BlockHash::from("h1")),
        ]);

        let Node::Object(entries) = node else {
            panic!("expected an object node");
        };
        let keys: Vec<&str> = entries.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["", "a", "b"]);
    }

    #[test]
    fn it_converts_primitives_to_and_from_values() {
        let cases = [
            Value::Null,
            Value::Bool(true),
            Value::from(42i64),
            Value::from("hello"),
        ];

        for value in cases {
            let primitive = value.as_primitive().expect("scalar values have primitives");
            assert_eq!(Value::from(primitive), value);
        }

        assert_eq!(Value::array([]).as_primitive(), None);
    }
}
