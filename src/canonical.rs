//! Canonical forms for graph hashing and content-addressed positions.
//!
//! Two things are hashed with xxh64 over canonical JSON:
//!
//! - graph topologies and policy parameters ([`canonical_hash_hex`])
//! - container elements that have no stable position, so that a value
//!   object found in a set or under a map key gets an identity from what
//!   it holds ([`content_key`])
//!
//! ## Content Shape
//!
//! A value's content shape never depends on where its objects live in
//! memory:
//! - objects render as their class and their properties in name order
//! - set members and map entries are sorted by their own shape
//! - an object already open on the current path renders as a back
//!   reference (`Back(n)`, counting out from the innermost open object),
//!   so cyclic values terminate
//! - objects more than [`CONTENT_DEPTH`] levels below the hashed value
//!   keep only their scalar properties

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

use crate::types::{GlobalId, ObjectRef, TypeName, Value};

/// Object nesting rendered in full below a content-hashed value.
pub const CONTENT_DEPTH: usize = 2;

/// Hash a serializable value and return it as 16 hex digits.
///
/// Callers sort collections before hashing; maps in hashed data are
/// `BTreeMap`s or sorted pair lists.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).expect("canonical form serializes");
    format!("{:016x}", xxh64(&bytes, 0))
}

/// Content key of a value: the canonical hash of its content shape.
///
/// Structurally equal values share a key whichever objects hold them.
pub fn content_key(value: &Value) -> String {
    canonical_hash_hex(&ContentShape::of(value))
}

/// Allocation-independent rendering of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub(crate) enum ContentShape {
    Null,
    Bool(bool),
    Int(i64),
    /// IEEE bits, so the shape stays totally ordered.
    Float(u64),
    Str(String),
    Ref(GlobalId),
    Object {
        type_name: TypeName,
        properties: Vec<(String, ContentShape)>,
    },
    Back(usize),
    List(Vec<ContentShape>),
    Set(Vec<ContentShape>),
    Map(Vec<(ContentShape, ContentShape)>),
    Array(Vec<ContentShape>),
}

impl ContentShape {
    pub(crate) fn of(value: &Value) -> Self {
        let mut open = Vec::new();
        Self::shape(value, &mut open)
    }

    fn shape(value: &Value, open: &mut Vec<ObjectRef>) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(v) => Self::Bool(*v),
            Value::Int(v) => Self::Int(*v),
            Value::Float(v) => Self::Float(v.to_bits()),
            Value::Str(v) => Self::Str(v.clone()),
            Value::Ref(id) => Self::Ref(id.clone()),
            Value::Object(object) => Self::object(object, open),
            Value::List(items) => Self::List(items.iter().map(|v| Self::shape(v, open)).collect()),
            Value::Set(items) => {
                let mut members: Vec<_> = items.iter().map(|v| Self::shape(v, open)).collect();
                members.sort();
                Self::Set(members)
            }
            Value::Map(entries) => {
                let mut pairs: Vec<_> = entries
                    .iter()
                    .map(|(k, v)| (Self::shape(k, open), Self::shape(v, open)))
                    .collect();
                pairs.sort();
                Self::Map(pairs)
            }
            Value::Array(array) => {
                Self::Array(array.to_boxed().iter().map(|v| Self::shape(v, open)).collect())
            }
        }
    }

    fn object(object: &ObjectRef, open: &mut Vec<ObjectRef>) -> Self {
        if let Some(up) = open.iter().rev().position(|o| o.ptr_eq(object)) {
            return Self::Back(up);
        }

        let truncated = open.len() > CONTENT_DEPTH;
        open.push(object.clone());
        let properties = object
            .property_names()
            .into_iter()
            .filter_map(|name| {
                let value = object.get(&name);
                if truncated && !is_scalar(&value) {
                    return None;
                }
                let shape = Self::shape(&value, open);
                Some((name, shape))
            })
            .collect();
        open.pop();

        Self::Object {
            type_name: object.type_name().clone(),
            properties,
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) | Value::Ref(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(city: &str) -> ObjectRef {
        ObjectRef::new("Address").with("city", ObjectRef::new("City").with("name", city))
    }

    #[test]
    fn test_determinism() {
        let ids = vec![GlobalId::instance("Customer", 1), GlobalId::unbound("Address")];
        assert_eq!(canonical_hash_hex(&ids), canonical_hash_hex(&ids.clone()));
        assert_eq!(canonical_hash_hex(&ids).len(), 16);
    }

    #[test]
    fn test_order_sensitive() {
        let a = vec![GlobalId::instance("Customer", 1), GlobalId::instance("Customer", 2)];
        let b = vec![GlobalId::instance("Customer", 2), GlobalId::instance("Customer", 1)];
        assert_ne!(canonical_hash_hex(&a), canonical_hash_hex(&b));
    }

    #[test]
    fn test_content_key_ignores_allocation() {
        let first = Value::set([Value::from(address("Lyon")), Value::from(address("Oslo"))]);
        let second = Value::set([Value::from(address("Oslo")), Value::from(address("Lyon"))]);
        assert_eq!(content_key(&first), content_key(&second));

        assert_eq!(content_key(&Value::from(address("Lyon"))), content_key(&Value::from(address("Lyon"))));
        assert_ne!(content_key(&Value::from(address("Lyon"))), content_key(&Value::from(address("Oslo"))));
    }

    #[test]
    fn test_content_key_terminates_on_cycles() {
        let node = ObjectRef::new("Node").with("label", "a");
        node.set("next", &node);
        let shape = ContentShape::of(&Value::from(&node));
        assert_eq!(
            shape,
            ContentShape::Object {
                type_name: TypeName::new("Node"),
                properties: vec![
                    ("label".to_string(), ContentShape::Str("a".to_string())),
                    ("next".to_string(), ContentShape::Back(0)),
                ],
            }
        );
    }

    #[test]
    fn test_deep_objects_keep_scalars_only() {
        let mut tail = ObjectRef::new("Link").with("n", 0);
        for n in 1..=(CONTENT_DEPTH as i64 + 3) {
            tail = ObjectRef::new("Link").with("n", n).with("next", &tail);
        }
        let mut shape = ContentShape::of(&Value::from(&tail));
        let mut levels = 0;
        while let ContentShape::Object { mut properties, .. } = shape {
            levels += 1;
            match properties.pop() {
                Some((name, next)) if name == "next" => shape = next,
                _ => break,
            }
        }
        assert_eq!(levels, CONTENT_DEPTH + 2);
    }

    #[test]
    fn test_distinct_kinds_distinct_keys() {
        assert_ne!(content_key(&Value::Int(1)), content_key(&Value::str("1")));
    }
}
