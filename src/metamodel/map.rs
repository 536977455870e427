//! Map-shaped container descriptor.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::canonical::content_key;
use crate::error::{GraphError, GraphResult};
use crate::types::{ContainerShape, TypeName, TypeSignature, Value};

use super::enumerable::{shape_mismatch, Enumerable, EnumeratorContext, OwnerContext};

/// Descriptor for `Map<K, V>`-shaped types.
///
/// Fully parametrized iff both the key and the value argument resolve to
/// concrete classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapType {
    base: TypeSignature,
    element_types: Vec<TypeName>,
}

impl MapType {
    /// Build from a declared signature such as `Map<String, Integer>`.
    pub fn new(base: TypeSignature) -> Self {
        let args = base.actual_class_type_arguments();
        let element_types = if args.len() == 2 && base.type_arguments().len() == 2 {
            args
        } else {
            Vec::new()
        };
        Self {
            base,
            element_types,
        }
    }

    /// Key class. Never absent.
    ///
    /// Fails with `GenericTypeNotParametrized` when the key class is unknown.
    pub fn key_class(&self) -> GraphResult<&TypeName> {
        self.element_class(0)
    }

    /// Value class. Never absent.
    ///
    /// Fails with `GenericTypeNotParametrized` when the value class is unknown.
    pub fn value_class(&self) -> GraphResult<&TypeName> {
        self.element_class(1)
    }

    fn element_class(&self, i: usize) -> GraphResult<&TypeName> {
        if !self.is_fully_parametrized() {
            return Err(GraphError::not_parametrized(&self.base));
        }
        self.element_types
            .get(i)
            .ok_or_else(|| GraphError::not_parametrized(&self.base))
    }
}

impl Enumerable for MapType {
    fn shape(&self) -> ContainerShape {
        ContainerShape::Map
    }

    fn base_type(&self) -> &TypeSignature {
        &self.base
    }

    fn element_types(&self) -> &[TypeName] {
        &self.element_types
    }

    fn is_fully_parametrized(&self) -> bool {
        self.element_types.len() == 2
    }

    fn is_empty(&self, container: Option<&Value>) -> bool {
        match container {
            None | Some(Value::Null) => true,
            Some(Value::Map(entries)) => entries.is_empty(),
            Some(_) => false,
        }
    }

    fn transform<F>(&self, container: &Value, mut f: F, owner: &mut OwnerContext) -> GraphResult<Value>
    where
        F: FnMut(&Value, &OwnerContext) -> GraphResult<Value>,
    {
        let entries = match container {
            Value::Map(entries) => entries,
            other => return Err(shape_mismatch(ContainerShape::Map, other)),
        };

        let mut target: BTreeMap<Value, Value> = BTreeMap::new();
        // Entries are visited in key content order, as for sets.
        let mut ordered: Vec<(String, &Value, &Value)> = entries
            .iter()
            .map(|(key, value)| (content_key(key), key, value))
            .collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        for (member, key, value) in ordered {
            // key
            owner.set_enumerator(EnumeratorContext::MapKey { member });
            let mapped_key = f(key, owner)?;

            // value, tagged with the mapped key
            owner.set_enumerator(EnumeratorContext::MapValue {
                key: mapped_key.clone(),
            });
            let mapped_value = f(value, owner)?;

            target.insert(mapped_key, mapped_value);
        }

        Ok(Value::Map(Arc::new(target)))
    }
}
