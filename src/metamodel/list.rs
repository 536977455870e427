//! List-shaped container descriptor.

use std::sync::Arc;

use crate::error::{GraphError, GraphResult};
use crate::types::{ContainerShape, TypeName, TypeSignature, Value};

use super::enumerable::{shape_mismatch, single_element_type, Enumerable, EnumeratorContext, OwnerContext};

/// Descriptor for `List<T>`-shaped types. Order is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListType {
    base: TypeSignature,
    element_types: Vec<TypeName>,
}

impl ListType {
    /// Build from a declared signature such as `List<Customer>`.
    pub fn new(base: TypeSignature) -> Self {
        let element_types = single_element_type(&base);
        Self {
            base,
            element_types,
        }
    }

    /// Item class.
    ///
    /// Fails with `GenericTypeNotParametrized` when the item class is unknown.
    pub fn item_class(&self) -> GraphResult<&TypeName> {
        self.element_types
            .first()
            .ok_or_else(|| GraphError::not_parametrized(&self.base))
    }
}

impl Enumerable for ListType {
    fn shape(&self) -> ContainerShape {
        ContainerShape::List
    }

    fn base_type(&self) -> &TypeSignature {
        &self.base
    }

    fn element_types(&self) -> &[TypeName] {
        &self.element_types
    }

    fn is_fully_parametrized(&self) -> bool {
        self.element_types.len() == 1
    }

    fn is_empty(&self, container: Option<&Value>) -> bool {
        match container {
            None | Some(Value::Null) => true,
            Some(Value::List(items)) => items.is_empty(),
            Some(_) => false,
        }
    }

    fn transform<F>(&self, container: &Value, mut f: F, owner: &mut OwnerContext) -> GraphResult<Value>
    where
        F: FnMut(&Value, &OwnerContext) -> GraphResult<Value>,
    {
        let items = match container {
            Value::List(items) => items,
            other => return Err(shape_mismatch(ContainerShape::List, other)),
        };

        let mut target = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            owner.set_enumerator(EnumeratorContext::Index(i));
            target.push(f(item, owner)?);
        }

        Ok(Value::List(Arc::new(target)))
    }
}
