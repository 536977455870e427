//! Array-shaped container descriptor.

use crate::error::{GraphError, GraphResult};
use crate::types::{ArrayValue, ContainerShape, TypeName, TypeSignature, Value};

use super::enumerable::{shape_mismatch, Enumerable, EnumeratorContext, OwnerContext};

/// Descriptor for array types (`int[]`, `Customer[]`).
///
/// The element class is implied by the component type; it is unresolved
/// only for arrays of type variables or wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    base: TypeSignature,
    element_types: Vec<TypeName>,
}

impl ArrayType {
    /// Build from an array signature.
    pub fn new(base: TypeSignature) -> Self {
        let element_types = match &base {
            TypeSignature::Array(component) => component.as_class().into_iter().collect(),
            _ => Vec::new(),
        };
        Self {
            base,
            element_types,
        }
    }

    /// Component class.
    ///
    /// Fails with `GenericTypeNotParametrized` when the component is unresolved.
    pub fn item_class(&self) -> GraphResult<&TypeName> {
        self.element_types
            .first()
            .ok_or_else(|| GraphError::not_parametrized(&self.base))
    }
}

impl Enumerable for ArrayType {
    fn shape(&self) -> ContainerShape {
        ContainerShape::Array
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
            Some(Value::Array(array)) => array.is_empty(),
            Some(_) => false,
        }
    }

    /// The result is always a reference-typed array.
    fn transform<F>(&self, container: &Value, mut f: F, owner: &mut OwnerContext) -> GraphResult<Value>
    where
        F: FnMut(&Value, &OwnerContext) -> GraphResult<Value>,
    {
        let array = match container {
            Value::Array(array) => array,
            other => return Err(shape_mismatch(ContainerShape::Array, other)),
        };

        let items = array.to_boxed();
        let mut target = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            owner.set_enumerator(EnumeratorContext::Index(i));
            target.push(f(item, owner)?);
        }

        Ok(Value::Array(ArrayValue::Values(target.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GlobalId, PositionKey};

    #[test]
    fn test_component_is_element_class() {
        let ints = ArrayType::new(TypeSignature::parse("int[]").unwrap());
        assert!(ints.is_fully_parametrized());
        assert_eq!(ints.element_types(), &[TypeName::new("int")]);

        let generic = ArrayType::new(TypeSignature::parse("T[]").unwrap());
        assert!(!generic.is_fully_parametrized());
        assert!(matches!(
            generic.item_class(),
            Err(GraphError::GenericTypeNotParametrized { ref base_type }) if base_type == "T[]"
        ));
    }

    #[test]
    fn test_transform_primitive_array_in_order() {
        let ints = ArrayType::new(TypeSignature::parse("int[]").unwrap());
        let source = Value::int_array([1, 2, 3]);
        let mut owner = OwnerContext::new(GlobalId::instance("Customer", 1), "lucky");

        let mut positions = Vec::new();
        let result = ints
            .transform(
                &source,
                |v, ctx| {
                    positions.push(ctx.position());
                    Ok(v.clone())
                },
                &mut owner,
            )
            .unwrap();

        assert_eq!(
            positions,
            (0..3).map(|i| Some(PositionKey::Index(i))).collect::<Vec<_>>()
        );
        assert_eq!(result, Value::array([Value::Int(1), Value::Int(2), Value::Int(3)]));
        assert_eq!(source, Value::int_array([1, 2, 3]));
    }

    #[test]
    fn test_is_empty() {
        let array = ArrayType::new(TypeSignature::parse("String[]").unwrap());
        assert!(array.is_empty(Some(&Value::array(Vec::new()))));
        assert!(!array.is_empty(Some(&Value::bool_array([true]))));
    }
}
