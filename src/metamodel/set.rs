//! Set-shaped container descriptor.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::canonical::content_key;
use crate::error::{GraphError, GraphResult};
use crate::types::{ContainerShape, TypeName, TypeSignature, Value};

use super::enumerable::{shape_mismatch, single_element_type, Enumerable, EnumeratorContext, OwnerContext};

/// Descriptor for `Set<T>`-shaped types.
///
/// Elements have no stable position. Each is tagged as a member and
/// addressed by its content key; alignment of set elements across two
/// graphs is left to content matching downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetType {
    base: TypeSignature,
    element_types: Vec<TypeName>,
}

impl SetType {
    /// Build from a declared signature such as `Set<String>`.
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

impl Enumerable for SetType {
    fn shape(&self) -> ContainerShape {
        ContainerShape::Set
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
            Some(Value::Set(items)) => items.is_empty(),
            Some(_) => false,
        }
    }

    fn transform<F>(&self, container: &Value, mut f: F, owner: &mut OwnerContext) -> GraphResult<Value>
    where
        F: FnMut(&Value, &OwnerContext) -> GraphResult<Value>,
    {
        let items = match container {
            Value::Set(items) => items,
            other => return Err(shape_mismatch(ContainerShape::Set, other)),
        };

        // Members are visited in content order; the set's own order follows
        // object identity, which differs between builds.
        let mut members: Vec<(String, &Value)> =
            items.iter().map(|item| (content_key(item), item)).collect();
        members.sort_by(|a, b| a.0.cmp(&b.0));

        let mut target = BTreeSet::new();
        for (member, item) in members {
            owner.set_enumerator(EnumeratorContext::SetMember { member });
            target.insert(f(item, owner)?);
        }

        Ok(Value::Set(Arc::new(target)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GlobalId, PositionKey};

    #[test]
    fn test_transform_tags_membership_only() {
        let set = SetType::new(TypeSignature::parse("Set<String>").unwrap());
        let source = Value::set([Value::str("x"), Value::str("y")]);
        let mut owner = OwnerContext::new(GlobalId::instance("Customer", 1), "tags");

        let mut positions = Vec::new();
        let result = set
            .transform(
                &source,
                |v, ctx| {
                    positions.push(ctx.position());
                    Ok(v.clone())
                },
                &mut owner,
            )
            .unwrap();

        assert_eq!(positions, vec![Some(PositionKey::Member); 2]);
        assert_eq!(result, source);
    }

    #[test]
    fn test_members_visited_in_content_order() {
        let set = SetType::new(TypeSignature::parse("Set<Address>").unwrap());
        let address = |city: &str| Value::from(crate::types::ObjectRef::new("Address").with("city", city));
        let mut owner = OwnerContext::new(GlobalId::instance("Customer", 1), "addresses");

        let mut visit = |source: Value| {
            let mut paths = Vec::new();
            set.transform(
                &source,
                |v, ctx| {
                    paths.push(ctx.path());
                    Ok(v.clone())
                },
                &mut owner,
            )
            .unwrap();
            paths
        };
        let forward = visit(Value::set([address("Lyon"), address("Oslo")]));
        let backward = visit(Value::set([address("Oslo"), address("Lyon")]));

        assert_eq!(forward, backward);
        assert!(forward.contains(&format!("addresses/#{}", content_key(&address("Lyon")))));
    }

    #[test]
    fn test_colliding_results_collapse() {
        let set = SetType::new(TypeSignature::parse("Set").unwrap());
        let source = Value::set([Value::Int(1), Value::Int(2)]);
        let mut owner = OwnerContext::new(GlobalId::unbound("Bag"), "items");

        let result = set
            .transform(&source, |_, _| Ok(Value::Int(0)), &mut owner)
            .unwrap();
        assert_eq!(result, Value::set([Value::Int(0)]));
    }

    #[test]
    fn test_wildcard_set_is_not_parametrized() {
        let set = SetType::new(TypeSignature::parse("Set<?>").unwrap());
        assert!(!set.is_fully_parametrized());
        assert!(set.element_types().is_empty());
        assert!(set.item_class().is_err());
        assert!(set.is_empty(Some(&Value::set(Vec::new()))));
    }
}
