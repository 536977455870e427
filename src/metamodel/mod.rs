//! Type metamodel: classification of declared types into graph categories.
//!
//! The graph builder never inspects language-level type hierarchies. It asks
//! a [`TypeMapper`] for a closed [`ManagedType`] tag and switches on it.
//!
//! | Category | Graph role |
//! |----------|------------|
//! | Entity | node, identified by class + id |
//! | ValueObject | node, identified by owner + path |
//! | Primitive / Value | leaf, stored on the owning node |
//! | Enumerable | container, walked element by element |

pub mod enumerable;
pub mod map;
pub mod list;
pub mod set;
pub mod array;
pub mod registry;

use std::fmt;

use crate::types::{ObjectRef, TypeName, TypeSignature};

pub use enumerable::{Enumerable, EnumerableType, EnumeratorContext, OwnerContext};
pub use map::MapType;
pub use list::ListType;
pub use set::SetType;
pub use array::ArrayType;
pub use registry::{InMemoryTypeRegistry, CacheConfig, CacheStats};

/// A named property with its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Declared type.
    pub declared_type: TypeSignature,
}

impl Property {
    /// Create a new property.
    pub fn new(name: impl Into<String>, declared_type: TypeSignature) -> Self {
        Self {
            name: name.into(),
            declared_type,
        }
    }
}

/// Class-level metadata for Entities and ValueObjects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedClass {
    type_name: TypeName,
    properties: Vec<Property>,
    id_property: Option<String>,
}

impl ManagedClass {
    /// Class with no declared properties.
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Vec::new(),
            id_property: None,
        }
    }

    /// Declare a property.
    pub fn with_property(mut self, name: impl Into<String>, declared_type: TypeSignature) -> Self {
        self.properties.push(Property::new(name, declared_type));
        self
    }

    /// Set the id property (Entities).
    pub fn with_id_property(mut self, name: impl Into<String>) -> Self {
        self.id_property = Some(name.into());
        self
    }

    /// Class name.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Declared properties in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Id property name, if declared.
    pub fn id_property(&self) -> Option<&str> {
        self.id_property.as_deref()
    }

    /// Properties to walk on a concrete instance.
    ///
    /// Declared properties come first, in declaration order. Properties the
    /// instance carries but the class does not declare follow, sorted by
    /// name, typed by their runtime value.
    pub fn properties_of(&self, object: &ObjectRef) -> Vec<Property> {
        let mut properties = self.properties.clone();
        for name in object.property_names() {
            if properties.iter().any(|p| p.name == name) {
                continue;
            }
            let declared_type = object.get(&name).runtime_signature();
            properties.push(Property::new(name, declared_type));
        }
        properties
    }
}

/// Category tag for a classified type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// Identity-bearing object.
    Entity,
    /// Object identified by its owner and position.
    ValueObject,
    /// Built-in scalar.
    Primitive,
    /// User type compared by value.
    ValueType,
    /// Container.
    Enumerable,
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => write!(f, "entity"),
            Self::ValueObject => write!(f, "value_object"),
            Self::Primitive => write!(f, "primitive"),
            Self::ValueType => write!(f, "value_type"),
            Self::Enumerable => write!(f, "enumerable"),
        }
    }
}

/// Result of classifying a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagedType {
    /// Entity with its class metadata.
    Entity(ManagedClass),
    /// Value object with its class metadata.
    ValueObject(ManagedClass),
    /// Built-in scalar type.
    Primitive(TypeName),
    /// User value type.
    Value(TypeName),
    /// Container type with its descriptor.
    Enumerable(EnumerableType),
}

impl ManagedType {
    /// Category tag.
    pub fn category(&self) -> TypeCategory {
        match self {
            Self::Entity(_) => TypeCategory::Entity,
            Self::ValueObject(_) => TypeCategory::ValueObject,
            Self::Primitive(_) => TypeCategory::Primitive,
            Self::Value(_) => TypeCategory::ValueType,
            Self::Enumerable(_) => TypeCategory::Enumerable,
        }
    }

    /// Class metadata for Entities and ValueObjects.
    pub fn managed_class(&self) -> Option<&ManagedClass> {
        match self {
            Self::Entity(class) | Self::ValueObject(class) => Some(class),
            _ => None,
        }
    }

    /// Container descriptor for Enumerables.
    pub fn enumerable(&self) -> Option<&EnumerableType> {
        match self {
            Self::Enumerable(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

/// Classifies declared types.
///
/// Implementations may cache classifications across calls. They must be
/// deterministic: the same signature always yields the same category.
pub trait TypeMapper: Send + Sync {
    /// Classify a declared type.
    fn classify(&self, signature: &TypeSignature) -> ManagedType;

    /// Classify a plain class.
    fn classify_class(&self, type_name: &TypeName) -> ManagedType {
        self.classify(&TypeSignature::Class(type_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_properties_of_merges_declared_and_runtime() {
        let class = ManagedClass::new("Customer")
            .with_id_property("id")
            .with_property("id", TypeSignature::class("long"));
        let object = ObjectRef::new("Customer")
            .with("id", 1)
            .with("tags", Value::list([Value::str("vip")]));

        let properties = class.properties_of(&object);
        assert_eq!(properties.len(), 2);
        assert_eq!(properties[0], Property::new("id", TypeSignature::class("long")));
        assert_eq!(properties[1], Property::new("tags", TypeSignature::class("List")));
    }

    #[test]
    fn test_category_tags() {
        let entity = ManagedType::Entity(ManagedClass::new("Customer"));
        assert_eq!(entity.category(), TypeCategory::Entity);
        assert!(entity.managed_class().is_some());
        assert!(entity.enumerable().is_none());
        assert_eq!(TypeCategory::ValueObject.to_string(), "value_object");
    }
}
