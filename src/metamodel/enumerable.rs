//! Enumerable (container-shaped) type descriptors.
//!
//! An enumerable descriptor is the runtime shape of a declared container
//! type. It answers two questions:
//!
//! 1. Which concrete element classes does the declaration carry?
//! 2. How is a container instance walked, element by element, so that each
//!    element can be tagged with where it was found?
//!
//! ## Transform Protocol
//!
//! | Shape | Context before each call | Result |
//! |-------|--------------------------|--------|
//! | list / array | `Index(i)` | new sequence, same order |
//! | set | `SetMember { member }` | new set |
//! | map | `MapKey`, then `MapValue { key: mapped_key }` | new map `mapped_key → mapped_value` |
//!
//! The map protocol is two-phase: a value is always tagged with its key
//! *after* the key went through the transform function.
//!
//! Set members and map keys have no stable position. They are addressed by
//! their [`content_key`], so a value object found there gets the same path in
//! every build of the same structure.

use crate::canonical::content_key;
use crate::error::GraphResult;
use crate::types::{ContainerShape, GlobalId, PositionKey, TypeName, TypeSignature, Value};

use super::array::ArrayType;
use super::list::ListType;
use super::map::MapType;
use super::set::SetType;

/// Per-element state of an ongoing transform.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnumeratorContext {
    /// Not enumerating.
    #[default]
    None,
    /// Visiting the list/array element at this index.
    Index(usize),
    /// Visiting a set element.
    SetMember {
        /// Content key of the element.
        member: String,
    },
    /// Visiting a map key.
    MapKey {
        /// Content key of the key.
        member: String,
    },
    /// Visiting a map value stored under an already-transformed key.
    MapValue {
        /// The mapped key.
        key: Value,
    },
}

impl EnumeratorContext {
    /// Position to tag the current element with.
    pub fn position(&self) -> Option<PositionKey> {
        match self {
            Self::None => None,
            Self::Index(i) => Some(PositionKey::Index(*i)),
            Self::SetMember { .. } | Self::MapKey { .. } => Some(PositionKey::Member),
            Self::MapValue { key } => Some(PositionKey::Key(key.clone())),
        }
    }

    /// Path segment addressing the current element below its property.
    pub fn path_segment(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Index(i) => Some(i.to_string()),
            Self::SetMember { member } => Some(format!("#{}", member)),
            Self::MapKey { member } => Some(format!("key#{}", member)),
            Self::MapValue { key } => Some(key.path_fragment()),
        }
    }
}

/// Who is being walked: the owning node, its property, and the current
/// container position when the property is enumerable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerContext {
    owner: GlobalId,
    property: String,
    enumerator: EnumeratorContext,
}

impl OwnerContext {
    /// Context for a property of `owner`.
    pub fn new(owner: GlobalId, property: impl Into<String>) -> Self {
        Self {
            owner,
            property: property.into(),
            enumerator: EnumeratorContext::None,
        }
    }

    /// Owning node identity.
    pub fn owner(&self) -> &GlobalId {
        &self.owner
    }

    /// Property being walked.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Current enumerator state.
    pub fn enumerator(&self) -> &EnumeratorContext {
        &self.enumerator
    }

    /// Replace the enumerator state.
    pub fn set_enumerator(&mut self, enumerator: EnumeratorContext) {
        self.enumerator = enumerator;
    }

    /// Position of the current element, if enumerating.
    pub fn position(&self) -> Option<PositionKey> {
        self.enumerator.position()
    }

    /// Path of the current value below the owner: `property` or `property/segment`.
    pub fn path(&self) -> String {
        match self.enumerator.path_segment() {
            Some(segment) => format!("{}/{}", self.property, segment),
            None => self.property.clone(),
        }
    }
}

/// Contract shared by all container descriptors.
pub trait Enumerable {
    /// Declared container shape.
    fn shape(&self) -> ContainerShape;

    /// The declared signature the descriptor was built from.
    fn base_type(&self) -> &TypeSignature;

    /// Resolved element classes in declaration order (key then value for
    /// maps); empty unless fully parametrized.
    fn element_types(&self) -> &[TypeName];

    /// Whether every element class resolved to a concrete class.
    fn is_fully_parametrized(&self) -> bool;

    /// Emptiness test; `None` and `Null` count as empty.
    fn is_empty(&self, container: Option<&Value>) -> bool;

    /// Map each element through `f`, producing a new container of the same shape.
    ///
    /// `owner` carries the current position into every call of `f`.
    fn transform<F>(&self, container: &Value, f: F, owner: &mut OwnerContext) -> GraphResult<Value>
    where
        F: FnMut(&Value, &OwnerContext) -> GraphResult<Value>;
}

/// Descriptor for one container type: a closed set of shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumerableType {
    /// Key/value container.
    Map(MapType),
    /// Ordered sequence.
    List(ListType),
    /// Membership container.
    Set(SetType),
    /// Fixed-length array.
    Array(ArrayType),
}

impl EnumerableType {
    /// Build a descriptor of the given shape from a declared signature.
    pub fn new(shape: ContainerShape, base: TypeSignature) -> Self {
        match shape {
            ContainerShape::Map => Self::Map(MapType::new(base)),
            ContainerShape::List => Self::List(ListType::new(base)),
            ContainerShape::Set => Self::Set(SetType::new(base)),
            ContainerShape::Array => Self::Array(ArrayType::new(base)),
        }
    }

    /// Raw descriptor for a container value's runtime shape.
    ///
    /// Maps, lists and sets carry no element classes. Arrays know their
    /// component type from their storage.
    pub fn for_value(value: &Value) -> Option<Self> {
        let descriptor = match value {
            Value::Map(_) => Self::Map(MapType::new(TypeSignature::class("Map"))),
            Value::List(_) => Self::List(ListType::new(TypeSignature::class("List"))),
            Value::Set(_) => Self::Set(SetType::new(TypeSignature::class("Set"))),
            Value::Array(array) => Self::Array(ArrayType::new(TypeSignature::array_of(
                TypeSignature::class(array.component_name()),
            ))),
            _ => return None,
        };
        Some(descriptor)
    }

    /// The map descriptor, if map-shaped.
    pub fn as_map(&self) -> Option<&MapType> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl Enumerable for EnumerableType {
    fn shape(&self) -> ContainerShape {
        match self {
            Self::Map(t) => t.shape(),
            Self::List(t) => t.shape(),
            Self::Set(t) => t.shape(),
            Self::Array(t) => t.shape(),
        }
    }

    fn base_type(&self) -> &TypeSignature {
        match self {
            Self::Map(t) => t.base_type(),
            Self::List(t) => t.base_type(),
            Self::Set(t) => t.base_type(),
            Self::Array(t) => t.base_type(),
        }
    }

    fn element_types(&self) -> &[TypeName] {
        match self {
            Self::Map(t) => t.element_types(),
            Self::List(t) => t.element_types(),
            Self::Set(t) => t.element_types(),
            Self::Array(t) => t.element_types(),
        }
    }

    fn is_fully_parametrized(&self) -> bool {
        match self {
            Self::Map(t) => t.is_fully_parametrized(),
            Self::List(t) => t.is_fully_parametrized(),
            Self::Set(t) => t.is_fully_parametrized(),
            Self::Array(t) => t.is_fully_parametrized(),
        }
    }

    fn is_empty(&self, container: Option<&Value>) -> bool {
        match self {
            Self::Map(t) => t.is_empty(container),
            Self::List(t) => t.is_empty(container),
            Self::Set(t) => t.is_empty(container),
            Self::Array(t) => t.is_empty(container),
        }
    }

    fn transform<F>(&self, container: &Value, f: F, owner: &mut OwnerContext) -> GraphResult<Value>
    where
        F: FnMut(&Value, &OwnerContext) -> GraphResult<Value>,
    {
        match self {
            Self::Map(t) => t.transform(container, f, owner),
            Self::List(t) => t.transform(container, f, owner),
            Self::Set(t) => t.transform(container, f, owner),
            Self::Array(t) => t.transform(container, f, owner),
        }
    }
}

/// Element classes for a single-argument container (`List<T>`, `Set<T>`).
pub(crate) fn single_element_type(base: &TypeSignature) -> Vec<TypeName> {
    let args = base.actual_class_type_arguments();
    if args.len() == 1 && base.type_arguments().len() == 1 {
        args
    } else {
        Vec::new()
    }
}

/// Reject a missing container or one of the wrong shape.
pub(crate) fn shape_mismatch(expected: ContainerShape, found: &Value) -> crate::error::GraphError {
    if found.is_null() {
        crate::error::GraphError::invalid(format!("{} container is null", expected))
    } else {
        crate::error::GraphError::invalid(format!(
            "expected {} container, found {}",
            expected,
            found.kind_name()
        ))
    }
}
