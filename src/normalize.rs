//! Container normalization for top-level handles.
//!
//! A handle handed to the kernel is either a domain object, a container, or a
//! plain value. Containers are wrapped so the rest of the kernel walks one
//! uniform [`ContainerWrapper`] contract regardless of the concrete shape.
//!
//! ## Classification Order
//!
//! map → list → set → array → otherwise unchanged.
//!
//! Wrappers share the handle's storage. The one exception is a primitive
//! array, which is boxed element by element into newly allocated storage.
//! The input is never mutated.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{GraphError, GraphResult};
use crate::types::{ArrayValue, ContainerShape, ObjectRef, PositionKey, Value};

/// Uniform view over a wrapped container.
pub trait ContainerWrapper {
    /// Shape of the wrapped container.
    fn shape(&self) -> ContainerShape;

    /// Synthetic wrapper class name.
    fn wrapper_type(&self) -> &'static str;

    /// Number of elements (entries for maps).
    fn len(&self) -> usize;

    /// Whether there are no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements in defined order with their positions.
    ///
    /// Lists and arrays yield `Index(i)`, maps yield `Key(key)` for each
    /// value, sets yield `Member`.
    fn entries(&self) -> Vec<(PositionKey, Value)>;

    /// The wrapped container as a value, sharing storage.
    fn as_value(&self) -> Value;
}

/// Wrapper over a map.
#[derive(Debug, Clone)]
pub struct MapWrapper(Arc<BTreeMap<Value, Value>>);

impl MapWrapper {
    /// Wrapped storage.
    pub fn entries_ref(&self) -> &Arc<BTreeMap<Value, Value>> {
        &self.0
    }
}

impl ContainerWrapper for MapWrapper {
    fn shape(&self) -> ContainerShape {
        ContainerShape::Map
    }

    fn wrapper_type(&self) -> &'static str {
        "MapWrapper"
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn entries(&self) -> Vec<(PositionKey, Value)> {
        self.0
            .iter()
            .map(|(k, v)| (PositionKey::Key(k.clone()), v.clone()))
            .collect()
    }

    fn as_value(&self) -> Value {
        Value::Map(Arc::clone(&self.0))
    }
}

/// Wrapper over a list.
#[derive(Debug, Clone)]
pub struct ListWrapper(Arc<Vec<Value>>);

impl ListWrapper {
    /// Wrapped storage.
    pub fn items(&self) -> &Arc<Vec<Value>> {
        &self.0
    }
}

impl ContainerWrapper for ListWrapper {
    fn shape(&self) -> ContainerShape {
        ContainerShape::List
    }

    fn wrapper_type(&self) -> &'static str {
        "ListWrapper"
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn entries(&self) -> Vec<(PositionKey, Value)> {
        indexed(self.0.iter())
    }

    fn as_value(&self) -> Value {
        Value::List(Arc::clone(&self.0))
    }
}

/// Wrapper over a set.
#[derive(Debug, Clone)]
pub struct SetWrapper(Arc<BTreeSet<Value>>);

impl SetWrapper {
    /// Wrapped storage.
    pub fn items(&self) -> &Arc<BTreeSet<Value>> {
        &self.0
    }
}

impl ContainerWrapper for SetWrapper {
    fn shape(&self) -> ContainerShape {
        ContainerShape::Set
    }

    fn wrapper_type(&self) -> &'static str {
        "SetWrapper"
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn entries(&self) -> Vec<(PositionKey, Value)> {
        self.0
            .iter()
            .map(|v| (PositionKey::Member, v.clone()))
            .collect()
    }

    fn as_value(&self) -> Value {
        Value::Set(Arc::clone(&self.0))
    }
}

/// Wrapper over an array, always reference-typed.
#[derive(Debug, Clone)]
pub struct ArrayWrapper {
    items: Arc<[Value]>,
    component: &'static str,
}

impl ArrayWrapper {
    /// Boxed element storage.
    pub fn items(&self) -> &Arc<[Value]> {
        &self.items
    }

    /// Component name of the source array (`long`, `Object`, ...).
    pub fn component_name(&self) -> &'static str {
        self.component
    }
}

impl ContainerWrapper for ArrayWrapper {
    fn shape(&self) -> ContainerShape {
        ContainerShape::Array
    }

    fn wrapper_type(&self) -> &'static str {
        "ArrayWrapper"
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn entries(&self) -> Vec<(PositionKey, Value)> {
        indexed(self.items.iter())
    }

    fn as_value(&self) -> Value {
        Value::Array(ArrayValue::Values(Arc::clone(&self.items)))
    }
}

fn indexed<'a>(items: impl Iterator<Item = &'a Value>) -> Vec<(PositionKey, Value)> {
    items
        .enumerate()
        .map(|(i, v)| (PositionKey::Index(i), v.clone()))
        .collect()
}

/// A container handle after normalization.
#[derive(Debug, Clone)]
pub enum NormalizedContainer {
    /// Wrapped map.
    Map(MapWrapper),
    /// Wrapped list.
    List(ListWrapper),
    /// Wrapped set.
    Set(SetWrapper),
    /// Wrapped (boxed) array.
    Array(ArrayWrapper),
}

impl NormalizedContainer {
    fn inner(&self) -> &dyn ContainerWrapper {
        match self {
            Self::Map(w) => w,
            Self::List(w) => w,
            Self::Set(w) => w,
            Self::Array(w) => w,
        }
    }
}

impl ContainerWrapper for NormalizedContainer {
    fn shape(&self) -> ContainerShape {
        self.inner().shape()
    }

    fn wrapper_type(&self) -> &'static str {
        self.inner().wrapper_type()
    }

    fn len(&self) -> usize {
        self.inner().len()
    }

    fn entries(&self) -> Vec<(PositionKey, Value)> {
        self.inner().entries()
    }

    fn as_value(&self) -> Value {
        self.inner().as_value()
    }
}

/// Result of normalizing a top-level handle.
#[derive(Debug, Clone)]
pub enum NormalizedHandle {
    /// Domain object, passed through.
    Object(ObjectRef),
    /// Container, wrapped.
    Container(NormalizedContainer),
    /// Anything else, passed through.
    Plain(Value),
}

impl NormalizedHandle {
    /// The container wrapper, if the handle was a container.
    pub fn as_container(&self) -> Option<&NormalizedContainer> {
        match self {
            Self::Container(container) => Some(container),
            _ => None,
        }
    }

    /// The object, if the handle was a domain object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// Normalize a top-level handle.
///
/// Fails with `InvalidArgument` on `Null`.
pub fn normalize(handle: &Value) -> GraphResult<NormalizedHandle> {
    let normalized = match handle {
        Value::Null => return Err(GraphError::invalid("handle is null")),
        Value::Map(entries) => {
            NormalizedHandle::Container(NormalizedContainer::Map(MapWrapper(Arc::clone(entries))))
        }
        Value::List(items) => {
            NormalizedHandle::Container(NormalizedContainer::List(ListWrapper(Arc::clone(items))))
        }
        Value::Set(items) => {
            NormalizedHandle::Container(NormalizedContainer::Set(SetWrapper(Arc::clone(items))))
        }
        Value::Array(array) => NormalizedHandle::Container(NormalizedContainer::Array(ArrayWrapper {
            items: array.to_boxed(),
            component: array.component_name(),
        })),
        Value::Object(object) => NormalizedHandle::Object(object.clone()),
        other => NormalizedHandle::Plain(other.clone()),
    };
    Ok(normalized)
}
