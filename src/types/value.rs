//! Dynamic value model for domain objects handed to the kernel.
//!
//! Containers keep their storage behind `Arc`, so wrapping or re-tagging a
//! container shares structure instead of copying it. Domain objects are
//! shared handles with a mutable property table; that is what makes cyclic
//! object graphs expressible.
//!
//! ## Ordering
//!
//! `Value` is totally ordered so it can key `BTreeMap`/`BTreeSet`:
//! - variants order by kind first (`Null < Bool < Int < Float < Str < Ref < Object < List < Set < Map < Array`)
//! - floats use `f64::total_cmp`
//! - objects compare by reference identity, never by content
//!
//! Anything that must be stable across builds (paths, hashes, serialized
//! forms) goes through the content shape in [`crate::canonical`] instead of
//! this ordering.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Serialize, Serializer};

use crate::canonical::{content_key, ContentShape};

use super::node::GlobalId;
use super::signature::{TypeName, TypeSignature};

/// Shape of a container value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum ContainerShape {
    /// Key/value container.
    Map,
    /// Ordered sequence.
    List,
    /// Unordered membership container.
    Set,
    /// Fixed-length sequence.
    Array,
}

impl fmt::Display for ContainerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map => write!(f, "map"),
            Self::List => write!(f, "list"),
            Self::Set => write!(f, "set"),
            Self::Array => write!(f, "array"),
        }
    }
}

/// A domain object instance: class name plus named properties.
pub struct DomainObject {
    type_name: TypeName,
    properties: RwLock<BTreeMap<String, Value>>,
}

/// Shared handle to a domain object.
///
/// Equality, ordering and hashing are by reference identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<DomainObject>);

impl ObjectRef {
    /// Create an object of the given class with no properties.
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Self(Arc::new(DomainObject {
            type_name: type_name.into(),
            properties: RwLock::new(BTreeMap::new()),
        }))
    }

    /// Builder-style property assignment.
    pub fn with(self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(property, value);
        self
    }

    /// Assign a property.
    pub fn set(&self, property: impl Into<String>, value: impl Into<Value>) {
        self.0.properties.write().insert(property.into(), value.into());
    }

    /// Read a property; missing properties read as `Value::Null`.
    ///
    /// The value is cloned out so no lock is held while the caller recurses.
    pub fn get(&self, property: &str) -> Value {
        self.0
            .properties
            .read()
            .get(property)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Names of the assigned properties, sorted.
    pub fn property_names(&self) -> Vec<String> {
        self.0.properties.read().keys().cloned().collect()
    }

    /// Runtime class of the object.
    pub fn type_name(&self) -> &TypeName {
        &self.0.type_name
    }

    /// Whether two handles point at the same object.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared object, used as the reference identity key.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for ObjectRef {
    // Properties are not printed: object graphs may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.0.type_name, self.addr())
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl PartialOrd for ObjectRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl std::hash::Hash for ObjectRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

/// Array storage: primitive arrays keep unboxed elements.
#[derive(Debug, Clone)]
pub enum ArrayValue {
    /// `long[]` / `int[]`.
    Ints(Arc<[i64]>),
    /// `double[]` / `float[]`.
    Floats(Arc<[f64]>),
    /// `boolean[]`.
    Bools(Arc<[bool]>),
    /// Reference-typed array.
    Values(Arc<[Value]>),
}

impl ArrayValue {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Ints(items) => items.len(),
            Self::Floats(items) => items.len(),
            Self::Bools(items) => items.len(),
            Self::Values(items) => items.len(),
        }
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether elements are stored unboxed.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Values(_))
    }

    /// Name of the component type.
    pub fn component_name(&self) -> &'static str {
        match self {
            Self::Ints(_) => "long",
            Self::Floats(_) => "double",
            Self::Bools(_) => "boolean",
            Self::Values(_) => "Object",
        }
    }

    /// Reference-typed view of the elements.
    ///
    /// Primitive arrays are boxed into a newly allocated array;
    /// reference arrays share the existing storage.
    pub fn to_boxed(&self) -> Arc<[Value]> {
        match self {
            Self::Ints(items) => items.iter().map(|v| Value::Int(*v)).collect(),
            Self::Floats(items) => items.iter().map(|v| Value::Float(*v)).collect(),
            Self::Bools(items) => items.iter().map(|v| Value::Bool(*v)).collect(),
            Self::Values(items) => Arc::clone(items),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Ints(_) => 0,
            Self::Floats(_) => 1,
            Self::Bools(_) => 2,
            Self::Values(_) => 3,
        }
    }
}

impl PartialEq for ArrayValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ArrayValue {}

impl PartialOrd for ArrayValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArrayValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Ints(a), Self::Ints(b)) => a.cmp(b),
            (Self::Floats(a), Self::Floats(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Self::Bools(a), Self::Bools(b)) => a.cmp(b),
            (Self::Values(a), Self::Values(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// A raw domain value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// String.
    Str(String),
    /// Reference to a graph node by identity.
    Ref(GlobalId),
    /// Domain object.
    Object(ObjectRef),
    /// Ordered sequence.
    List(Arc<Vec<Value>>),
    /// Membership container.
    Set(Arc<BTreeSet<Value>>),
    /// Key/value container.
    Map(Arc<BTreeMap<Value, Value>>),
    /// Fixed-length array.
    Array(ArrayValue),
}

impl Value {
    /// String value.
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// List from elements in order.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(Arc::new(items.into_iter().collect()))
    }

    /// Set from elements; duplicates collapse.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Set(Arc::new(items.into_iter().collect()))
    }

    /// Map from entries; later duplicates of a key win.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self::Map(Arc::new(entries.into_iter().collect()))
    }

    /// Reference-typed array.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Array(ArrayValue::Values(items.into_iter().collect()))
    }

    /// Primitive integer array.
    pub fn int_array(items: impl IntoIterator<Item = i64>) -> Self {
        Self::Array(ArrayValue::Ints(items.into_iter().collect()))
    }

    /// Primitive float array.
    pub fn float_array(items: impl IntoIterator<Item = f64>) -> Self {
        Self::Array(ArrayValue::Floats(items.into_iter().collect()))
    }

    /// Primitive boolean array.
    pub fn bool_array(items: impl IntoIterator<Item = bool>) -> Self {
        Self::Array(ArrayValue::Bools(items.into_iter().collect()))
    }

    /// Whether this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The object handle, if this is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Container shape, if this is a container.
    pub fn container_shape(&self) -> Option<ContainerShape> {
        match self {
            Self::Map(_) => Some(ContainerShape::Map),
            Self::List(_) => Some(ContainerShape::List),
            Self::Set(_) => Some(ContainerShape::Set),
            Self::Array(_) => Some(ContainerShape::Array),
            _ => None,
        }
    }

    /// Signature of the value's runtime type.
    ///
    /// Containers report their raw shape (`List`, `Map`, ...); arrays report
    /// their storage component (`long[]`, `Object[]`).
    pub fn runtime_signature(&self) -> TypeSignature {
        match self {
            Self::Null | Self::Ref(_) => TypeSignature::class("Object"),
            Self::Bool(_) => TypeSignature::class("Boolean"),
            Self::Int(_) => TypeSignature::class("Long"),
            Self::Float(_) => TypeSignature::class("Double"),
            Self::Str(_) => TypeSignature::class("String"),
            Self::Object(object) => TypeSignature::Class(object.type_name().clone()),
            Self::List(_) => TypeSignature::class("List"),
            Self::Set(_) => TypeSignature::class("Set"),
            Self::Map(_) => TypeSignature::class("Map"),
            Self::Array(array) => {
                TypeSignature::array_of(TypeSignature::class(array.component_name()))
            }
        }
    }

    /// Text addressing this value inside a path.
    ///
    /// Scalars and references render as displayed; objects and containers
    /// render as `#` plus their content key.
    pub fn path_fragment(&self) -> String {
        match self {
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_) | Self::Ref(_) => {
                self.to_string()
            }
            _ => format!("#{}", content_key(self)),
        }
    }

    /// Short name of the value's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Ref(_) => "ref",
            Self::Object(_) => "object",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Array(_) => "array",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Float(_) => 3,
            Self::Str(_) => 4,
            Self::Ref(_) => 5,
            Self::Object(_) => 6,
            Self::List(_) => 7,
            Self::Set(_) => 8,
            Self::Map(_) => 9,
            Self::Array(_) => 10,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Ref(a), Self::Ref(b)) => a.cmp(b),
            (Self::Object(a), Self::Object(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) => a.cmp(b),
            (Self::Map(a), Self::Map(b)) => a.cmp(b),
            (Self::Array(a), Self::Array(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Serializes the content shape: objects by class and properties, sets and
/// maps sorted. There is no matching `Deserialize`; live objects cannot be
/// rebuilt from their content.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ContentShape::of(self).serialize(serializer)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "{}", v),
            Self::Ref(id) => write!(f, "{}", id),
            Self::Object(object) => write!(f, "{:?}", object),
            Self::List(items) => write_seq(f, "[", items.iter(), "]"),
            Self::Set(items) => write_seq(f, "{", items.iter(), "}"),
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, "}}")
            }
            Self::Array(array) => write_seq(f, "[", array.to_boxed().iter(), "]"),
        }
    }
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: impl Iterator<Item = &'a Value>,
    close: &str,
) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Self::Object(object)
    }
}

impl From<&ObjectRef> for Value {
    fn from(object: &ObjectRef) -> Self {
        Self::Object(object.clone())
    }
}

impl From<GlobalId> for Value {
    fn from(id: GlobalId) -> Self {
        Self::Ref(id)
    }
}
