//! Node identity and graph node types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::signature::TypeName;
use super::value::{ObjectRef, Value};

/// Value of an entity's id property.
///
/// Keeps the id's kind, so `Customer` ids `1` and `"1"` are distinct
/// fingerprints even though both display as `Customer/1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LocalId {
    /// Boolean id.
    Bool(bool),
    /// Integer id.
    Int(i64),
    /// Floating point id, as IEEE bits.
    Float(u64),
    /// String id.
    Str(String),
}

impl LocalId {
    /// Id from a scalar property value; `None` for anything else.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(Self::Bool(*v)),
            Value::Int(v) => Some(Self::Int(*v)),
            Value::Float(v) => Some(Self::Float(v.to_bits())),
            Value::Str(v) => Some(Self::Str(v.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for LocalId {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for LocalId {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for LocalId {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for LocalId {
    fn from(v: f64) -> Self {
        Self::Float(v.to_bits())
    }
}

impl From<&str> for LocalId {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for LocalId {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Identity fingerprint of a graph node.
///
/// Implements `Ord` for deterministic ordering of nodes and edges.
///
/// ## Textual Form
///
/// | Variant | Example |
/// |---------|---------|
/// | `Instance` | `Customer/1` |
/// | `ValueObject` | `Customer/1#address` |
/// | `UnboundValueObject` | `Address/` |
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GlobalId {
    /// Entity instance identified by class and id.
    Instance {
        /// Entity class.
        type_name: TypeName,
        /// Id property value.
        local_id: LocalId,
    },
    /// Value object addressed by its owner and path.
    ValueObject {
        /// Owning node.
        owner: Box<GlobalId>,
        /// Path from the owner (`property` or `property/position`).
        fragment: String,
    },
    /// Value object with no owner (a graph root).
    UnboundValueObject {
        /// Value object class.
        type_name: TypeName,
    },
}

impl GlobalId {
    /// Entity instance id.
    pub fn instance(type_name: impl Into<TypeName>, local_id: impl Into<LocalId>) -> Self {
        Self::Instance {
            type_name: type_name.into(),
            local_id: local_id.into(),
        }
    }

    /// Owned value object id.
    pub fn value_object(owner: GlobalId, fragment: impl Into<String>) -> Self {
        Self::ValueObject {
            owner: Box::new(owner),
            fragment: fragment.into(),
        }
    }

    /// Unbound value object id.
    pub fn unbound(type_name: impl Into<TypeName>) -> Self {
        Self::UnboundValueObject {
            type_name: type_name.into(),
        }
    }

    /// The owner, for value object ids.
    pub fn owner(&self) -> Option<&GlobalId> {
        match self {
            Self::ValueObject { owner, .. } => Some(owner),
            _ => None,
        }
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance { type_name, local_id } => write!(f, "{}/{}", type_name, local_id),
            Self::ValueObject { owner, fragment } => write!(f, "{}#{}", owner, fragment),
            Self::UnboundValueObject { type_name } => write!(f, "{}/", type_name),
        }
    }
}

/// Node-level representation of one domain object, created by a
/// [`CdoFactory`](crate::cdo::CdoFactory).
#[derive(Debug, Clone)]
pub struct Cdo {
    global_id: GlobalId,
    type_name: TypeName,
    wrapped: Option<ObjectRef>,
}

impl Cdo {
    /// Create a Cdo wrapping a live object.
    pub fn new(global_id: GlobalId, type_name: TypeName, wrapped: ObjectRef) -> Self {
        Self {
            global_id,
            type_name,
            wrapped: Some(wrapped),
        }
    }

    /// Create a Cdo carrying identity only.
    pub fn detached(global_id: GlobalId, type_name: TypeName) -> Self {
        Self {
            global_id,
            type_name,
            wrapped: None,
        }
    }

    /// Identity fingerprint.
    pub fn global_id(&self) -> &GlobalId {
        &self.global_id
    }

    /// Class of the wrapped object.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// The live object, if any.
    pub fn wrapped(&self) -> Option<&ObjectRef> {
        self.wrapped.as_ref()
    }
}

/// Index of a node inside one [`LiveGraph`](crate::graph::LiveGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Position in the node arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One distinct domain object in a live graph.
///
/// `state` is the shallow property state seen during traversal: leaf values
/// as read, managed references replaced by `Value::Ref`, containers
/// transformed element-wise the same way.
#[derive(Debug, Clone)]
pub struct ObjectNode {
    cdo: Cdo,
    state: BTreeMap<String, Value>,
}

impl ObjectNode {
    pub(crate) fn new(cdo: Cdo) -> Self {
        Self {
            cdo,
            state: BTreeMap::new(),
        }
    }

    pub(crate) fn set_property(&mut self, property: String, value: Value) {
        self.state.insert(property, value);
    }

    /// The node's Cdo.
    pub fn cdo(&self) -> &Cdo {
        &self.cdo
    }

    /// Identity fingerprint.
    pub fn global_id(&self) -> &GlobalId {
        self.cdo.global_id()
    }

    /// Traversed property value, if the property was non-null.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.state.get(name)
    }

    /// All traversed property values.
    pub fn state(&self) -> &BTreeMap<String, Value> {
        &self.state
    }
}
