//! Core types for the object graph kernel.

pub mod signature;
pub mod value;
pub mod node;
pub mod edge;

pub use signature::{TypeName, TypeSignature, SignatureParseError};
pub use value::{Value, ObjectRef, ArrayValue, ContainerShape};
pub use node::{GlobalId, LocalId, Cdo, NodeIndex, ObjectNode};
pub use edge::{Edge, EdgeLabel, PositionKey};
