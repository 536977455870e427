//! # object-graph-kernel
//!
//! Live object graphs for diffing and auditing domain models.
//!
//! The kernel answers one question:
//!
//! > Given a live domain object (or a container of them), which distinct,
//! > addressable objects does it reach, and through which properties?
//!
//! ## Core Contract
//!
//! 1. Normalize a top-level handle: objects pass through, containers are wrapped
//! 2. Walk the object graph once per distinct object, terminating cycles
//! 3. Tag every container element with where it was found (index, key, membership)
//! 4. Return an immutable graph with stable [`GlobalId`] fingerprints
//!
//! ## Architecture
//!
//! ```text
//! handle → normalize → LiveGraphFactory ─┬─ ObjectGraphBuilder      → LiveGraph
//!                             ↓          └─ CollectionsGraphBuilder → CollectionsGraph
//!                  TypeMapper + CdoFactory
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same object graph + same registry + same policy → identical topology hash
//! - Edge ordering is canonical (owner, label, target)
//! - List and array positions follow source order; map values carry their transformed key
//! - Set members and map keys are addressed by content key, never by where
//!   their objects were allocated
//! - Entity ids keep their kind: `1` and `"1"` are different identities

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod error;
pub mod normalize;
pub mod metamodel;
pub mod cdo;
pub mod graph;
pub mod policy;
pub mod canonical;

// Re-exports
pub use types::{
    TypeName, TypeSignature, SignatureParseError, Value, ObjectRef, ArrayValue, ContainerShape,
    GlobalId, LocalId, Cdo, NodeIndex, ObjectNode, Edge, EdgeLabel, PositionKey,
};
pub use error::{GraphError, GraphResult};
pub use normalize::{
    normalize, NormalizedHandle, NormalizedContainer, ContainerWrapper,
    MapWrapper, ListWrapper, SetWrapper, ArrayWrapper,
};
pub use metamodel::{
    Enumerable, EnumerableType, EnumeratorContext, OwnerContext,
    MapType, ListType, SetType, ArrayType,
    ManagedClass, ManagedType, Property, TypeCategory, TypeMapper,
    InMemoryTypeRegistry, CacheConfig, CacheStats,
};
pub use cdo::{CdoFactory, LiveCdoFactory};
pub use graph::{
    LiveGraph, CollectionsGraph, CollectionElement,
    ObjectGraphBuilder, CollectionsGraphBuilder, LiveGraphFactory, BuiltGraph,
};
pub use policy::TraversalPolicy;
pub use canonical::{canonical_hash_hex, content_key, CONTENT_DEPTH};

/// Schema version for all graph kernel types.
/// Increment on breaking changes to any schema type.
pub const GRAPH_KERNEL_SCHEMA_VERSION: &str = "1.0.0";

/// Default policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "traversal_policy_v1";
