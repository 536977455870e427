//! Entry point: route a handle to the right graph builder.

use std::sync::Arc;

use crate::cdo::{CdoFactory, LiveCdoFactory};
use crate::error::{GraphError, GraphResult};
use crate::metamodel::{InMemoryTypeRegistry, TypeMapper};
use crate::normalize::{normalize, NormalizedHandle};
use crate::policy::TraversalPolicy;
use crate::types::{Cdo, ObjectRef, TypeName, Value};

use super::builder::ObjectGraphBuilder;
use super::collections::CollectionsGraphBuilder;
use super::live::{CollectionsGraph, LiveGraph};

/// Result of building from an arbitrary handle.
#[derive(Debug, Clone)]
pub enum BuiltGraph {
    /// The handle was a domain object.
    Object(LiveGraph),
    /// The handle was a container.
    Collections(CollectionsGraph),
}

impl BuiltGraph {
    /// The object graph, if the handle was an object.
    pub fn as_object(&self) -> Option<&LiveGraph> {
        match self {
            Self::Object(graph) => Some(graph),
            Self::Collections(_) => None,
        }
    }

    /// The collections graph, if the handle was a container.
    pub fn as_collections(&self) -> Option<&CollectionsGraph> {
        match self {
            Self::Collections(graph) => Some(graph),
            Self::Object(_) => None,
        }
    }
}

/// Builds live graphs from handles.
///
/// # Example
///
/// ```rust,ignore
/// let factory = LiveGraphFactory::with_registry(registry);
/// match factory.create_live_graph(&Value::from(&customer))? {
///     BuiltGraph::Object(graph) => println!("{} nodes", graph.node_count()),
///     BuiltGraph::Collections(graph) => println!("{} elements", graph.len()),
/// }
/// ```
#[derive(Clone)]
pub struct LiveGraphFactory {
    objects: ObjectGraphBuilder,
    collections: CollectionsGraphBuilder,
    cdo_factory: Arc<dyn CdoFactory>,
    mapper: Arc<dyn TypeMapper>,
}

impl LiveGraphFactory {
    /// Create a factory with the default policy.
    pub fn new(mapper: Arc<dyn TypeMapper>, cdo_factory: Arc<dyn CdoFactory>) -> Self {
        Self::with_policy(mapper, cdo_factory, TraversalPolicy::default())
    }

    /// Create a factory with a custom policy.
    pub fn with_policy(
        mapper: Arc<dyn TypeMapper>,
        cdo_factory: Arc<dyn CdoFactory>,
        policy: TraversalPolicy,
    ) -> Self {
        let objects = ObjectGraphBuilder::with_policy(Arc::clone(&mapper), Arc::clone(&cdo_factory), policy);
        Self {
            collections: CollectionsGraphBuilder::new(objects.clone()),
            objects,
            cdo_factory,
            mapper,
        }
    }

    /// Factory over an in-memory registry with the default Cdo factory.
    pub fn with_registry(registry: InMemoryTypeRegistry) -> Self {
        Self::new(Arc::new(registry), Arc::new(LiveCdoFactory::new()))
    }

    /// The object graph builder.
    pub fn object_builder(&self) -> &ObjectGraphBuilder {
        &self.objects
    }

    /// The collections graph builder.
    pub fn collections_builder(&self) -> &CollectionsGraphBuilder {
        &self.collections
    }

    /// Normalize `handle` and build the matching graph.
    ///
    /// Objects yield an object graph and containers a collections graph.
    /// Plain values are rejected with `NotManaged`, `Null` with
    /// `InvalidArgument`.
    pub fn create_live_graph(&self, handle: &Value) -> GraphResult<BuiltGraph> {
        match normalize(handle)? {
            NormalizedHandle::Object(object) => self.objects.build_graph(&object).map(BuiltGraph::Object),
            NormalizedHandle::Container(container) => self
                .collections
                .build_graph(&container, None)
                .map(BuiltGraph::Collections),
            NormalizedHandle::Plain(value) => Err(GraphError::not_managed(value.runtime_signature())),
        }
    }

    /// Build the collections graph of a container handle with a declared
    /// element class.
    ///
    /// Fails with `InvalidArgument` if the handle is not a container.
    pub fn create_collections_graph(
        &self,
        handle: &Value,
        element_class: Option<&TypeName>,
    ) -> GraphResult<CollectionsGraph> {
        match normalize(handle)? {
            NormalizedHandle::Container(container) => self.collections.build_graph(&container, element_class),
            _ => Err(GraphError::invalid(format!(
                "expected a container handle, found {}",
                handle.kind_name()
            ))),
        }
    }

    /// Create the unbound Cdo of a managed object.
    pub fn create_cdo(&self, object: &ObjectRef) -> GraphResult<Cdo> {
        let managed = self.mapper.classify_class(object.type_name());
        self.cdo_factory.create(object, &managed, None)
    }
}
