//! Object graph builder.
//!
//! Walks a live object graph from a root and produces a deduplicated,
//! cycle-safe [`LiveGraph`].
//!
//! ## Algorithm
//!
//! 1. Classify the root; it must be an Entity or ValueObject
//! 2. Create its Cdo and register the node *before* walking properties
//! 3. For every non-null property, by declared category:
//!    - Entity / ValueObject: visit the object, add a property edge
//!    - Enumerable: `transform` the container; managed elements are visited
//!      and replaced by `Value::Ref`, each with a position-tagged edge
//!    - Primitive / Value: store the value on the node
//! 4. Objects already registered resolve to their node (by reference first,
//!    then by fingerprint), which is what terminates cycles
//!
//! Declared types that are erased (`?`, `T`, `Object`) are classified from
//! the runtime value instead.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::cdo::CdoFactory;
use crate::error::{GraphError, GraphResult};
use crate::metamodel::{Enumerable, EnumerableType, ManagedType, OwnerContext, Property, TypeMapper};
use crate::policy::TraversalPolicy;
use crate::types::{Edge, GlobalId, NodeIndex, ObjectNode, ObjectRef, PositionKey, TypeSignature, Value};

use super::live::LiveGraph;

/// Builds object graphs from root objects.
///
/// Holds only shared handles to the classifier and the Cdo factory; all
/// traversal state lives in the build call, so one builder serves
/// concurrent builds.
#[derive(Clone)]
pub struct ObjectGraphBuilder {
    mapper: Arc<dyn TypeMapper>,
    cdo_factory: Arc<dyn CdoFactory>,
    policy: TraversalPolicy,
}

impl ObjectGraphBuilder {
    /// Create a builder with the default policy.
    pub fn new(mapper: Arc<dyn TypeMapper>, cdo_factory: Arc<dyn CdoFactory>) -> Self {
        Self::with_policy(mapper, cdo_factory, TraversalPolicy::default())
    }

    /// Create a builder with a custom policy.
    pub fn with_policy(
        mapper: Arc<dyn TypeMapper>,
        cdo_factory: Arc<dyn CdoFactory>,
        policy: TraversalPolicy,
    ) -> Self {
        Self {
            mapper,
            cdo_factory,
            policy,
        }
    }

    /// The traversal policy.
    pub fn policy(&self) -> &TraversalPolicy {
        &self.policy
    }

    /// Build the graph reachable from `root`.
    ///
    /// Fails with `NotManaged` if the root is not an Entity or ValueObject,
    /// and with `DepthLimitExceeded` if the policy bounds depth and the graph
    /// goes deeper.
    pub fn build_graph(&self, root: &ObjectRef) -> GraphResult<LiveGraph> {
        let managed = self
            .managed_type_of(root)
            .ok_or_else(|| GraphError::not_managed(root.type_name()))?;
        self.build_from(root, managed, None)
    }

    /// Build a graph rooted at an object reached through `owner`.
    pub(crate) fn build_from(
        &self,
        root: &ObjectRef,
        managed: ManagedType,
        owner: Option<&OwnerContext>,
    ) -> GraphResult<LiveGraph> {
        tracing::debug!(
            root_type = %root.type_name(),
            policy = %self.policy.policy_id(),
            "Building object graph"
        );

        let mut traversal = Traversal::new(self);
        let root_index = traversal.visit(root, managed, owner, 0)?;
        let graph = traversal.finish(root_index);

        tracing::debug!(
            root = %graph.root_node().global_id(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Object graph built"
        );
        Ok(graph)
    }

    /// Runtime classification of an object, if it is managed.
    pub(crate) fn managed_type_of(&self, object: &ObjectRef) -> Option<ManagedType> {
        let managed = self.mapper.classify_class(object.type_name());
        match managed {
            ManagedType::Entity(_) | ManagedType::ValueObject(_) => Some(managed),
            _ => None,
        }
    }

    pub(crate) fn mapper(&self) -> &dyn TypeMapper {
        self.mapper.as_ref()
    }
}

/// Per-build traversal state.
struct Traversal<'b> {
    builder: &'b ObjectGraphBuilder,
    nodes: Vec<ObjectNode>,
    edges: BTreeSet<Edge>,
    by_id: BTreeMap<GlobalId, NodeIndex>,
    by_ref: HashMap<ObjectRef, NodeIndex>,
    active: HashMap<ObjectRef, NodeIndex>,
}

impl<'b> Traversal<'b> {
    fn new(builder: &'b ObjectGraphBuilder) -> Self {
        Self {
            builder,
            nodes: Vec::new(),
            edges: BTreeSet::new(),
            by_id: BTreeMap::new(),
            by_ref: HashMap::new(),
            active: HashMap::new(),
        }
    }

    fn finish(self, root: NodeIndex) -> LiveGraph {
        LiveGraph::new(self.nodes, self.edges, root, self.by_id)
    }

    /// Visit a managed object at `depth`, returning its node.
    fn visit(
        &mut self,
        object: &ObjectRef,
        managed: ManagedType,
        owner: Option<&OwnerContext>,
        depth: usize,
    ) -> GraphResult<NodeIndex> {
        let builder = self.builder;
        let policy = &builder.policy;
        // Ancestors always short-circuit, so value-object cycles terminate
        // even when nodes are keyed by fingerprint only.
        let seen = if policy.reuse_by_reference {
            self.by_ref.get(object)
        } else {
            self.active.get(object)
        };
        if let Some(&index) = seen {
            tracing::trace!(node = %index, "Reused node by reference");
            return Ok(index);
        }

        let cdo = builder.cdo_factory.create(object, &managed, owner)?;
        if let Some(&index) = self.by_id.get(cdo.global_id()) {
            tracing::trace!(global_id = %cdo.global_id(), node = %index, "Reused node by fingerprint");
            self.by_ref.insert(object.clone(), index);
            return Ok(index);
        }

        if !policy.allows_depth(depth) {
            let limit = policy.max_depth.unwrap_or(depth);
            tracing::warn!(global_id = %cdo.global_id(), depth, limit, "Traversal depth limit exceeded");
            return Err(GraphError::DepthLimitExceeded { limit });
        }

        let index = NodeIndex(self.nodes.len());
        let id = cdo.global_id().clone();
        tracing::trace!(global_id = %id, node = %index, depth, "Registered node");
        self.nodes.push(ObjectNode::new(cdo));
        self.by_id.insert(id.clone(), index);
        self.by_ref.insert(object.clone(), index);
        self.active.insert(object.clone(), index);

        let properties = match managed.managed_class() {
            Some(class) => class.properties_of(object),
            None => Vec::new(),
        };
        for property in &properties {
            let value = object.get(&property.name);
            if value.is_null() {
                continue;
            }
            let state = self.walk_property(index, &id, property, &value, depth)?;
            self.nodes[index.0].set_property(property.name.clone(), state);
        }

        self.active.remove(object);
        Ok(index)
    }

    /// Walk one property value; returns what the node stores for it.
    fn walk_property(
        &mut self,
        owner: NodeIndex,
        owner_id: &GlobalId,
        property: &Property,
        value: &Value,
        depth: usize,
    ) -> GraphResult<Value> {
        let declared = effective_signature(&property.declared_type, value);
        let mut ctx = OwnerContext::new(owner_id.clone(), property.name.clone());
        let category = self.builder.mapper.classify(&declared);

        match category {
            ManagedType::Entity(_) | ManagedType::ValueObject(_) => {
                let object = match value.as_object() {
                    Some(object) => object,
                    None => {
                        tracing::warn!(
                            owner = %owner_id,
                            property = %property.name,
                            declared = %declared,
                            found = value.kind_name(),
                            "Managed property holds a non-object value, kept as leaf"
                        );
                        return Ok(value.clone());
                    }
                };
                match self.builder.managed_type_of(object) {
                    Some(managed) => {
                        let target = self.visit(object, managed, Some(&ctx), depth + 1)?;
                        self.edges.insert(Edge::property(owner, property.name.clone(), target));
                        Ok(self.reference(target))
                    }
                    None => {
                        tracing::warn!(
                            owner = %owner_id,
                            property = %property.name,
                            runtime_type = %object.type_name(),
                            "Managed property holds an unmanaged object, kept as leaf"
                        );
                        Ok(value.clone())
                    }
                }
            }
            ManagedType::Enumerable(descriptor) => {
                let found = match value.container_shape() {
                    Some(shape) => shape,
                    None => {
                        tracing::warn!(
                            owner = %owner_id,
                            property = %property.name,
                            declared = %declared,
                            found = value.kind_name(),
                            "Container property holds a non-container value, kept as leaf"
                        );
                        return Ok(value.clone());
                    }
                };
                let descriptor = if descriptor.shape() == found {
                    descriptor
                } else {
                    tracing::warn!(
                        owner = %owner_id,
                        property = %property.name,
                        declared = %declared,
                        found = %found,
                        "Container shape differs from declaration, walking runtime shape"
                    );
                    match EnumerableType::for_value(value) {
                        Some(raw) => raw,
                        None => return Ok(value.clone()),
                    }
                };
                self.walk_container(owner, &descriptor, value, &mut ctx, depth)
            }
            ManagedType::Primitive(_) | ManagedType::Value(_) => {
                if let Some(object) = value.as_object() {
                    tracing::warn!(
                        owner = %owner_id,
                        property = %property.name,
                        declared = %declared,
                        runtime_type = %object.type_name(),
                        "Object stored in a value-typed property, kept as leaf"
                    );
                }
                Ok(value.clone())
            }
        }
    }

    /// Transform a container, visiting managed elements.
    fn walk_container(
        &mut self,
        owner: NodeIndex,
        descriptor: &EnumerableType,
        container: &Value,
        ctx: &mut OwnerContext,
        depth: usize,
    ) -> GraphResult<Value> {
        descriptor.transform(
            container,
            |element, ctx| self.walk_element(owner, element, ctx, depth),
            ctx,
        )
    }

    fn walk_element(
        &mut self,
        owner: NodeIndex,
        element: &Value,
        ctx: &OwnerContext,
        depth: usize,
    ) -> GraphResult<Value> {
        if let Some(object) = element.as_object() {
            let managed = match self.builder.managed_type_of(object) {
                Some(managed) => managed,
                None => return Ok(element.clone()),
            };
            let target = self.visit(object, managed, Some(ctx), depth + 1)?;
            let position = ctx.position().unwrap_or(PositionKey::Member);
            self.edges.insert(Edge::element(owner, ctx.property(), position, target));
            return Ok(self.reference(target));
        }

        // Nested containers are walked raw, addressed below the element's path.
        if let Some(descriptor) = EnumerableType::for_value(element) {
            let mut nested = OwnerContext::new(ctx.owner().clone(), ctx.path());
            return self.walk_container(owner, &descriptor, element, &mut nested, depth);
        }

        Ok(element.clone())
    }

    fn reference(&self, index: NodeIndex) -> Value {
        Value::Ref(self.nodes[index.0].global_id().clone())
    }
}

/// Declared type to classify by: erased declarations fall back to the
/// runtime type of the value.
fn effective_signature(declared: &TypeSignature, value: &Value) -> TypeSignature {
    let erased = match declared {
        TypeSignature::Wildcard | TypeSignature::Variable(_) => true,
        TypeSignature::Class(name) => name.as_str() == "Object",
        _ => false,
    };
    if erased {
        value.runtime_signature()
    } else {
        declared.clone()
    }
}
