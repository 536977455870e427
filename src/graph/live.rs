//! Immutable build results.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::canonical::canonical_hash_hex;
use crate::types::{ContainerShape, Edge, EdgeLabel, GlobalId, NodeIndex, ObjectNode, PositionKey, TypeName, Value};

/// Graph of distinct domain objects reachable from one root.
///
/// Nodes live in an arena addressed by [`NodeIndex`]; each [`GlobalId`]
/// appears exactly once. Edges are kept in canonical `(owner, label, target)`
/// order.
#[derive(Debug, Clone)]
pub struct LiveGraph {
    nodes: Vec<ObjectNode>,
    edges: Vec<Edge>,
    root: NodeIndex,
    by_id: BTreeMap<GlobalId, NodeIndex>,
}

/// Hashed form of a graph's topology: identities only, no arena indices.
#[derive(Serialize)]
struct Topology<'a> {
    root: &'a GlobalId,
    nodes: Vec<&'a GlobalId>,
    edges: Vec<(&'a GlobalId, &'a EdgeLabel, &'a GlobalId)>,
}

impl LiveGraph {
    pub(crate) fn new(
        nodes: Vec<ObjectNode>,
        edges: BTreeSet<Edge>,
        root: NodeIndex,
        by_id: BTreeMap<GlobalId, NodeIndex>,
    ) -> Self {
        Self {
            nodes,
            edges: edges.into_iter().collect(),
            root,
            by_id,
        }
    }

    /// Index of the root node.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// The root node.
    pub fn root_node(&self) -> &ObjectNode {
        &self.nodes[self.root.0]
    }

    /// All nodes, in registration order.
    pub fn nodes(&self) -> &[ObjectNode] {
        &self.nodes
    }

    /// All edges, canonically ordered.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Node at an index of this graph.
    pub fn node(&self, index: NodeIndex) -> Option<&ObjectNode> {
        self.nodes.get(index.0)
    }

    /// Index of the node with the given identity.
    pub fn index_of(&self, id: &GlobalId) -> Option<NodeIndex> {
        self.by_id.get(id).copied()
    }

    /// Node with the given identity.
    pub fn node_by_id(&self, id: &GlobalId) -> Option<&ObjectNode> {
        self.index_of(id).and_then(|index| self.node(index))
    }

    /// Edges leaving a node.
    pub fn edges_from(&self, owner: NodeIndex) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.owner == owner)
    }

    /// Edges entering a node.
    pub fn edges_to(&self, target: NodeIndex) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.target == target)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Identities of all nodes, sorted.
    pub fn global_ids(&self) -> impl Iterator<Item = &GlobalId> {
        self.by_id.keys()
    }

    /// Hash of the graph's shape: root, node identities and labelled edges.
    ///
    /// Independent of traversal order and arena layout, so two builds of
    /// the same object graph hash equal.
    pub fn topology_hash(&self) -> String {
        let id = |index: NodeIndex| self.nodes[index.0].global_id();
        let mut edges: Vec<_> = self
            .edges
            .iter()
            .map(|edge| (id(edge.owner), &edge.label, id(edge.target)))
            .collect();
        // Labels may key on live values, whose `Ord` is by reference; sort by
        // their canonical form instead.
        edges.sort_by_cached_key(|(owner, label, target)| (*owner, canonical_hash_hex(label), *target));

        canonical_hash_hex(&Topology {
            root: id(self.root),
            nodes: self.by_id.keys().collect(),
            edges,
        })
    }
}

/// One element of a collections graph.
#[derive(Debug, Clone)]
pub enum CollectionElement {
    /// Managed element with its own graph.
    Graph(LiveGraph),
    /// Non-managed element, kept as is.
    Value(Value),
}

impl CollectionElement {
    /// The element's graph, if managed.
    pub fn as_graph(&self) -> Option<&LiveGraph> {
        match self {
            Self::Graph(graph) => Some(graph),
            Self::Value(_) => None,
        }
    }

    /// The element's value, if not managed.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Graph(_) => None,
        }
    }
}

/// Graph built from a top-level container: one independent sub-graph per
/// managed element, no root, no edges between siblings.
#[derive(Debug, Clone)]
pub struct CollectionsGraph {
    shape: ContainerShape,
    wrapper_type: &'static str,
    element_class: Option<TypeName>,
    elements: Vec<(PositionKey, CollectionElement)>,
    state: Value,
}

impl CollectionsGraph {
    pub(crate) fn new(
        shape: ContainerShape,
        wrapper_type: &'static str,
        element_class: Option<TypeName>,
        elements: Vec<(PositionKey, CollectionElement)>,
        state: Value,
    ) -> Self {
        Self {
            shape,
            wrapper_type,
            element_class,
            elements,
            state,
        }
    }

    /// Shape of the source container.
    pub fn shape(&self) -> ContainerShape {
        self.shape
    }

    /// Wrapper class the container was normalized into.
    pub fn wrapper_type(&self) -> &'static str {
        self.wrapper_type
    }

    /// Declared element class, if one was supplied.
    pub fn element_class(&self) -> Option<&TypeName> {
        self.element_class.as_ref()
    }

    /// Elements with their positions, in container order.
    pub fn elements(&self) -> &[(PositionKey, CollectionElement)] {
        &self.elements
    }

    /// Sub-graphs of managed elements, in container order.
    pub fn graphs(&self) -> impl Iterator<Item = (&PositionKey, &LiveGraph)> {
        self.elements
            .iter()
            .filter_map(|(position, element)| element.as_graph().map(|graph| (position, graph)))
    }

    /// The container with managed elements replaced by `Value::Ref`.
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the container had no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cdo, TypeName};

    fn node(id: GlobalId) -> ObjectNode {
        let type_name = TypeName::new("Node");
        ObjectNode::new(Cdo::detached(id, type_name))
    }

    fn graph(ids: &[GlobalId], edges: &[(usize, &str, usize)]) -> LiveGraph {
        let nodes: Vec<_> = ids.iter().cloned().map(node).collect();
        let by_id = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), NodeIndex(i)))
            .collect();
        let edges = edges
            .iter()
            .map(|(o, p, t)| Edge::property(NodeIndex(*o), *p, NodeIndex(*t)))
            .collect();
        LiveGraph::new(nodes, edges, NodeIndex(0), by_id)
    }

    #[test]
    fn test_lookup_and_adjacency() {
        let a = GlobalId::instance("Node", 1);
        let b = GlobalId::instance("Node", 2);
        let g = graph(&[a.clone(), b.clone()], &[(0, "next", 1), (1, "next", 0)]);

        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.root_node().global_id(), &a);
        assert_eq!(g.node_by_id(&b).unwrap().global_id(), &b);
        assert_eq!(g.edges_from(NodeIndex(0)).count(), 1);
        assert_eq!(g.edges_to(NodeIndex(0)).count(), 1);
        assert!(g.node_by_id(&GlobalId::instance("Node", 3)).is_none());
    }

    #[test]
    fn test_topology_hash_ignores_arena_layout() {
        let a = GlobalId::instance("Node", 1);
        let b = GlobalId::instance("Node", 2);
        let c = GlobalId::instance("Node", 3);

        let g1 = graph(&[a.clone(), b.clone(), c.clone()], &[(0, "x", 1), (0, "y", 2)]);
        let g2 = graph(&[a.clone(), c.clone(), b.clone()], &[(0, "y", 1), (0, "x", 2)]);
        assert_eq!(g1.topology_hash(), g2.topology_hash());

        let g3 = graph(&[a, b, c], &[(0, "x", 2), (0, "y", 1)]);
        assert_ne!(g1.topology_hash(), g3.topology_hash());
    }
}
