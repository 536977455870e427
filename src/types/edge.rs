//! Edge and position types for live graphs.
//!
//! Edges serialize but do not deserialize: positions may hold live values.

use serde::Serialize;

use super::node::NodeIndex;
use super::value::Value;

/// Where inside a container an element was found.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PositionKey {
    /// 0-based index in a list or array.
    Index(usize),
    /// Transformed key of a map entry.
    Key(Value),
    /// Membership only (set elements, map keys).
    Member,
}

impl PositionKey {
    /// Index, for list/array positions.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            _ => None,
        }
    }

    /// Key, for map positions.
    pub fn as_key(&self) -> Option<&Value> {
        match self {
            Self::Key(key) => Some(key),
            _ => None,
        }
    }
}

impl std::fmt::Display for PositionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{}", i),
            Self::Key(key) => write!(f, "{}", key),
            Self::Member => write!(f, "*"),
        }
    }
}

/// What an edge is labelled with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EdgeLabel {
    /// Direct reference through a property.
    Property(String),
    /// Reference from inside a container-valued property.
    Element {
        /// The container property.
        property: String,
        /// Position of the element in the container.
        position: PositionKey,
    },
}

impl EdgeLabel {
    /// The property the edge leaves through.
    pub fn property(&self) -> &str {
        match self {
            Self::Property(property) => property,
            Self::Element { property, .. } => property,
        }
    }

    /// The container position, for element edges.
    pub fn position(&self) -> Option<&PositionKey> {
        match self {
            Self::Property(_) => None,
            Self::Element { position, .. } => Some(position),
        }
    }
}

impl std::fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Property(property) => write!(f, "{}", property),
            Self::Element { property, position } => write!(f, "{}/{}", property, position),
        }
    }
}

/// Edge in a live graph: owner references target at a property or position.
///
/// Implements `Ord` for deterministic ordering: (owner, label, target).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Edge {
    /// Referencing node.
    pub owner: NodeIndex,
    /// Property or position label.
    pub label: EdgeLabel,
    /// Referenced node.
    pub target: NodeIndex,
}

impl Edge {
    /// Create a new edge.
    pub fn new(owner: NodeIndex, label: EdgeLabel, target: NodeIndex) -> Self {
        Self {
            owner,
            label,
            target,
        }
    }

    /// Create a property edge.
    pub fn property(owner: NodeIndex, property: impl Into<String>, target: NodeIndex) -> Self {
        Self::new(owner, EdgeLabel::Property(property.into()), target)
    }

    /// Create a container element edge.
    pub fn element(
        owner: NodeIndex,
        property: impl Into<String>,
        position: PositionKey,
        target: NodeIndex,
    ) -> Self {
        Self::new(
            owner,
            EdgeLabel::Element {
                property: property.into(),
                position,
            },
            target,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_ordering() {
        let e1 = Edge::property(NodeIndex(0), "a", NodeIndex(1));
        let e2 = Edge::property(NodeIndex(0), "b", NodeIndex(1));
        let e3 = Edge::property(NodeIndex(1), "a", NodeIndex(0));

        // Same owner, different label
        assert!(e1 < e2);
        // Different owner
        assert!(e2 < e3);
    }

    #[test]
    fn test_label_accessors() {
        let edge = Edge::element(NodeIndex(0), "orders", PositionKey::Index(2), NodeIndex(3));
        assert_eq!(edge.label.property(), "orders");
        assert_eq!(edge.label.position(), Some(&PositionKey::Index(2)));
        assert_eq!(edge.label.to_string(), "orders/2");

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "owner": 0,
                "label": { "Element": { "property": "orders", "position": { "Index": 2 } } },
                "target": 3
            })
        );

        let key = PositionKey::Key(Value::str("home"));
        assert_eq!(key.as_key(), Some(&Value::str("home")));
        assert_eq!(key.as_index(), None);
    }
}
