//! TraversalPolicy v1: bounds and identity rules for graph builds.
//!
//! The policy is part of a build's identity: two builds of the same object
//! graph under policies with equal `params_hash` produce equal topologies.

use serde::{Deserialize, Serialize};
use crate::canonical::canonical_hash_hex;
use crate::DEFAULT_POLICY_VERSION;

/// Hashed form of the policy parameters.
#[derive(Debug, Clone, Serialize)]
struct PolicyParams<'a> {
    version: &'a str,
    max_depth: Option<usize>,
    reuse_by_reference: bool,
}

/// Traversal policy version 1.
///
/// ## Parameters
///
/// - `max_depth`: Maximum nesting depth of managed objects below the root
///   (root is depth 0). `None` means unbounded.
/// - `reuse_by_reference`: Resolve an object already registered in this build
///   to its existing node, whatever path it is reached through. Turning this
///   off keys nodes by fingerprint only, so one value object reached from two
///   owners becomes two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalPolicy {
    /// Policy version identifier.
    pub version: String,
    /// Maximum managed-object depth.
    pub max_depth: Option<usize>,
    /// Whether already-seen objects resolve by reference identity.
    pub reuse_by_reference: bool,
}

impl TraversalPolicy {
    /// Create a policy with custom parameters.
    pub fn new(max_depth: Option<usize>, reuse_by_reference: bool) -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            max_depth,
            reuse_by_reference,
        }
    }

    /// Default policy with a depth bound.
    pub fn bounded(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            ..Self::default()
        }
    }

    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Whether `depth` is within the bound.
    pub fn allows_depth(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |limit| depth <= limit)
    }

    /// Compute a hash of the policy parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&PolicyParams {
            version: &self.version,
            max_depth: self.max_depth,
            reuse_by_reference: self.reuse_by_reference,
        })
    }
}

impl Default for TraversalPolicy {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            max_depth: None,
            reuse_by_reference: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_params_hash_determinism() {
        let policy1 = TraversalPolicy::default();
        let policy2 = TraversalPolicy::default();

        assert_eq!(policy1.params_hash(), policy2.params_hash());
        assert_eq!(policy1.params_hash().len(), 16);
    }

    #[test]
    fn test_params_hash_changes_with_params() {
        let unbounded = TraversalPolicy::default();
        let bounded = TraversalPolicy::bounded(3);
        let by_fingerprint = TraversalPolicy::new(None, false);

        assert_ne!(unbounded.params_hash(), bounded.params_hash());
        assert_ne!(unbounded.params_hash(), by_fingerprint.params_hash());
    }

    #[test]
    fn test_allows_depth() {
        assert!(TraversalPolicy::default().allows_depth(10_000));

        let bounded = TraversalPolicy::bounded(2);
        assert!(bounded.allows_depth(2));
        assert!(!bounded.allows_depth(3));
    }

    #[test]
    fn test_serde_round_trip() {
        let policy = TraversalPolicy::bounded(4);
        let json = serde_json::to_string(&policy).unwrap();
        let back: TraversalPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy, back);
        assert_eq!(back.policy_id(), DEFAULT_POLICY_VERSION);
    }
}
