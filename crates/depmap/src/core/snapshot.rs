//! Raw backend payloads and the immutable snapshot
//!
//! The backend's field names have drifted across versions (`type` vs
//! `edge_type` vs `relationship_type`, `source` vs `from`). Rather than
//! duck-typing at the use site, every legacy variant is decoded into its
//! own optional field and resolved through an ordered-fallback accessor
//! with a documented priority: first non-empty wins.

use serde::Deserialize;

use super::types::{Edge, Node};

/// Pick the first candidate that is present and non-blank
///
/// The priority is the order of the slice; whitespace-only values are
/// treated as absent.
pub fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| *c)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// One dependency-map fetch result as sent by the backend
///
/// `{nodes: [], edges: []}` is a valid empty graph, not an error. A
/// populated `error` field marks a degraded response; the nodes/edges that
/// did arrive are still usable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
    pub error: Option<String>,
}

impl RawGraph {
    /// Returns true if the payload contains no nodes and no edges
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// One raw node record; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawNode {
    pub id: Option<String>,
    pub arn: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub resource_type: Option<String>,
    pub label: Option<String>,
    pub name: Option<String>,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
    pub score: Option<f64>,
}

impl RawNode {
    /// Identifier priority: `id`, then `arn`
    ///
    /// Callers synthesize a placeholder when both are absent.
    pub fn resolved_id(&self) -> Option<&str> {
        first_non_empty(&[self.id.as_deref(), self.arn.as_deref()])
    }

    /// Type priority: `type`, then `resource_type`, then `label`
    pub fn resolved_type(&self) -> Option<&str> {
        first_non_empty(&[
            self.node_type.as_deref(),
            self.resource_type.as_deref(),
            self.label.as_deref(),
        ])
    }

    /// Display name priority: `name`, then `label`
    pub fn resolved_name(&self) -> Option<&str> {
        first_non_empty(&[self.name.as_deref(), self.label.as_deref()])
    }
}

/// One raw edge record; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEdge {
    pub id: Option<String>,
    pub source: Option<String>,
    pub from: Option<String>,
    pub source_id: Option<String>,
    pub target: Option<String>,
    pub to: Option<String>,
    pub target_id: Option<String>,
    #[serde(rename = "type")]
    pub edge_kind: Option<String>,
    pub edge_type: Option<String>,
    pub relationship_type: Option<String>,
    pub protocol: Option<String>,
    pub port: Option<u16>,
    pub hits: Option<u64>,
    pub last_seen: Option<String>,
    pub bytes: Option<u64>,
}

impl RawEdge {
    /// Source priority: `source`, then `from`, then `source_id`
    pub fn resolved_source(&self) -> Option<&str> {
        first_non_empty(&[
            self.source.as_deref(),
            self.from.as_deref(),
            self.source_id.as_deref(),
        ])
    }

    /// Target priority: `target`, then `to`, then `target_id`
    pub fn resolved_target(&self) -> Option<&str> {
        first_non_empty(&[
            self.target.as_deref(),
            self.to.as_deref(),
            self.target_id.as_deref(),
        ])
    }

    /// Relationship priority: `type`, then `edge_type`, then `relationship_type`
    pub fn resolved_kind(&self) -> Option<&str> {
        first_non_empty(&[
            self.edge_kind.as_deref(),
            self.edge_type.as_deref(),
            self.relationship_type.as_deref(),
        ])
    }
}

/// The `/connections` payload consumed by the drill-in flow
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConnections {
    pub connections: ConnectionSets,
}

/// Inbound and outbound connection lists for one resource
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionSets {
    pub inbound: Vec<RawConnection>,
    pub outbound: Vec<RawConnection>,
}

/// One connection entry nesting a relationship and its endpoints
///
/// The nested sub-objects carry the same inconsistent field naming as the
/// dependency-map payload and are tolerated by the same accessors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConnection {
    pub relationship: RawEdge,
    pub source: RawNode,
    pub target: RawNode,
}

/// One complete, immutable nodes+edges pair for a point-in-time fetch
///
/// A new snapshot always fully supersedes the previous one; there are no
/// partial-update semantics, which is what rules out stale-position and
/// stale-edge inconsistencies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Snapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Look up an edge by id
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_empty_priority() {
        assert_eq!(first_non_empty(&[Some("a"), Some("b")]), Some("a"));
        assert_eq!(first_non_empty(&[None, Some("b")]), Some("b"));
        assert_eq!(first_non_empty(&[Some("  "), Some("b")]), Some("b"));
        assert_eq!(first_non_empty(&[Some(""), None]), None);
        assert_eq!(first_non_empty(&[]), None);
    }

    #[test]
    fn test_raw_node_id_fallback() {
        let json = r#"{"arn": "arn:aws:ec2:us-east-1:123:instance/i-1"}"#;
        let raw: RawNode = serde_json::from_str(json).unwrap();
        assert_eq!(
            raw.resolved_id(),
            Some("arn:aws:ec2:us-east-1:123:instance/i-1")
        );

        let json = r#"{"id": "i-1", "arn": "arn:..."}"#;
        let raw: RawNode = serde_json::from_str(json).unwrap();
        assert_eq!(raw.resolved_id(), Some("i-1"));

        let raw: RawNode = serde_json::from_str("{}").unwrap();
        assert_eq!(raw.resolved_id(), None);
    }

    #[test]
    fn test_raw_node_type_fallback() {
        let json = r#"{"resource_type": "ec2", "label": "web"}"#;
        let raw: RawNode = serde_json::from_str(json).unwrap();
        assert_eq!(raw.resolved_type(), Some("ec2"));

        let json = r#"{"label": "web"}"#;
        let raw: RawNode = serde_json::from_str(json).unwrap();
        assert_eq!(raw.resolved_type(), Some("web"));
    }

    #[test]
    fn test_raw_edge_legacy_field_names() {
        let json = r#"{"from": "a", "to": "b", "edge_type": "actual_traffic"}"#;
        let raw: RawEdge = serde_json::from_str(json).unwrap();
        assert_eq!(raw.resolved_source(), Some("a"));
        assert_eq!(raw.resolved_target(), Some("b"));
        assert_eq!(raw.resolved_kind(), Some("actual_traffic"));

        // Newer field names win over legacy ones
        let json = r#"{"source": "x", "from": "a", "type": "trust", "relationship_type": "contains"}"#;
        let raw: RawEdge = serde_json::from_str(json).unwrap();
        assert_eq!(raw.resolved_source(), Some("x"));
        assert_eq!(raw.resolved_kind(), Some("trust"));
    }

    #[test]
    fn test_raw_graph_tolerates_unknown_fields_and_empty_payload() {
        let raw: RawGraph = serde_json::from_str(r#"{"nodes": [], "edges": []}"#).unwrap();
        assert!(raw.is_empty());
        assert!(raw.error.is_none());

        let json = r#"{"nodes": [{"id": "a", "shiny": true}], "edges": [], "error": "collector degraded"}"#;
        let raw: RawGraph = serde_json::from_str(json).unwrap();
        assert_eq!(raw.nodes.len(), 1);
        assert_eq!(raw.error.as_deref(), Some("collector degraded"));
    }

    #[test]
    fn test_raw_connections_shape() {
        let json = r#"{
            "connections": {
                "inbound": [
                    {
                        "relationship": {"relationship_type": "allowed_traffic", "port": 443},
                        "source": {"id": "sg-1", "type": "security_group"},
                        "target": {"arn": "arn:aws:ec2:i-9"}
                    }
                ],
                "outbound": []
            }
        }"#;
        let raw: RawConnections = serde_json::from_str(json).unwrap();
        assert_eq!(raw.connections.inbound.len(), 1);
        let entry = &raw.connections.inbound[0];
        assert_eq!(entry.relationship.resolved_kind(), Some("allowed_traffic"));
        assert_eq!(entry.relationship.port, Some(443));
        assert_eq!(entry.target.resolved_id(), Some("arn:aws:ec2:i-9"));
    }

    #[test]
    fn test_snapshot_lookup() {
        use crate::core::types::{NodeKind, RelationshipKind};
        let snapshot = Snapshot::new(
            vec![Node::new("a", NodeKind::Compute)],
            vec![Edge::with_kind("e-0", "a", "a", RelationshipKind::Unknown)],
        );
        assert_eq!(snapshot.node_count(), 1);
        assert_eq!(snapshot.edge_count(), 1);
        assert!(snapshot.node("a").is_some());
        assert!(snapshot.node("b").is_none());
        assert!(snapshot.edge("e-0").is_some());
        assert!(!snapshot.is_empty());
        assert!(Snapshot::default().is_empty());
    }
}
