//! Raw record normalization
//!
//! Converts heterogeneous backend node/edge records into the uniform
//! internal model: stable ids, parsed kinds, absent-tolerant attributes.
//! Pure over its input, deterministic, and never aborted by a single bad
//! record; malformed records are skipped and counted.

use std::collections::HashSet;

use tracing::{debug, span, trace, warn, Level};

use crate::core::{Edge, EdgeAttributes, Node, NodeKind, RawGraph, RelationshipKind};

/// Output of one normalization pass
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Node records dropped (duplicate ids)
    pub skipped_nodes: usize,
    /// Edge records dropped (missing endpoints)
    pub skipped_edges: usize,
}

/// Normalize a raw backend payload into uniform nodes and edges
///
/// Per-record policy:
/// - a node with no derivable id gets a synthesized `node-{index}` placeholder;
/// - a node whose id duplicates an earlier one is skipped (first wins);
/// - an edge missing either endpoint is skipped;
/// - an edge with no id gets a synthesized `edge-{index}` placeholder;
/// - unrecognized type strings map to the `Unknown` kinds, never an error.
///
/// Edge endpoints are not validated against the node set here; that happens
/// after containment resolution, once synthesized container nodes exist.
pub fn normalize(raw: &RawGraph) -> Normalized {
    let normalize_span = span!(
        Level::INFO,
        "normalize",
        raw_nodes = raw.nodes.len(),
        raw_edges = raw.edges.len()
    );
    let _enter = normalize_span.enter();

    trace!("Starting normalization");

    if let Some(error) = &raw.error {
        warn!(error = %error, "Backend reported a degraded response; using partial data");
    }

    let mut nodes = Vec::with_capacity(raw.nodes.len());
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut skipped_nodes = 0;

    for (index, record) in raw.nodes.iter().enumerate() {
        let id = match record.resolved_id() {
            Some(id) => id.to_string(),
            None => {
                trace!(index, "Node record has no id or arn; synthesizing placeholder");
                format!("node-{}", index)
            }
        };

        if !seen_ids.insert(id.clone()) {
            warn!(index, id = %id, "Duplicate node id; keeping first occurrence");
            skipped_nodes += 1;
            continue;
        }

        let kind = record
            .resolved_type()
            .map(NodeKind::from_raw)
            .unwrap_or_default();
        let name = record
            .resolved_name()
            .map(str::to_string)
            .unwrap_or_else(|| id.clone());
        // Out-of-range scores are backend bugs; clamp rather than drop the node.
        let score = record.score.map(|s| s.clamp(0.0, 100.0));

        nodes.push(Node {
            id,
            kind,
            name,
            parent: None,
            score,
            vpc_ref: non_empty(record.vpc_id.as_deref()),
            subnet_ref: non_empty(record.subnet_id.as_deref()),
        });
    }

    let mut edges = Vec::with_capacity(raw.edges.len());
    let mut skipped_edges = 0;

    for (index, record) in raw.edges.iter().enumerate() {
        let (source, target) = match (record.resolved_source(), record.resolved_target()) {
            (Some(s), Some(t)) => (s.to_string(), t.to_string()),
            _ => {
                debug!(index, "Edge record missing an endpoint; skipping");
                skipped_edges += 1;
                continue;
            }
        };

        let id = record
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("edge-{}", index));

        let kind = record
            .resolved_kind()
            .map(RelationshipKind::from_raw)
            .unwrap_or_default();

        edges.push(Edge {
            id,
            source,
            target,
            kind,
            attrs: EdgeAttributes {
                protocol: non_empty(record.protocol.as_deref()),
                port: record.port,
                hits: record.hits,
                last_seen: non_empty(record.last_seen.as_deref()),
                bytes: record.bytes,
            },
        });
    }

    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        skipped_nodes,
        skipped_edges,
        "Normalization completed"
    );

    Normalized {
        nodes,
        edges,
        skipped_nodes,
        skipped_edges,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RawEdge, RawNode};

    fn graph(nodes: Vec<RawNode>, edges: Vec<RawEdge>) -> RawGraph {
        RawGraph {
            nodes,
            edges,
            error: None,
        }
    }

    #[test]
    fn test_empty_graph_normalizes_to_empty() {
        let result = normalize(&RawGraph::default());
        assert!(result.nodes.is_empty());
        assert!(result.edges.is_empty());
        assert_eq!(result.skipped_nodes, 0);
        assert_eq!(result.skipped_edges, 0);
    }

    #[test]
    fn test_node_id_priority_and_placeholder() {
        let raw = graph(
            vec![
                RawNode {
                    id: Some("i-1".into()),
                    arn: Some("arn:ignored".into()),
                    ..Default::default()
                },
                RawNode {
                    arn: Some("arn:aws:s3:::bucket".into()),
                    ..Default::default()
                },
                RawNode::default(),
            ],
            vec![],
        );
        let result = normalize(&raw);
        assert_eq!(result.nodes[0].id, "i-1");
        assert_eq!(result.nodes[1].id, "arn:aws:s3:::bucket");
        assert_eq!(result.nodes[2].id, "node-2");
    }

    #[test]
    fn test_duplicate_node_ids_first_wins() {
        let raw = graph(
            vec![
                RawNode {
                    id: Some("a".into()),
                    name: Some("first".into()),
                    ..Default::default()
                },
                RawNode {
                    id: Some("a".into()),
                    name: Some("second".into()),
                    ..Default::default()
                },
            ],
            vec![],
        );
        let result = normalize(&raw);
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].name, "first");
        assert_eq!(result.skipped_nodes, 1);
    }

    #[test]
    fn test_name_falls_back_to_id() {
        let raw = graph(
            vec![RawNode {
                id: Some("i-9".into()),
                ..Default::default()
            }],
            vec![],
        );
        let result = normalize(&raw);
        assert_eq!(result.nodes[0].name, "i-9");
    }

    #[test]
    fn test_unknown_type_never_fails() {
        let raw = graph(
            vec![RawNode {
                id: Some("x".into()),
                node_type: Some("hologram".into()),
                ..Default::default()
            }],
            vec![],
        );
        let result = normalize(&raw);
        assert_eq!(result.nodes[0].kind, NodeKind::Unknown);
    }

    #[test]
    fn test_score_clamped_to_range() {
        let raw = graph(
            vec![
                RawNode {
                    id: Some("a".into()),
                    score: Some(150.0),
                    ..Default::default()
                },
                RawNode {
                    id: Some("b".into()),
                    score: Some(-3.0),
                    ..Default::default()
                },
                RawNode {
                    id: Some("c".into()),
                    ..Default::default()
                },
            ],
            vec![],
        );
        let result = normalize(&raw);
        assert_eq!(result.nodes[0].score, Some(100.0));
        assert_eq!(result.nodes[1].score, Some(0.0));
        assert_eq!(result.nodes[2].score, None);
    }

    #[test]
    fn test_edge_missing_endpoint_skipped_not_errored() {
        let raw = graph(
            vec![],
            vec![
                RawEdge {
                    source: Some("a".into()),
                    ..Default::default()
                },
                RawEdge {
                    from: Some("a".into()),
                    to: Some("b".into()),
                    edge_type: Some("actual_traffic".into()),
                    ..Default::default()
                },
            ],
        );
        let result = normalize(&raw);
        assert_eq!(result.edges.len(), 1);
        assert_eq!(result.skipped_edges, 1);
        assert_eq!(result.edges[0].kind, RelationshipKind::VerifiedTraffic);
    }

    #[test]
    fn test_edge_id_synthesized_from_index() {
        let raw = graph(
            vec![],
            vec![
                RawEdge {
                    id: Some("e-custom".into()),
                    source: Some("a".into()),
                    target: Some("b".into()),
                    ..Default::default()
                },
                RawEdge {
                    source: Some("b".into()),
                    target: Some("c".into()),
                    ..Default::default()
                },
            ],
        );
        let result = normalize(&raw);
        assert_eq!(result.edges[0].id, "e-custom");
        assert_eq!(result.edges[1].id, "edge-1");
    }

    #[test]
    fn test_verified_traffic_without_stats_degrades_gracefully() {
        let raw = graph(
            vec![],
            vec![RawEdge {
                source: Some("a".into()),
                target: Some("b".into()),
                edge_type: Some("verified_traffic".into()),
                ..Default::default()
            }],
        );
        let result = normalize(&raw);
        let edge = &result.edges[0];
        assert_eq!(edge.kind, RelationshipKind::VerifiedTraffic);
        assert!(edge.attrs.hits.is_none());
        assert!(edge.attrs.last_seen.is_none());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let raw = graph(
            vec![
                RawNode {
                    id: Some("a".into()),
                    node_type: Some("ec2".into()),
                    ..Default::default()
                },
                RawNode {
                    arn: Some("arn:x".into()),
                    ..Default::default()
                },
            ],
            vec![RawEdge {
                source: Some("a".into()),
                target: Some("arn:x".into()),
                edge_type: Some("trust".into()),
                ..Default::default()
            }],
        );
        let first = normalize(&raw);
        let second = normalize(&raw);
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.edges, second.edges);
    }
}
