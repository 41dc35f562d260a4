//! Containment resolution
//!
//! Infers the VPC → Subnet → Resource nesting from node attachment hints
//! and containment-typed edges, synthesizing container nodes the backend
//! referenced but never sent. The result is an acyclic forest of depth at
//! most two: resources attach to a Subnet or VPC, Subnets attach to a VPC,
//! VPCs are roots.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, span, trace, Level};

use crate::core::{Edge, Node, NodeKind, RelationshipKind};

/// Resolve parent assignments and synthesize missing container nodes
///
/// Resolution order per node, first match wins:
/// 1. explicit attachment hint (`subnet_ref` before `vpc_ref` for plain
///    resources, since the more specific container wins);
/// 2. the first containment-typed edge connecting the node to a known
///    container of the wanted kind.
///
/// A node with no discoverable owner keeps `parent = None`; that is a
/// normal terminal state. Pre-existing parent values that reference a
/// missing or non-container node are likewise reset to `None`.
pub fn resolve_containment(mut nodes: Vec<Node>, edges: &[Edge]) -> Vec<Node> {
    let containment_span = span!(
        Level::INFO,
        "resolve_containment",
        node_count = nodes.len(),
        edge_count = edges.len()
    );
    let _enter = containment_span.enter();

    trace!("Starting containment resolution");

    // Container ids referenced by attachment hints but absent from the
    // node set; synthesized so layout can draw their regions.
    let known: BTreeSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let mut missing_vpcs: BTreeSet<String> = BTreeSet::new();
    let mut missing_subnets: BTreeSet<String> = BTreeSet::new();
    for node in &nodes {
        if let Some(vpc) = &node.vpc_ref {
            if !known.contains(vpc) {
                missing_vpcs.insert(vpc.clone());
            }
        }
        if let Some(subnet) = &node.subnet_ref {
            if !known.contains(subnet) {
                missing_subnets.insert(subnet.clone());
            }
        }
    }
    // An id referenced as both subnet and vpc is ambiguous; treat it as a
    // subnet (the more specific reading) and let its own vpc stay unknown.
    for id in &missing_subnets {
        missing_vpcs.remove(id);
    }

    let synthesized = missing_vpcs.len() + missing_subnets.len();
    for id in missing_vpcs {
        trace!(id = %id, "Synthesizing vpc container node");
        nodes.push(Node::new(id, NodeKind::Vpc));
    }
    for id in missing_subnets {
        trace!(id = %id, "Synthesizing subnet container node");
        nodes.push(Node::new(id, NodeKind::Subnet));
    }

    let kinds: HashMap<String, NodeKind> =
        nodes.iter().map(|n| (n.id.clone(), n.kind)).collect();
    let is_kind = |id: &str, kind: NodeKind| kinds.get(id).copied() == Some(kind);

    // First containment edge linking `id` to a container of `kind`,
    // accepting either edge orientation.
    let edge_owner = |id: &str, kind: NodeKind| -> Option<String> {
        edges
            .iter()
            .filter(|e| e.kind == RelationshipKind::Containment)
            .find_map(|e| {
                e.other_endpoint(id)
                    .filter(|other| is_kind(other, kind))
                    .map(str::to_string)
            })
    };

    let mut assigned = 0;
    for node in &mut nodes {
        let parent = match node.kind {
            NodeKind::Vpc => None,
            NodeKind::Subnet => node
                .vpc_ref
                .clone()
                .filter(|vpc| is_kind(vpc, NodeKind::Vpc))
                .or_else(|| edge_owner(&node.id, NodeKind::Vpc)),
            _ => node
                .subnet_ref
                .clone()
                .filter(|subnet| is_kind(subnet, NodeKind::Subnet))
                .or_else(|| edge_owner(&node.id, NodeKind::Subnet))
                .or_else(|| {
                    node.vpc_ref
                        .clone()
                        .filter(|vpc| is_kind(vpc, NodeKind::Vpc))
                })
                .or_else(|| edge_owner(&node.id, NodeKind::Vpc)),
        };
        if parent.is_some() {
            assigned += 1;
        }
        node.parent = parent;
    }

    debug!(
        synthesized_containers = synthesized,
        parents_assigned = assigned,
        "Containment resolution completed"
    );

    nodes
}
