//! Scene pipeline
//!
//! Wires the stages together: normalize → containment → endpoint pruning →
//! layout → styling. Output flows one way; no stage mutates a predecessor's
//! output, which is what keeps the single-threaded model tractable.
//!
//! The rendering surface stays behind [`RenderSurface`] so the pipeline is
//! independent of which concrete drawing backend consumes a scene.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use tracing::{debug, info, span, Level};

use super::classify::{style_for, EdgeStyle};
use super::containment::resolve_containment;
use super::layout::{ForceLayout, LayoutResult};
use super::normalize::normalize;
use crate::core::{MapError, RawGraph, Snapshot};

/// One fully processed snapshot: data, geometry, and edge styling
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub snapshot: Snapshot,
    pub layout: LayoutResult,
    /// Presentation descriptor per edge id
    pub styles: HashMap<String, EdgeStyle>,
    /// Records dropped during normalization and pruning, for diagnostics
    pub skipped_nodes: usize,
    pub skipped_edges: usize,
}

impl Scene {
    /// The immediate neighborhood of a node: itself plus directly connected
    /// nodes, and the incident edges. Everything outside it gets dimmed
    /// while the node is selected.
    pub fn node_neighborhood(&self, id: &str) -> (HashSet<String>, HashSet<String>) {
        let mut nodes = HashSet::new();
        let mut edges = HashSet::new();
        if self.snapshot.node(id).is_none() {
            return (nodes, edges);
        }
        nodes.insert(id.to_string());
        for edge in &self.snapshot.edges {
            if let Some(other) = edge.other_endpoint(id) {
                nodes.insert(other.to_string());
                edges.insert(edge.id.clone());
            }
        }
        (nodes, edges)
    }

    /// The neighborhood of an edge: just its two endpoints
    pub fn edge_neighborhood(&self, id: &str) -> (HashSet<String>, HashSet<String>) {
        let mut nodes = HashSet::new();
        let mut edges = HashSet::new();
        if let Some(edge) = self.snapshot.edge(id) {
            nodes.insert(edge.source.clone());
            nodes.insert(edge.target.clone());
            edges.insert(edge.id.clone());
        }
        (nodes, edges)
    }
}

/// Abstract drawing backend
///
/// The engine never calls a rendering library directly; a surface adapter
/// implements this trait and consumes complete scenes.
pub trait RenderSurface {
    /// Render one complete scene
    fn render(&mut self, scene: &Scene) -> Result<()>;

    /// Get the name of this surface
    fn name(&self) -> &'static str;

    /// Get the output format this surface produces
    fn format(&self) -> &'static str;
}

/// Builds scenes from raw backend payloads
///
/// Explicitly constructed and owned by the caller (typically the view
/// composition root), with no hidden global state.
pub struct ScenePipeline {
    layout: ForceLayout,
}

impl ScenePipeline {
    pub fn new() -> Self {
        Self {
            layout: ForceLayout::new(),
        }
    }

    pub fn with_layout(layout: ForceLayout) -> Self {
        Self { layout }
    }

    /// Run the full pipeline over one raw payload
    ///
    /// Total: malformed records degrade to skips, unknown types to
    /// fallbacks, and the layout budget always terminates, so every input
    /// yields a scene.
    pub fn build(&self, raw: &RawGraph) -> Scene {
        let build_span = span!(
            Level::INFO,
            "build_scene",
            raw_nodes = raw.nodes.len(),
            raw_edges = raw.edges.len()
        );
        let _enter = build_span.enter();

        let normalized = normalize(raw);
        let nodes = resolve_containment(normalized.nodes, &normalized.edges);

        // Endpoints must resolve against the final node set, synthesized
        // containers included; anything still dangling is dropped here.
        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let before = normalized.edges.len();
        let edges: Vec<_> = normalized
            .edges
            .into_iter()
            .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
            .collect();
        let pruned = before - edges.len();
        if pruned > 0 {
            debug!(pruned, "Dropped edges with unresolved endpoints");
        }

        let layout = self.layout.layout(&nodes, &edges);
        let styles = edges
            .iter()
            .map(|e| (e.id.clone(), style_for(e.kind)))
            .collect();

        let scene = Scene {
            snapshot: Snapshot::new(nodes, edges),
            layout,
            styles,
            skipped_nodes: normalized.skipped_nodes,
            skipped_edges: normalized.skipped_edges + pruned,
        };
        info!(
            nodes = scene.snapshot.node_count(),
            edges = scene.snapshot.edge_count(),
            skipped_nodes = scene.skipped_nodes,
            skipped_edges = scene.skipped_edges,
            "Scene built"
        );
        scene
    }
}

impl Default for ScenePipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a scene straight from a JSON payload string
///
/// Convenience entry point for callers holding a raw response body.
pub fn scene_from_json(text: &str) -> Result<Scene, MapError> {
    let raw: RawGraph = serde_json::from_str(text)?;
    Ok(ScenePipeline::new().build(&raw))
}
