//! Interaction state
//!
//! Selection, neighborhood dimming, hit testing, and pan/zoom over a built
//! scene. The controller never mutates scene data; dimming and highlighting
//! are presentation flags derived from the current selection, and drill-in
//! is an output event handed to an external collaborator.

use std::collections::HashSet;

use tracing::trace;

use super::pipeline::Scene;
use crate::core::{NodeKind, Point};

/// World-space radius within which a pointer hits a node
pub const HIT_RADIUS: f64 = 12.0;
/// World-space distance within which a pointer hits an edge segment
pub const EDGE_HIT_DISTANCE: f64 = 6.0;

/// Zoom factor bounds enforced by [`InteractionController::zoom_at`]
pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 5.0;

/// Current selection; at most one element at a time
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Idle,
    Node(String),
    Edge(String),
}

impl Selection {
    pub fn is_idle(&self) -> bool {
        matches!(self, Selection::Idle)
    }
}

/// Output events for external collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEvent {
    /// Drill-in to the resource-detail view
    DrillIn {
        id: String,
        kind: NodeKind,
        name: String,
    },
    /// Manual or timer-driven refresh was requested
    RefreshRequested,
}

/// Pan/zoom state mapping screen coordinates to graph coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            k: 1.0,
        }
    }
}

/// Selection and viewport state for one graph view
///
/// Owns only interaction state; scene data is passed in per call and flows
/// one way. Selecting a new element always clears the previous selection
/// first, so no two elements are ever simultaneously selected.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    selection: Selection,
    highlighted_nodes: HashSet<String>,
    highlighted_edges: HashSet<String>,
    transform: ViewTransform,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Select a node and highlight its immediate neighborhood
    ///
    /// An id not present in the scene clears the selection instead.
    pub fn select_node(&mut self, scene: &Scene, id: &str) {
        self.clear();
        if scene.snapshot.node(id).is_none() {
            return;
        }
        trace!(id, "Node selected");
        let (nodes, edges) = scene.node_neighborhood(id);
        self.selection = Selection::Node(id.to_string());
        self.highlighted_nodes = nodes;
        self.highlighted_edges = edges;
    }

    /// Select an edge and highlight its two endpoints
    pub fn select_edge(&mut self, scene: &Scene, id: &str) {
        self.clear();
        if scene.snapshot.edge(id).is_none() {
            return;
        }
        trace!(id, "Edge selected");
        let (nodes, edges) = scene.edge_neighborhood(id);
        self.selection = Selection::Edge(id.to_string());
        self.highlighted_nodes = nodes;
        self.highlighted_edges = edges;
    }

    /// Clear the selection and all dimming/highlighting flags
    pub fn clear(&mut self) {
        self.selection = Selection::Idle;
        self.highlighted_nodes.clear();
        self.highlighted_edges.clear();
    }

    /// Called when a new snapshot replaces the old one; selection and
    /// highlights refer to the dead snapshot and must not leak across.
    /// The viewport is kept so a refresh does not jump the camera.
    pub fn reset_for_new_snapshot(&mut self) {
        self.clear();
    }

    /// Presentation flag: dim this node while something else is selected
    pub fn is_node_dimmed(&self, id: &str) -> bool {
        !self.selection.is_idle() && !self.highlighted_nodes.contains(id)
    }

    /// Presentation flag: dim this edge while something else is selected
    pub fn is_edge_dimmed(&self, id: &str) -> bool {
        !self.selection.is_idle() && !self.highlighted_edges.contains(id)
    }

    /// Map screen coordinates to graph coordinates through the transform
    pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
        Point::new(
            (sx - self.transform.x) / self.transform.k,
            (sy - self.transform.y) / self.transform.k,
        )
    }

    /// Topmost leaf node under the pointer, if any
    ///
    /// Containers are regions, not point targets; they are not hit-tested
    /// here. Later nodes win ties so the draw order matches the hit order.
    pub fn node_at(&self, scene: &Scene, sx: f64, sy: f64) -> Option<String> {
        let p = self.screen_to_graph(sx, sy);
        let mut found = None;
        for node in scene.snapshot.nodes.iter().filter(|n| !n.is_container()) {
            if let Some(pos) = scene.layout.position(&node.id) {
                let (dx, dy) = (pos.x - p.x, pos.y - p.y);
                if dx * dx + dy * dy <= HIT_RADIUS * HIT_RADIUS {
                    found = Some(node.id.clone());
                }
            }
        }
        found
    }

    /// Edge whose segment passes under the pointer, if any
    pub fn edge_at(&self, scene: &Scene, sx: f64, sy: f64) -> Option<String> {
        let p = self.screen_to_graph(sx, sy);
        let mut found = None;
        for edge in &scene.snapshot.edges {
            let (Some(a), Some(b)) = (
                scene.layout.position(&edge.source),
                scene.layout.position(&edge.target),
            ) else {
                continue;
            };
            if point_segment_distance(&p, &a, &b) <= EDGE_HIT_DISTANCE {
                found = Some(edge.id.clone());
            }
        }
        found
    }

    /// Pointer selection protocol: node first, then edge, then background
    /// (which clears). Always leaves at most one element selected.
    pub fn pointer_select(&mut self, scene: &Scene, sx: f64, sy: f64) {
        if let Some(id) = self.node_at(scene, sx, sy) {
            self.select_node(scene, &id);
        } else if let Some(id) = self.edge_at(scene, sx, sy) {
            self.select_edge(scene, &id);
        } else {
            self.clear();
        }
    }

    /// Double-activation on a node: emits the drill-in event for the
    /// resource-detail view. Not a state transition; selection is untouched.
    pub fn activate(&self, scene: &Scene, id: &str) -> Option<InteractionEvent> {
        scene.snapshot.node(id).map(|node| InteractionEvent::DrillIn {
            id: node.id.clone(),
            kind: node.kind,
            name: node.name.clone(),
        })
    }

    /// Manual refresh affordance
    pub fn request_refresh(&self) -> InteractionEvent {
        InteractionEvent::RefreshRequested
    }

    /// Pan the viewport by a screen-space delta
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.transform.x += dx;
        self.transform.y += dy;
    }

    /// Zoom by `factor` keeping the graph point under the cursor fixed
    pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
        let k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let scale = k / self.transform.k;
        self.transform.x = sx - (sx - self.transform.x) * scale;
        self.transform.y = sy - (sy - self.transform.y) * scale;
        self.transform.k = k;
    }
}

/// Distance from a point to the segment a-b
fn point_segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len2 = abx * abx + aby * aby;
    if len2 < 1e-12 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0);
    p.distance(&Point::new(a.x + t * abx, a.y + t * aby))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::pipeline::ScenePipeline;
    use crate::core::{RawEdge, RawGraph, RawNode};

    fn scene() -> Scene {
        let raw = RawGraph {
            nodes: vec![
                RawNode {
                    id: Some("a".into()),
                    node_type: Some("ec2".into()),
                    name: Some("web".into()),
                    ..Default::default()
                },
                RawNode {
                    id: Some("b".into()),
                    node_type: Some("rds".into()),
                    ..Default::default()
                },
                RawNode {
                    id: Some("c".into()),
                    node_type: Some("s3".into()),
                    ..Default::default()
                },
            ],
            edges: vec![RawEdge {
                id: Some("e-ab".into()),
                source: Some("a".into()),
                target: Some("b".into()),
                edge_type: Some("actual_traffic".into()),
                ..Default::default()
            }],
            error: None,
        };
        ScenePipeline::new().build(&raw)
    }

    #[test]
    fn test_select_node_dims_outside_neighborhood() {
        let scene = scene();
        let mut ctl = InteractionController::new();
        ctl.select_node(&scene, "a");
        assert_eq!(*ctl.selection(), Selection::Node("a".into()));
        assert!(!ctl.is_node_dimmed("a"));
        assert!(!ctl.is_node_dimmed("b"));
        assert!(ctl.is_node_dimmed("c"));
        assert!(!ctl.is_edge_dimmed("e-ab"));
    }

    #[test]
    fn test_select_edge_highlights_endpoints_only() {
        let scene = scene();
        let mut ctl = InteractionController::new();
        ctl.select_edge(&scene, "e-ab");
        assert_eq!(*ctl.selection(), Selection::Edge("e-ab".into()));
        assert!(!ctl.is_node_dimmed("a"));
        assert!(!ctl.is_node_dimmed("b"));
        assert!(ctl.is_node_dimmed("c"));
    }

    #[test]
    fn test_single_selection_invariant() {
        let scene = scene();
        let mut ctl = InteractionController::new();
        ctl.select_node(&scene, "a");
        ctl.select_edge(&scene, "e-ab");
        assert_eq!(*ctl.selection(), Selection::Edge("e-ab".into()));
        ctl.select_node(&scene, "b");
        assert_eq!(*ctl.selection(), Selection::Node("b".into()));
        ctl.clear();
        assert!(ctl.selection().is_idle());
        assert!(!ctl.is_node_dimmed("c"));
    }

    #[test]
    fn test_unknown_ids_clear_selection() {
        let scene = scene();
        let mut ctl = InteractionController::new();
        ctl.select_node(&scene, "a");
        ctl.select_node(&scene, "ghost");
        assert!(ctl.selection().is_idle());
    }

    #[test]
    fn test_snapshot_replacement_clears_selection() {
        let scene = scene();
        let mut ctl = InteractionController::new();
        ctl.zoom_at(100.0, 100.0, 2.0);
        ctl.select_node(&scene, "a");
        ctl.reset_for_new_snapshot();
        assert!(ctl.selection().is_idle());
        assert!(!ctl.is_node_dimmed("c"));
        // Viewport survives the refresh
        assert!((ctl.transform().k - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_testing_nodes() {
        let scene = scene();
        let ctl = InteractionController::new();
        let pos = scene.layout.position("a").unwrap();
        assert_eq!(ctl.node_at(&scene, pos.x, pos.y), Some("a".to_string()));
        assert_eq!(
            ctl.node_at(&scene, pos.x + HIT_RADIUS * 0.9, pos.y),
            Some("a".to_string())
        );
        assert_eq!(ctl.node_at(&scene, -500.0, -500.0), None);
    }

    #[test]
    fn test_hit_testing_edges_at_midpoint() {
        let scene = scene();
        let ctl = InteractionController::new();
        let a = scene.layout.position("a").unwrap();
        let b = scene.layout.position("b").unwrap();
        let (mx, my) = ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        assert_eq!(ctl.edge_at(&scene, mx, my), Some("e-ab".to_string()));
    }

    #[test]
    fn test_pointer_select_background_clears() {
        let scene = scene();
        let mut ctl = InteractionController::new();
        let pos = scene.layout.position("a").unwrap();
        ctl.pointer_select(&scene, pos.x, pos.y);
        assert_eq!(*ctl.selection(), Selection::Node("a".into()));
        ctl.pointer_select(&scene, -500.0, -500.0);
        assert!(ctl.selection().is_idle());
    }

    #[test]
    fn test_activate_emits_drill_in() {
        let scene = scene();
        let ctl = InteractionController::new();
        let event = ctl.activate(&scene, "a").unwrap();
        assert_eq!(
            event,
            InteractionEvent::DrillIn {
                id: "a".into(),
                kind: NodeKind::Compute,
                name: "web".into(),
            }
        );
        assert!(ctl.activate(&scene, "ghost").is_none());
        assert_eq!(ctl.request_refresh(), InteractionEvent::RefreshRequested);
    }

    #[test]
    fn test_zoom_keeps_cursor_point_fixed() {
        let mut ctl = InteractionController::new();
        let before = ctl.screen_to_graph(200.0, 150.0);
        ctl.zoom_at(200.0, 150.0, 1.5);
        let after = ctl.screen_to_graph(200.0, 150.0);
        assert!(before.distance(&after) < 1e-9);
        // Zoom is clamped
        for _ in 0..100 {
            ctl.zoom_at(0.0, 0.0, 10.0);
        }
        assert!(ctl.transform().k <= MAX_ZOOM);
    }

    #[test]
    fn test_pan_shifts_world() {
        let mut ctl = InteractionController::new();
        ctl.pan_by(50.0, -20.0);
        let p = ctl.screen_to_graph(50.0, -20.0);
        assert!(p.distance(&Point::new(0.0, 0.0)) < 1e-9);
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((point_segment_distance(&Point::new(5.0, 3.0), &a, &b) - 3.0).abs() < 1e-9);
        assert!((point_segment_distance(&Point::new(-4.0, 0.0), &a, &b) - 4.0).abs() < 1e-9);
        assert!((point_segment_distance(&Point::new(1.0, 1.0), &a, &a) - 2f64.sqrt()).abs() < 1e-9);
    }
}
