//! Depmap - Layout engine for AWS dependency maps
//!
//! A library that turns raw dependency-map payloads into renderable scenes:
//! nodes normalized, VPC/subnet containment resolved, positions computed by
//! a force-directed simulation, and edges classified by relationship kind.
//!
//! # Quick Start
//!
//! ```rust
//! use depmap::scene_from_json;
//!
//! let payload = r#"{
//!     "nodes": [
//!         {"id": "i-1", "type": "ec2", "subnet_id": "subnet-a"},
//!         {"id": "db-1", "type": "rds", "subnet_id": "subnet-a"}
//!     ],
//!     "edges": [
//!         {"source": "i-1", "target": "db-1", "type": "actual_traffic"}
//!     ]
//! }"#;
//!
//! let scene = scene_from_json(payload).unwrap();
//! assert_eq!(scene.snapshot.node_count(), 3); // subnet-a is synthesized
//! assert!(scene.layout.position("i-1").is_some());
//! ```
//!
//! # Advanced Usage
//!
//! For more control, run the pipeline stages yourself:
//!
//! ```rust
//! use depmap::prelude::*;
//!
//! let raw: RawGraph = serde_json::from_str(
//!     r#"{"nodes": [{"id": "a", "type": "ec2"}], "edges": []}"#,
//! ).unwrap();
//!
//! let pipeline = ScenePipeline::with_layout(ForceLayout::with_config(LayoutConfig {
//!     iterations: 120,
//!     ..LayoutConfig::default()
//! }));
//! let scene = pipeline.build(&raw);
//!
//! let mut controller = InteractionController::new();
//! controller.select_node(&scene, "a");
//! assert!(!controller.selection().is_idle());
//! ```

pub mod client;
pub mod core;
pub mod graph;

pub use crate::core::*;
pub use graph::{scene_from_json, Scene, ScenePipeline};

/// Build a scene from a decoded payload with default pipeline settings
///
/// This is the simplest way to go from backend data to renderable geometry.
pub fn build_scene(raw: &RawGraph) -> Scene {
    ScenePipeline::new().build(raw)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{ApiClient, FetchCoordinator, Poller};
    pub use crate::core::{
        Edge, MapError, Node, NodeKind, Point, RawConnections, RawGraph, Rect,
        RelationshipKind, Snapshot,
    };
    pub use crate::graph::{
        style_for, EdgeStyle, ForceLayout, InteractionController, InteractionEvent,
        LayoutConfig, LayoutResult, RenderSurface, Scene, ScenePipeline, Selection,
        ViewTransform,
    };
}
