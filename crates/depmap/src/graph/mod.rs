//! Graph processing pipeline
//!
//! Stages run in a fixed order over each snapshot: normalization,
//! containment resolution, force-directed layout, and edge styling. The
//! [`pipeline`] module wires them together; [`interact`] holds the
//! selection/viewport state machine that sits on top of a built scene.

pub mod classify;
pub mod containment;
pub mod interact;
pub mod layout;
pub mod normalize;
pub mod pipeline;

pub use classify::{pulse_opacity, style_for, EdgeStyle};
pub use containment::resolve_containment;
pub use interact::{
    InteractionController, InteractionEvent, Selection, ViewTransform, EDGE_HIT_DISTANCE,
    HIT_RADIUS, MAX_ZOOM, MIN_ZOOM,
};
pub use layout::{ForceLayout, LayoutConfig, LayoutResult};
pub use normalize::{normalize, Normalized};
pub use pipeline::{scene_from_json, RenderSurface, Scene, ScenePipeline};
