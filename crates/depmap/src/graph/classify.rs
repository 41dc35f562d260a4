//! Edge presentation styling
//!
//! Classification itself lives on `RelationshipKind::from_raw`; this module
//! maps each kind to its visual treatment through a static table so the
//! mapping can be unit-tested without any drawing surface. Traffic-edge
//! pulsing is a pure function of elapsed time, evaluated by the rendering
//! layer each frame; nothing here reads a clock.

use crate::core::RelationshipKind;

/// Visual treatment for one edge kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStyle {
    /// Stroke color as a CSS hex string
    pub color: &'static str,
    /// Dashed stroke marks structural/declarative relationships
    pub dashed: bool,
    /// Stroke width in canvas units
    pub width: f64,
    /// Animated (pulsing) stroke marks empirically observed traffic
    pub animated: bool,
}

/// Static style table keyed by relationship kind
///
/// `VerifiedTraffic` is visually loudest (widest, solid, animated) because
/// it is observed rather than merely configured. Trust and containment
/// render dashed to read as structure, not activity.
pub fn style_for(kind: RelationshipKind) -> EdgeStyle {
    match kind {
        RelationshipKind::VerifiedTraffic => EdgeStyle {
            color: "#4fc3f7",
            dashed: false,
            width: 2.5,
            animated: true,
        },
        RelationshipKind::ConfiguredAllowance => EdgeStyle {
            color: "#9e9e9e",
            dashed: false,
            width: 1.5,
            animated: false,
        },
        RelationshipKind::TrustRelationship => EdgeStyle {
            color: "#ba68c8",
            dashed: true,
            width: 1.5,
            animated: false,
        },
        RelationshipKind::Containment => EdgeStyle {
            color: "#607d8b",
            dashed: true,
            width: 1.0,
            animated: false,
        },
        RelationshipKind::Unknown => EdgeStyle {
            color: "#757575",
            dashed: true,
            width: 1.0,
            animated: false,
        },
    }
}

/// Pulse period for animated edges, in seconds
const PULSE_PERIOD: f64 = 1.6;

/// Opacity of an animated edge at `elapsed` seconds
///
/// Oscillates smoothly in [0.1, 1.0]; the renderer calls this once per
/// frame with its own clock, keeping the styling layer time-independent.
pub fn pulse_opacity(elapsed: f64) -> f64 {
    let phase = elapsed / PULSE_PERIOD * std::f64::consts::TAU;
    0.55 + 0.45 * phase.sin()
}
