//! Terminal colorization for scene listings
//!
//! Applies ANSI escape codes to node and relationship tags using crossterm.

use crossterm::style::{Color, Stylize};

use depmap::core::{NodeKind, RelationshipKind};

/// Terminal color for one node kind
///
/// Containers render dim, compute and databases get the warm colors the
/// eye lands on first, and unknown kinds stay uncolored.
fn kind_color(kind: NodeKind) -> Option<Color> {
    match kind {
        NodeKind::Compute => Some(Color::Yellow),
        NodeKind::Database => Some(Color::Magenta),
        NodeKind::Storage => Some(Color::Green),
        NodeKind::Identity => Some(Color::Cyan),
        NodeKind::Network => Some(Color::Blue),
        NodeKind::External => Some(Color::Red),
        NodeKind::Vpc | NodeKind::Subnet => Some(Color::DarkGrey),
        NodeKind::Unknown => None,
    }
}

/// Terminal color for one relationship kind, mirroring the canvas palette
fn relationship_color(kind: RelationshipKind) -> Option<Color> {
    match kind {
        RelationshipKind::VerifiedTraffic => Some(Color::Cyan),
        RelationshipKind::ConfiguredAllowance => Some(Color::Grey),
        RelationshipKind::TrustRelationship => Some(Color::Magenta),
        RelationshipKind::Containment => Some(Color::DarkGrey),
        RelationshipKind::Unknown => None,
    }
}

/// Bracketed node-kind tag, colorized when enabled
pub fn paint_kind(kind: NodeKind, colorize: bool) -> String {
    let tag = format!("[{}]", kind);
    match kind_color(kind).filter(|_| colorize) {
        Some(color) => format!("{}", tag.with(color)),
        None => tag,
    }
}

/// Relationship-kind tag, colorized when enabled
pub fn paint_relationship(kind: RelationshipKind, colorize: bool) -> String {
    let tag = kind.to_string();
    match relationship_color(kind).filter(|_| colorize) {
        Some(color) => format!("{}", tag.with(color)),
        None => tag,
    }
}
