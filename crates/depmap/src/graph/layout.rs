//! Force-directed layout
//!
//! Places leaf nodes via an iterative repulsion/attraction simulation with
//! simulated annealing, then derives container regions as the padded
//! bounding boxes of their children. All-pairs repulsion makes one run
//! O(rounds × nodes²); at the expected scale (hundreds of nodes) that is
//! the accepted ceiling and no spatial partitioning is attempted.

use std::collections::HashMap;

use tracing::{debug, info, span, trace, Level};
use unicode_width::UnicodeWidthStr;

use crate::core::{Edge, Node, NodeKind, Point, Rect};

/// Approximate rendered width of one label character, in canvas units
const LABEL_CHAR_WIDTH: f64 = 8.0;

/// Layout configuration
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Simulation rounds; the fixed budget always terminates
    pub iterations: usize,
    /// Canvas width positions are clamped into
    pub width: f64,
    /// Canvas height positions are clamped into
    pub height: f64,
    /// Repulsion strength (force ∝ repulsion / distance²)
    pub repulsion: f64,
    /// Attraction strength (force ∝ attraction × distance per edge)
    pub attraction: f64,
    /// Per-round velocity multiplier, < 1 to prevent runaway motion
    pub damping: f64,
    /// Spacing of the deterministic seeding grid
    pub grid_spacing: f64,
    /// Padding added around container children when sizing regions
    pub region_padding: f64,
    /// Keep-out margin from the canvas border
    pub margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 70,
            width: 1600.0,
            height: 1000.0,
            repulsion: 6000.0,
            attraction: 0.02,
            damping: 0.85,
            grid_spacing: 120.0,
            region_padding: 40.0,
            margin: 30.0,
        }
    }
}

/// Layout output: per-node positions plus container regions
///
/// Every input node, containers included, receives a finite in-bounds
/// position. Regions exist only for container nodes.
#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    pub positions: HashMap<String, Point>,
    pub regions: HashMap<String, Rect>,
    pub width: f64,
    pub height: f64,
}

impl LayoutResult {
    /// Position of a node, if it was part of the layout input
    pub fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    /// Drawable region of a container node
    pub fn region(&self, id: &str) -> Option<Rect> {
        self.regions.get(id).copied()
    }
}

/// Force-directed layout engine
///
/// Pure with respect to its input: the same nodes and edges in the same
/// order always produce the same positions. The engine is an explicitly
/// constructed instance owned by its caller, never shared global state.
pub struct ForceLayout {
    config: LayoutConfig,
}

impl ForceLayout {
    pub fn new() -> Self {
        Self {
            config: LayoutConfig::default(),
        }
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn name(&self) -> &'static str {
        "force-directed"
    }

    pub fn version(&self) -> &'static str {
        "0.3.0"
    }

    /// Deterministic grid seed for the node at `index`
    fn grid_seed(&self, index: usize, total: usize) -> Point {
        let cols = (total.max(1) as f64).sqrt().ceil() as usize;
        let col = index % cols.max(1);
        let row = index / cols.max(1);
        Point::new(
            self.config.margin + col as f64 * self.config.grid_spacing,
            self.config.margin + row as f64 * self.config.grid_spacing,
        )
    }

    fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.config.margin, self.config.width - self.config.margin),
            p.y.clamp(self.config.margin, self.config.height - self.config.margin),
        )
    }

    /// Compute positions for all nodes and regions for containers
    ///
    /// Leaf nodes are simulated in absolute coordinates; container nodes do
    /// not participate as point masses. Each container's region is the
    /// bounding box of its children expanded by the configured padding,
    /// with a label-derived minimum size, so children are visually enclosed
    /// by construction. Edges touching containers exert no attraction.
    pub fn layout(&self, nodes: &[Node], edges: &[Edge]) -> LayoutResult {
        let layout_span = span!(
            Level::INFO,
            "layout",
            node_count = nodes.len(),
            edge_count = edges.len(),
            iterations = self.config.iterations
        );
        let _enter = layout_span.enter();

        trace!("Starting force-directed layout");

        if nodes.is_empty() {
            debug!("Empty node set, returning empty layout");
            return LayoutResult {
                width: self.config.width,
                height: self.config.height,
                ..Default::default()
            };
        }

        let leaves: Vec<&Node> = nodes.iter().filter(|n| !n.is_container()).collect();
        let containers: Vec<&Node> = nodes.iter().filter(|n| n.is_container()).collect();

        let index: HashMap<&str, usize> = leaves
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut positions: Vec<Point> = (0..leaves.len())
            .map(|i| self.grid_seed(i, leaves.len()))
            .collect();
        let mut velocities: Vec<Point> = vec![Point::default(); leaves.len()];

        // Edges where both endpoints are simulated leaves
        let springs: Vec<(usize, usize)> = edges
            .iter()
            .filter_map(|e| {
                let a = *index.get(e.source.as_str())?;
                let b = *index.get(e.target.as_str())?;
                (a != b).then_some((a, b))
            })
            .collect();

        let sim_span = span!(
            Level::DEBUG,
            "simulate",
            leaves = leaves.len(),
            springs = springs.len()
        );
        let _sim_enter = sim_span.enter();

        let rounds = self.config.iterations.max(1);
        for round in 0..rounds {
            // Annealing temperature: 1 at the first round, decaying to 0,
            // which settles oscillation within the fixed budget.
            let temperature = 1.0 - round as f64 / rounds as f64;
            let mut forces: Vec<Point> = vec![Point::default(); leaves.len()];

            // All-pairs repulsion
            for i in 0..leaves.len() {
                for j in (i + 1)..leaves.len() {
                    let (dx, dy) = separation(&positions, i, j);
                    let d2 = dx * dx + dy * dy;
                    let d = d2.sqrt();
                    let push = self.config.repulsion / d2 * temperature;
                    let (fx, fy) = (push * dx / d, push * dy / d);
                    forces[i].x -= fx;
                    forces[i].y -= fy;
                    forces[j].x += fx;
                    forces[j].y += fy;
                }
            }

            // Edge attraction
            for &(a, b) in &springs {
                let (dx, dy) = separation(&positions, a, b);
                let pull = self.config.attraction * temperature;
                let (fx, fy) = (pull * dx, pull * dy);
                forces[a].x += fx;
                forces[a].y += fy;
                forces[b].x -= fx;
                forces[b].y -= fy;
            }

            // Integration with damping and bounds clamping
            for i in 0..leaves.len() {
                velocities[i].x = (velocities[i].x + forces[i].x) * self.config.damping;
                velocities[i].y = (velocities[i].y + forces[i].y) * self.config.damping;
                positions[i] = self.clamp(Point::new(
                    positions[i].x + velocities[i].x,
                    positions[i].y + velocities[i].y,
                ));
            }
        }
        drop(_sim_enter);

        let mut result = LayoutResult {
            width: self.config.width,
            height: self.config.height,
            ..Default::default()
        };
        for (i, leaf) in leaves.iter().enumerate() {
            result.positions.insert(leaf.id.clone(), positions[i]);
        }

        // Container regions, subnets before VPCs so a VPC region can
        // enclose its subnets' regions as well as its direct children.
        let region_span = span!(Level::DEBUG, "container_regions", containers = containers.len());
        let _region_enter = region_span.enter();
        let mut seed_index = leaves.len();
        let ordered: Vec<&Node> = containers
            .iter()
            .filter(|c| c.kind == NodeKind::Subnet)
            .chain(containers.iter().filter(|c| c.kind != NodeKind::Subnet))
            .copied()
            .collect();
        for container in ordered {
            let region = self.container_region(container, nodes, &result, seed_index);
            result.positions.insert(container.id.clone(), region.center());
            result.regions.insert(container.id.clone(), region);
            seed_index += 1;
        }
        drop(_region_enter);

        info!(
            positioned = result.positions.len(),
            regions = result.regions.len(),
            "Layout completed"
        );
        result
    }

    /// Region for one container: children bounding box, padded, with a
    /// label-derived minimum size. A childless container sits at its own
    /// grid seed.
    fn container_region(
        &self,
        container: &Node,
        nodes: &[Node],
        partial: &LayoutResult,
        seed_index: usize,
    ) -> Rect {
        let label_width =
            UnicodeWidthStr::width(container.name.as_str()) as f64 * LABEL_CHAR_WIDTH;
        let min_width = label_width + 2.0 * self.config.region_padding;
        let min_height = 2.0 * self.config.region_padding;

        let mut bounds: Option<Rect> = None;
        for child in nodes.iter().filter(|n| n.parent.as_deref() == Some(&container.id)) {
            let child_rect = partial
                .regions
                .get(&child.id)
                .copied()
                .or_else(|| {
                    partial
                        .positions
                        .get(&child.id)
                        .map(|p| Rect::new(p.x, p.y, 0.0, 0.0))
                });
            if let Some(rect) = child_rect {
                bounds = Some(match bounds {
                    None => rect,
                    Some(acc) => union(acc, rect),
                });
            }
        }

        let rect = match bounds {
            Some(b) => b.expanded(self.config.region_padding),
            None => {
                // The seeding grid can outgrow the canvas; clamp like leaf
                // positions so the region center stays in bounds.
                let seed = self.clamp(self.grid_seed(seed_index, seed_index + 1));
                Rect::new(seed.x, seed.y, 0.0, 0.0)
            }
        };

        // Enforce the label-derived minimum, growing symmetrically
        let center = rect.center();
        let width = rect.width.max(min_width);
        let height = rect.height.max(min_height);
        Rect::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new()
    }
}

/// Displacement between two simulated nodes, with a deterministic nudge
/// for coincident positions so repulsion never divides by zero.
fn separation(positions: &[Point], i: usize, j: usize) -> (f64, f64) {
    let dx = positions[j].x - positions[i].x;
    let dy = positions[j].y - positions[i].y;
    if dx * dx + dy * dy < 1e-9 {
        // Index-based offset keeps the run reproducible without randomness
        ((j as f64 - i as f64) * 0.11, 0.07)
    } else {
        (dx, dy)
    }
}

fn union(a: Rect, b: Rect) -> Rect {
    let x0 = a.x.min(b.x);
    let y0 = a.y.min(b.y);
    let x1 = (a.x + a.width).max(b.x + b.width);
    let y1 = (a.y + a.height).max(b.y + b.height);
    Rect::new(x0, y0, x1 - x0, y1 - y0)
}
