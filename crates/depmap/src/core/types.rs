//! Core type definitions for dependency-graph processing
//!
//! This module contains the fundamental types used throughout depmap:
//! node categories, relationship kinds, and the node/edge data structures.

use std::fmt;

/// Category of an infrastructure resource node
///
/// Drives visual treatment (color/icon/shape) and containment eligibility.
/// Parsed from heterogeneous backend type strings with an `Unknown` fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum NodeKind {
    /// Compute resources: EC2 instances, Lambda functions, ECS services
    Compute,
    /// Object/block storage: S3 buckets, EBS volumes, EFS filesystems
    Storage,
    /// Managed databases: RDS, DynamoDB, ElastiCache
    Database,
    /// IAM principals and policies
    Identity,
    /// Network plumbing: load balancers, gateways, security groups
    Network,
    /// Endpoints outside the environment (the public internet, SaaS)
    External,
    /// A VPC grouping container
    Vpc,
    /// A Subnet grouping container
    Subnet,
    /// Anything the backend sent that we do not recognize
    #[default]
    Unknown,
}

impl NodeKind {
    /// Parse a raw backend type/label string into a node kind
    ///
    /// Tolerant by design: trimming and case folding are applied, and any
    /// unrecognized value maps to `Unknown` rather than failing.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ec2" | "ec2_instance" | "instance" | "lambda" | "lambda_function" | "ecs"
            | "ecs_service" | "compute" => NodeKind::Compute,
            "s3" | "s3_bucket" | "ebs" | "ebs_volume" | "efs" | "storage" => NodeKind::Storage,
            "rds" | "rds_instance" | "dynamodb" | "dynamodb_table" | "elasticache"
            | "database" => NodeKind::Database,
            "iam_role" | "iam_user" | "iam_policy" | "role" | "identity" => NodeKind::Identity,
            "elb" | "alb" | "nlb" | "load_balancer" | "nat_gateway" | "internet_gateway"
            | "security_group" | "network" => NodeKind::Network,
            "external" | "internet" | "external_service" => NodeKind::External,
            "vpc" => NodeKind::Vpc,
            "subnet" => NodeKind::Subnet,
            _ => NodeKind::Unknown,
        }
    }

    /// Returns true if nodes of this kind may contain other nodes
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Vpc | NodeKind::Subnet)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Compute => write!(f, "compute"),
            NodeKind::Storage => write!(f, "storage"),
            NodeKind::Database => write!(f, "database"),
            NodeKind::Identity => write!(f, "identity"),
            NodeKind::Network => write!(f, "network"),
            NodeKind::External => write!(f, "external"),
            NodeKind::Vpc => write!(f, "vpc"),
            NodeKind::Subnet => write!(f, "subnet"),
            NodeKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Semantic category of an edge between two nodes
///
/// The backend has evolved its type strings over time; `from_raw` is a
/// case-sensitive exact-match lookup over a fixed table with an `Unknown`
/// fallback, so classification is total over all inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum RelationshipKind {
    /// Empirically observed communication (flow logs, traffic mirrors)
    VerifiedTraffic,
    /// Communication permitted by configuration (security groups, NACLs)
    ConfiguredAllowance,
    /// IAM trust/assume-role relationship
    TrustRelationship,
    /// VPC/Subnet membership, distinct from traffic
    Containment,
    /// Unrecognized backend type string
    #[default]
    Unknown,
}

/// Exact-match lookup table from raw backend type strings to kinds
///
/// Matching is deliberately case-sensitive: the backend emits these tokens
/// verbatim, and a casing mismatch indicates a different producer rather
/// than a variant spelling.
const RELATIONSHIP_TABLE: &[(&str, RelationshipKind)] = &[
    ("actual_traffic", RelationshipKind::VerifiedTraffic),
    ("verified_traffic", RelationshipKind::VerifiedTraffic),
    ("observed_traffic", RelationshipKind::VerifiedTraffic),
    ("allowed_traffic", RelationshipKind::ConfiguredAllowance),
    ("configured_allowance", RelationshipKind::ConfiguredAllowance),
    ("security_group_allowance", RelationshipKind::ConfiguredAllowance),
    ("trust", RelationshipKind::TrustRelationship),
    ("trust_relationship", RelationshipKind::TrustRelationship),
    ("assume_role", RelationshipKind::TrustRelationship),
    ("contains", RelationshipKind::Containment),
    ("containment", RelationshipKind::Containment),
    ("belongs_to", RelationshipKind::Containment),
];

impl RelationshipKind {
    /// Classify a raw backend type string
    ///
    /// Never panics and never returns an out-of-vocabulary value; anything
    /// not in the table (including the empty string) is `Unknown`.
    pub fn from_raw(raw: &str) -> Self {
        RELATIONSHIP_TABLE
            .iter()
            .find(|(token, _)| *token == raw)
            .map(|(_, kind)| *kind)
            .unwrap_or(RelationshipKind::Unknown)
    }

    /// Returns true for edges carrying empirically observed traffic
    pub fn is_verified(&self) -> bool {
        matches!(self, RelationshipKind::VerifiedTraffic)
    }

    /// Returns true for structural/declarative edges (trust, containment)
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            RelationshipKind::TrustRelationship | RelationshipKind::Containment
        )
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipKind::VerifiedTraffic => write!(f, "verified-traffic"),
            RelationshipKind::ConfiguredAllowance => write!(f, "configured-allowance"),
            RelationshipKind::TrustRelationship => write!(f, "trust-relationship"),
            RelationshipKind::Containment => write!(f, "containment"),
            RelationshipKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A node in the dependency graph with all its metadata
///
/// Positions are not part of a node: they are owned by the layout output,
/// so a node compares equal across layout runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable unique identifier within one snapshot
    pub id: String,
    /// Resource category
    pub kind: NodeKind,
    /// Human-readable label; falls back to `id` when the backend omits one
    pub name: String,
    /// Containing node id (VPC or Subnet); at most one level of nesting
    pub parent: Option<String>,
    /// Risk/posture indicator in [0, 100]; `None` means unknown, not zero
    pub score: Option<f64>,
    /// Raw VPC attachment hint carried through for containment resolution
    pub vpc_ref: Option<String>,
    /// Raw Subnet attachment hint carried through for containment resolution
    pub subnet_ref: Option<String>,
}

impl Node {
    /// Create a new node; the name defaults to the id
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            parent: None,
            score: None,
            vpc_ref: None,
            subnet_ref: None,
        }
    }

    /// Create a new node with an explicit display name
    pub fn with_name(id: impl Into<String>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new(id, kind)
        }
    }

    /// Returns true if this node may contain other nodes
    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }
}

/// Optional wire-level attributes attached to an edge
///
/// Each field is independently absent-tolerant; a verified-traffic edge
/// with no stats still renders traffic-styled with unknown counts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EdgeAttributes {
    /// Transport protocol ("tcp", "udp", ...)
    pub protocol: Option<String>,
    /// Destination port
    pub port: Option<u16>,
    /// Observed hit count
    pub hits: Option<u64>,
    /// Last-seen timestamp as reported by the backend
    pub last_seen: Option<String>,
    /// Observed byte count
    pub bytes: Option<u64>,
}

/// A directed relationship between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Unique within one snapshot; synthesized from index if the backend omits one
    pub id: String,
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Semantic category driving visual treatment and filtering
    pub kind: RelationshipKind,
    /// Optional wire-level stats
    pub attrs: EdgeAttributes,
}

impl Edge {
    /// Create a new edge with default (unknown) relationship kind
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind: RelationshipKind::Unknown,
            attrs: EdgeAttributes::default(),
        }
    }

    /// Create a new edge with a specific relationship kind
    pub fn with_kind(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: RelationshipKind,
    ) -> Self {
        Self {
            kind,
            ..Self::new(id, source, target)
        }
    }

    /// Returns true if this edge touches the given node id
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// Given one endpoint, return the other; `None` if the id is not an endpoint
    pub fn other_endpoint(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// A 2D position in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let (dx, dy) = (other.x - self.x, other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns true if both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned rectangle (container regions, canvas bounds)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point of the rectangle
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Returns a rectangle grown by `pad` on every side
    pub fn expanded(&self, pad: f64) -> Rect {
        Rect::new(
            self.x - pad,
            self.y - pad,
            self.width + 2.0 * pad,
            self.height + 2.0 * pad,
        )
    }

    /// Returns true if the point lies inside (inclusive) the rectangle
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}
