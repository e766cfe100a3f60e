//! Graph data types for the node map
//!
//! Nodes live in insertion order in a vector with an id→index lookup map, so
//! every pass over the graph (and therefore the simulation) is deterministic.
//! Relationships are plain id strings; there are no object references between
//! nodes, which keeps rebuilds and removals trivial.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::Status;
use crate::error::{NodeMapError, Result};
use crate::viewport::BoundingBox;

/// Color constants (RGBA, normalized 0.0-1.0)
pub mod colors {
    /// Episode fallback when no project color is known: Indigo (#6366F1)
    pub const EPISODE: [f32; 4] = [0.388, 0.400, 0.945, 1.0];

    /// Task without status: Slate (#94A3B8)
    pub const TASK: [f32; 4] = [0.580, 0.639, 0.722, 1.0];

    /// Member without status: Teal (#14B8A6)
    pub const MEMBER: [f32; 4] = [0.078, 0.722, 0.651, 1.0];

    /// In progress: Blue (#3B82F6)
    pub const PROGRESS: [f32; 4] = [0.231, 0.510, 0.965, 1.0];

    /// Waiting: Gray (#6B7280)
    pub const WAITING: [f32; 4] = [0.420, 0.447, 0.502, 1.0];

    /// Done: Green (#22C55E)
    pub const DONE: [f32; 4] = [0.133, 0.773, 0.369, 1.0];

    /// In review: Amber (#F59E0B)
    pub const REVIEW: [f32; 4] = [0.961, 0.620, 0.043, 1.0];

    /// Working: Violet (#8B5CF6)
    pub const WORKING: [f32; 4] = [0.545, 0.361, 0.965, 1.0];

    /// Absent: Dark slate (#475569)
    pub const ABSENT: [f32; 4] = [0.278, 0.333, 0.412, 1.0];
}

/// Parse `#RRGGBB` or `#RRGGBBAA` into a normalized RGBA color
pub fn parse_hex_color(hex: &str) -> Result<[f32; 4]> {
    let digits = hex.trim().trim_start_matches('#');
    if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
        return Err(NodeMapError::InvalidColor(hex.to_string()));
    }

    let mut rgba = [1.0_f32; 4];
    for (i, channel) in rgba.iter_mut().enumerate().take(digits.len() / 2) {
        let byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|_| NodeMapError::InvalidColor(hex.to_string()))?;
        *channel = f32::from(byte) / 255.0;
    }
    Ok(rgba)
}

/// Semantic category of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Episode,
    Task,
    Member,
}

impl NodeKind {
    /// Hit-test and draw radius in model units
    pub fn radius(&self) -> f64 {
        match self {
            NodeKind::Episode => 50.0,
            NodeKind::Task => 32.0,
            NodeKind::Member => 28.0,
        }
    }

    /// Color used when nothing more specific is known
    pub fn default_color(&self) -> [f32; 4] {
        match self {
            NodeKind::Episode => colors::EPISODE,
            NodeKind::Task => colors::TASK,
            NodeKind::Member => colors::MEMBER,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Episode => "episode",
            NodeKind::Task => "task",
            NodeKind::Member => "member",
        };
        f.write_str(name)
    }
}

/// Relationship carried by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Episode contains task
    Contains,
    /// Member is assigned to task
    Assigned,
    /// Task depends on another task
    Dependency,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeKind::Contains => "contains",
            EdgeKind::Assigned => "assigned",
            EdgeKind::Dependency => "dependency",
        };
        f.write_str(name)
    }
}

/// A vertex of the node map
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// Unique identifier (the entity id it was derived from)
    pub id: String,
    pub kind: NodeKind,
    /// Human-readable label for display
    pub label: String,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) vx: f64,
    pub(crate) vy: f64,
    /// RGBA color as normalized floats
    pub color: [f32; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Completion percentage, episodes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    pub(crate) pinned: bool,
    #[serde(skip)]
    last_good: (f64, f64),
}

impl Node {
    /// Create a node at rest at the given model position
    pub fn new(
        id: impl Into<String>,
        kind: NodeKind,
        label: impl Into<String>,
        x: f64,
        y: f64,
    ) -> Self {
        let (x, y) = if x.is_finite() && y.is_finite() {
            (x, y)
        } else {
            (0.0, 0.0)
        };
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            color: kind.default_color(),
            status: None,
            progress: None,
            pinned: false,
            last_good: (x, y),
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: Option<Status>) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Option<f32>) -> Self {
        self.progress = progress;
        self
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.vx, self.vy)
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Take the node out of the simulation. Velocity is zeroed immediately.
    pub fn pin(&mut self) {
        self.pinned = true;
        self.vx = 0.0;
        self.vy = 0.0;
    }

    /// Hand the node back to the simulation, at rest
    pub fn unpin(&mut self) {
        self.pinned = false;
        self.vx = 0.0;
        self.vy = 0.0;
    }

    /// Move the node directly and stop it. Non-finite targets are ignored.
    pub fn place(&mut self, x: f64, y: f64) {
        if x.is_finite() && y.is_finite() {
            self.x = x;
            self.y = y;
            self.last_good = (x, y);
        }
        self.vx = 0.0;
        self.vy = 0.0;
    }

    /// Copy position, velocity and pin state from an earlier incarnation
    pub(crate) fn carry_over(&mut self, prior: &Node) {
        self.x = prior.x;
        self.y = prior.y;
        self.vx = prior.vx;
        self.vy = prior.vy;
        self.pinned = prior.pinned;
        self.last_good = prior.last_good;
    }

    /// Record the current position as known-good, or restore the last one.
    ///
    /// Returns false when the node had to be recovered.
    pub(crate) fn commit_if_finite(&mut self) -> bool {
        if self.x.is_finite() && self.y.is_finite() && self.vx.is_finite() && self.vy.is_finite() {
            self.last_good = (self.x, self.y);
            true
        } else {
            (self.x, self.y) = self.last_good;
            self.vx = 0.0;
            self.vy = 0.0;
            false
        }
    }

    /// Whether a model-space point falls inside this node's hit circle
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let (dx, dy) = (self.x - x, self.y - y);
        dx * dx + dy * dy <= self.kind.radius() * self.kind.radius()
    }
}

/// A directed relationship between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }

    /// Whether this edge touches the given node
    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }

    /// The endpoint opposite `id`, if the edge touches it
    pub fn other(&self, id: &str) -> Option<&str> {
        if self.from == id {
            Some(&self.to)
        } else if self.to == id {
            Some(&self.from)
        } else {
            None
        }
    }
}

/// Nodes and edges of the node map
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.index_of(id).map(move |i| &mut self.nodes[i])
    }

    /// Add a node; ids must be unique
    pub fn insert_node(&mut self, node: Node) -> Result<()> {
        if self.index.contains_key(&node.id) {
            return Err(NodeMapError::DuplicateNode(node.id));
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Add an edge between existing nodes.
    ///
    /// Returns `Ok(false)` if an identical edge is already present.
    pub fn add_edge(&mut self, edge: Edge) -> Result<bool> {
        for id in [&edge.from, &edge.to] {
            if !self.contains(id) {
                return Err(NodeMapError::UnknownNode(id.clone()));
            }
        }
        if self.edges.contains(&edge) {
            return Ok(false);
        }
        self.edges.push(edge);
        Ok(true)
    }

    /// Remove a node and every edge incident to it. Nothing else changes.
    pub fn remove_node(&mut self, id: &str) -> Result<Node> {
        let idx = self
            .index
            .remove(id)
            .ok_or_else(|| NodeMapError::UnknownNode(id.to_string()))?;
        let node = self.nodes.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        self.edges.retain(|e| !e.touches(id));
        Ok(node)
    }

    /// Edges that touch the given node, in edge order
    pub fn incident_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(id))
    }

    /// Ids adjacent to `id` through any edge, in either direction
    pub fn neighbors(&self, id: &str) -> HashSet<String> {
        self.incident_edges(id)
            .filter_map(|e| e.other(id))
            .map(str::to_string)
            .collect()
    }

    /// Edges as index pairs into `nodes()`, for the simulation
    pub(crate) fn edge_indices(&self) -> Vec<(usize, usize)> {
        self.edges
            .iter()
            .filter_map(|e| Some((self.index_of(&e.from)?, self.index_of(&e.to)?)))
            .collect()
    }

    /// Bounding box of all node circles in model space
    pub fn bounds(&self) -> BoundingBox {
        let mut bounds = BoundingBox::empty();
        for node in &self.nodes {
            bounds.include_circle(node.x, node.y, node.kind.radius());
        }
        bounds
    }
}
