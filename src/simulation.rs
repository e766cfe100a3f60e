//! CPU force simulation for node map layout
//!
//! Each tick accumulates gravity, all-pairs repulsion and edge springs for
//! every unpinned node from a snapshot of pre-tick positions, then integrates
//! `velocity = (velocity + force) * damping; position += velocity`.
//!
//! Repulsion is O(N²); the node maps this drives hold tens of nodes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::NodeMapError;
use crate::graph::Graph;

/// Distances below this are treated as this, so forces stay bounded
pub const MIN_DISTANCE: f64 = 1.0;

/// Default cap on a node's speed, model units per tick
pub const DEFAULT_MAX_VELOCITY: f64 = 100.0;

/// One of the five tunable physics parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicsParam {
    SpringStiffness,
    SpringLength,
    Repulsion,
    Gravity,
    Damping,
}

impl PhysicsParam {
    pub const ALL: [PhysicsParam; 5] = [
        PhysicsParam::SpringStiffness,
        PhysicsParam::SpringLength,
        PhysicsParam::Repulsion,
        PhysicsParam::Gravity,
        PhysicsParam::Damping,
    ];

    /// Inclusive range values are clamped into
    pub fn range(&self) -> (f64, f64) {
        match self {
            PhysicsParam::SpringStiffness => (0.001, 0.1),
            PhysicsParam::SpringLength => (50.0, 200.0),
            PhysicsParam::Repulsion => (1000.0, 15000.0),
            PhysicsParam::Gravity => (0.0, 0.1),
            PhysicsParam::Damping => (0.5, 0.99),
        }
    }

    pub fn default_value(&self) -> f64 {
        PhysicsConfig::default().get(*self)
    }

    /// Clamp into range; non-finite input yields the default
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.default_value();
        }
        let (lo, hi) = self.range();
        value.clamp(lo, hi)
    }
}

impl fmt::Display for PhysicsParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhysicsParam::SpringStiffness => "spring_stiffness",
            PhysicsParam::SpringLength => "spring_length",
            PhysicsParam::Repulsion => "repulsion",
            PhysicsParam::Gravity => "gravity",
            PhysicsParam::Damping => "damping",
        };
        f.write_str(name)
    }
}

impl FromStr for PhysicsParam {
    type Err = NodeMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        PhysicsParam::ALL
            .into_iter()
            .find(|p| p.to_string() == normalized || p.to_string().replace('_', "") == normalized)
            .ok_or_else(|| NodeMapError::UnknownParam(s.to_string()))
    }
}

/// Configuration for the force simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Spring constant of edges
    pub spring_stiffness: f64,
    /// Rest length of edges
    pub spring_length: f64,
    /// Repulsion strength between every pair of nodes
    pub repulsion: f64,
    /// Pull toward the center, per unit of displacement
    pub gravity: f64,
    /// Velocity retained per tick
    pub damping: f64,
    /// Upper bound on a node's speed after damping
    pub max_velocity: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            spring_stiffness: 0.02,
            spring_length: 100.0,
            repulsion: 5000.0,
            gravity: 0.01,
            damping: 0.85,
            max_velocity: DEFAULT_MAX_VELOCITY,
        }
    }
}

impl PhysicsConfig {
    pub fn get(&self, param: PhysicsParam) -> f64 {
        match param {
            PhysicsParam::SpringStiffness => self.spring_stiffness,
            PhysicsParam::SpringLength => self.spring_length,
            PhysicsParam::Repulsion => self.repulsion,
            PhysicsParam::Gravity => self.gravity,
            PhysicsParam::Damping => self.damping,
        }
    }

    /// Set a parameter, clamped into its range. Returns the stored value.
    pub fn set(&mut self, param: PhysicsParam, value: f64) -> f64 {
        let value = param.clamp(value);
        match param {
            PhysicsParam::SpringStiffness => self.spring_stiffness = value,
            PhysicsParam::SpringLength => self.spring_length = value,
            PhysicsParam::Repulsion => self.repulsion = value,
            PhysicsParam::Gravity => self.gravity = value,
            PhysicsParam::Damping => self.damping = value,
        }
        value
    }

    /// Copy with every parameter clamped into range
    #[must_use]
    pub fn clamped(mut self) -> Self {
        for param in PhysicsParam::ALL {
            self.set(param, self.get(param));
        }
        if !(self.max_velocity.is_finite() && self.max_velocity > 0.0) {
            self.max_velocity = DEFAULT_MAX_VELOCITY;
        }
        self
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What a tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Nodes integrated this tick
    pub moved: usize,
    /// Nodes reset to their last known-good position
    pub recovered: usize,
}

/// CPU force simulation over a [`Graph`]
#[derive(Debug, Clone)]
pub struct Simulator {
    config: PhysicsConfig,
    center: (f64, f64),
    paused: bool,
    /// Reused per tick
    forces: Vec<(f64, f64)>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl Simulator {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config: config.clamped(),
            center: (0.0, 0.0),
            paused: false,
            forces: Vec::new(),
        }
    }

    /// Point gravity pulls toward
    #[must_use]
    pub fn with_center(mut self, x: f64, y: f64) -> Self {
        if x.is_finite() && y.is_finite() {
            self.center = (x, y);
        }
        self
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PhysicsConfig) {
        self.config = config.clamped();
    }

    pub fn param(&self, param: PhysicsParam) -> f64 {
        self.config.get(param)
    }

    pub fn set_param(&mut self, param: PhysicsParam, value: f64) -> f64 {
        self.config.set(param, value)
    }

    pub fn reset_params(&mut self) {
        self.config.reset();
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Run one simulation tick
    pub fn tick(&mut self, graph: &mut Graph) -> TickReport {
        if self.paused || graph.is_empty() {
            return TickReport::default();
        }

        self.accumulate_forces(graph);

        let damping = self.config.damping;
        let max_velocity = self.config.max_velocity;
        let mut report = TickReport::default();
        for (node, &(fx, fy)) in graph.nodes_mut().iter_mut().zip(&self.forces) {
            if node.pinned {
                node.vx = 0.0;
                node.vy = 0.0;
                continue;
            }

            node.vx = (node.vx + fx) * damping;
            node.vy = (node.vy + fy) * damping;
            let speed = node.vx.hypot(node.vy);
            if speed > max_velocity && speed.is_finite() {
                let scale = max_velocity / speed;
                node.vx *= scale;
                node.vy *= scale;
            }
            node.x += node.vx;
            node.y += node.vy;
            report.moved += 1;

            if !node.commit_if_finite() {
                warn!(node = %node.id, "non-finite node state, restored last known-good position");
                report.recovered += 1;
            }
        }

        trace!(moved = report.moved, recovered = report.recovered, "tick");
        report
    }

    /// Fill `self.forces` with the net force on each node
    fn accumulate_forces(&mut self, graph: &Graph) {
        let nodes = graph.nodes();
        let n = nodes.len();
        self.forces.clear();
        self.forces.resize(n, (0.0, 0.0));

        let PhysicsConfig {
            spring_stiffness,
            spring_length,
            repulsion,
            gravity,
            ..
        } = self.config;

        // Gravity toward center
        for (force, node) in self.forces.iter_mut().zip(nodes) {
            force.0 += (self.center.0 - node.x) * gravity;
            force.1 += (self.center.1 - node.y) * gravity;
        }

        // Repulsion between every pair of nodes
        for i in 0..n {
            for j in (i + 1)..n {
                let (mut dx, mut dy) = (nodes[i].x - nodes[j].x, nodes[i].y - nodes[j].y);
                if dx == 0.0 && dy == 0.0 {
                    // Coincident: separate along x by index order
                    dx = -1.0;
                    dy = 0.0;
                }
                let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let force = repulsion / (dist * dist);
                let (fx, fy) = (force * dx / dist, force * dy / dist);

                self.forces[i].0 += fx;
                self.forces[i].1 += fy;
                self.forces[j].0 -= fx;
                self.forces[j].1 -= fy;
            }
        }

        // Springs along edges
        for (source, target) in graph.edge_indices() {
            if source == target {
                continue;
            }
            let dx = nodes[target].x - nodes[source].x;
            let dy = nodes[target].y - nodes[source].y;
            let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);

            // Hooke's law: positive stretch pulls the endpoints together
            let force = (dist - spring_length) * spring_stiffness;
            let (fx, fy) = (force * dx / dist, force * dy / dist);

            self.forces[source].0 += fx;
            self.forces[source].1 += fy;
            self.forces[target].0 -= fx;
            self.forces[target].1 -= fy;
        }
    }

    /// Sum of squared speeds of unpinned nodes
    pub fn kinetic_energy(graph: &Graph) -> f64 {
        graph
            .nodes()
            .iter()
            .filter(|n| !n.pinned)
            .map(|n| n.vx * n.vx + n.vy * n.vy)
            .sum()
    }

    /// Tick until kinetic energy drops below `threshold` or `max_ticks` ran.
    ///
    /// Returns the number of ticks executed.
    pub fn settle(&mut self, graph: &mut Graph, max_ticks: usize, threshold: f64) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && !self.paused {
            self.tick(graph);
            ticks += 1;
            if Self::kinetic_energy(graph) < threshold {
                break;
            }
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, EdgeKind, Node, NodeKind};

    fn pair(distance: f64, linked: bool) -> Graph {
        let mut g = Graph::new();
        g.insert_node(Node::new("a", NodeKind::Task, "A", -distance / 2.0, 0.0))
            .unwrap();
        g.insert_node(Node::new("b", NodeKind::Task, "B", distance / 2.0, 0.0))
            .unwrap();
        if linked {
            g.add_edge(Edge::new("a", "b", EdgeKind::Dependency)).unwrap();
        }
        g
    }

    fn distance(g: &Graph) -> f64 {
        let (ax, ay) = g.nodes()[0].position();
        let (bx, by) = g.nodes()[1].position();
        ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
    }

    fn no_gravity() -> PhysicsConfig {
        PhysicsConfig {
            gravity: 0.0,
            ..PhysicsConfig::default()
        }
    }

    #[test]
    fn unlinked_nodes_repel() {
        let mut g = pair(60.0, false);
        let mut sim = Simulator::new(no_gravity());
        sim.tick(&mut g);
        assert!(distance(&g) > 60.0);
    }

    #[test]
    fn stretched_spring_pulls_together() {
        let mut g = pair(190.0, true);
        let mut sim = Simulator::new(PhysicsConfig {
            gravity: 0.0,
            repulsion: 1000.0,
            spring_length: 50.0,
            spring_stiffness: 0.1,
            ..PhysicsConfig::default()
        });
        sim.tick(&mut g);
        assert!(distance(&g) < 190.0);
    }

    #[test]
    fn compressed_spring_pushes_apart() {
        let mut g = pair(20.0, true);
        let mut sim = Simulator::new(PhysicsConfig {
            gravity: 0.0,
            repulsion: 1000.0,
            spring_length: 200.0,
            ..PhysicsConfig::default()
        });
        sim.tick(&mut g);
        assert!(distance(&g) > 20.0);
    }

    #[test]
    fn gravity_pulls_single_node_to_center() {
        let mut g = Graph::new();
        g.insert_node(Node::new("solo", NodeKind::Episode, "S", 300.0, -400.0))
            .unwrap();
        let mut sim = Simulator::new(PhysicsConfig {
            gravity: 0.05,
            ..PhysicsConfig::default()
        });
        for _ in 0..300 {
            sim.tick(&mut g);
        }
        let (x, y) = g.nodes()[0].position();
        assert!((x * x + y * y).sqrt() < 1.0);
    }

    #[test]
    fn custom_center_is_respected() {
        let mut g = Graph::new();
        g.insert_node(Node::new("solo", NodeKind::Member, "S", 0.0, 0.0))
            .unwrap();
        let mut sim = Simulator::default().with_center(400.0, 300.0);
        sim.tick(&mut g);
        let (x, y) = g.nodes()[0].position();
        assert!(x > 0.0 && y > 0.0);
    }

    #[test]
    fn pinned_node_does_not_move_and_stays_at_rest() {
        let mut g = pair(30.0, true);
        g.node_mut("a").unwrap().pin();
        let before = g.node("a").unwrap().position();
        let mut sim = Simulator::default();
        for _ in 0..50 {
            sim.tick(&mut g);
            let a = g.node("a").unwrap();
            assert_eq!(a.position(), before);
            assert_eq!(a.velocity(), (0.0, 0.0));
        }
        // the free node still feels the pinned one
        assert_ne!(g.node("b").unwrap().velocity(), (0.0, 0.0));
    }

    #[test]
    fn paused_simulation_freezes_positions() {
        let mut g = pair(30.0, false);
        let mut sim = Simulator::default();
        sim.pause();
        let report = sim.tick(&mut g);
        assert_eq!(report, TickReport::default());
        assert_eq!(g.nodes()[0].position(), (-15.0, 0.0));
        sim.resume();
        assert_eq!(sim.tick(&mut g).moved, 2);
    }

    #[test]
    fn coincident_nodes_separate_without_nan() {
        let mut g = pair(0.0, true);
        let mut sim = Simulator::default();
        for _ in 0..10 {
            sim.tick(&mut g);
        }
        assert!(distance(&g) > 0.0);
        for node in g.nodes() {
            assert!(node.position().0.is_finite() && node.velocity().0.is_finite());
        }
    }

    #[test]
    fn non_finite_node_is_recovered_without_stopping_others() {
        let mut g = pair(80.0, false);
        g.insert_node(Node::new("c", NodeKind::Task, "C", 0.0, 80.0))
            .unwrap();
        g.node_mut("a").unwrap().vx = f64::INFINITY;

        let mut sim = Simulator::new(no_gravity());
        let report = sim.tick(&mut g);

        assert_eq!(report.moved, 3);
        assert_eq!(report.recovered, 1);
        let a = g.node("a").unwrap();
        assert_eq!(a.position(), (-40.0, 0.0));
        assert_eq!(a.velocity(), (0.0, 0.0));
        assert_ne!(g.node("c").unwrap().position(), (0.0, 80.0));
    }

    #[test]
    fn extreme_but_clamped_config_stays_finite() {
        let mut g = Graph::new();
        for i in 0..30 {
            let kind = [NodeKind::Episode, NodeKind::Task, NodeKind::Member][i % 3];
            g.insert_node(Node::new(format!("n{i}"), kind, "", (i % 4) as f64, (i / 4) as f64))
                .unwrap();
        }
        for i in 1..30 {
            g.add_edge(Edge::new(format!("n{}", i - 1), format!("n{i}"), EdgeKind::Contains))
                .unwrap();
        }
        let mut sim = Simulator::new(PhysicsConfig {
            spring_stiffness: 1e6,
            spring_length: -5.0,
            repulsion: 1e12,
            gravity: 5.0,
            damping: 2.0,
            max_velocity: -3.0,
        });
        assert_eq!(sim.config().max_velocity, DEFAULT_MAX_VELOCITY);
        assert_eq!(sim.config().damping, 0.99);
        for _ in 0..500 {
            sim.tick(&mut g);
            for node in g.nodes() {
                let (x, y) = node.position();
                let (vx, vy) = node.velocity();
                assert!(x.is_finite() && y.is_finite() && vx.is_finite() && vy.is_finite());
            }
        }
    }

    #[test]
    fn speed_is_capped_after_damping() {
        let mut g = pair(2.0, false);
        let mut sim = Simulator::new(PhysicsConfig {
            repulsion: 15000.0,
            gravity: 0.0,
            max_velocity: 5.0,
            ..PhysicsConfig::default()
        });
        sim.tick(&mut g);
        for node in g.nodes() {
            let (vx, vy) = node.velocity();
            assert!(vx.hypot(vy) <= 5.0 + 1e-9, "{} too fast", node.id);
        }
        assert!((distance(&g) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn stiff_hub_with_many_tasks_stays_bounded() {
        let mut g = Graph::new();
        g.insert_node(Node::new("ep", NodeKind::Episode, "Ep", 0.0, -200.0))
            .unwrap();
        for i in 0..45 {
            let angle = i as f64 * 0.35;
            let (x, y) = (110.0 * angle.cos(), -200.0 + 110.0 * angle.sin());
            g.insert_node(Node::new(format!("t{i}"), NodeKind::Task, "", x, y))
                .unwrap();
            g.add_edge(Edge::new("ep", format!("t{i}"), EdgeKind::Contains))
                .unwrap();
        }
        let mut sim = Simulator::new(PhysicsConfig {
            spring_stiffness: 0.1,
            damping: 0.99,
            ..PhysicsConfig::default()
        });
        let mut recovered = 0;
        for _ in 0..2000 {
            recovered += sim.tick(&mut g).recovered;
        }
        assert_eq!(recovered, 0);
        for node in g.nodes() {
            let (x, y) = node.position();
            assert!(x.hypot(y) < 1e4, "{} escaped to ({x}, {y})", node.id);
        }
    }

    #[test]
    fn settle_stops_when_energy_is_low() {
        let mut g = pair(100.0, true);
        let mut sim = Simulator::default();
        let ticks = sim.settle(&mut g, 5000, 1e-6);
        assert!(ticks < 5000);
        assert!(Simulator::kinetic_energy(&g) < 1e-6);
    }

    #[test]
    fn settings_are_clamped_not_rejected() {
        let mut config = PhysicsConfig::default();
        assert_eq!(config.set(PhysicsParam::Repulsion, 50.0), 1000.0);
        assert_eq!(config.set(PhysicsParam::Damping, 1.5), 0.99);
        assert_eq!(config.set(PhysicsParam::Gravity, -1.0), 0.0);
        assert_eq!(config.set(PhysicsParam::SpringLength, f64::NAN), 100.0);
        config.reset();
        assert_eq!(config, PhysicsConfig::default());
    }

    #[test]
    fn defaults_lie_inside_ranges() {
        for param in PhysicsParam::ALL {
            let (lo, hi) = param.range();
            let v = param.default_value();
            assert!(lo <= v && v <= hi, "{param} default out of range");
        }
    }

    #[test]
    fn param_names_parse() {
        assert_eq!(
            "spring_stiffness".parse::<PhysicsParam>().unwrap(),
            PhysicsParam::SpringStiffness
        );
        assert_eq!(
            "springLength".parse::<PhysicsParam>().unwrap(),
            PhysicsParam::SpringLength
        );
        assert_eq!("Damping".parse::<PhysicsParam>().unwrap(), PhysicsParam::Damping);
        assert!("friction".parse::<PhysicsParam>().is_err());
    }
}
