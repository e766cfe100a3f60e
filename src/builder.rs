//! Derives the node map graph from dashboard entities
//!
//! Placement is deterministic so rebuilding from the same entities yields the
//! same graph:
//!
//! - episodes sit on an inner ring, starting at 12 o'clock
//! - each episode's tasks fan out around their parent's angle
//! - members referenced by at least one task sit on an outer ring
//! - tasks no episode lists sit on a ring halfway between the two

use std::collections::{HashMap, HashSet};
use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entities::Entities;
use crate::graph::{Edge, EdgeKind, Graph, Node, NodeKind, parse_hex_color};

/// Geometry of the initial radial placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub center_x: f64,
    pub center_y: f64,
    pub episode_ring_radius: f64,
    /// Distance of a task from its episode
    pub task_cluster_radius: f64,
    /// Angle between neighbouring tasks of one episode (radians)
    pub task_fan_angle: f64,
    pub member_ring_radius: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            episode_ring_radius: 200.0,
            task_cluster_radius: 110.0,
            task_fan_angle: 0.35,
            member_ring_radius: 380.0,
        }
    }
}

impl LayoutConfig {
    /// Angle of slot `index` out of `count` on a ring, first slot at 12 o'clock
    pub fn ring_angle(index: usize, count: usize) -> f64 {
        TAU * index as f64 / count.max(1) as f64 - FRAC_PI_2
    }

    fn on_ring(&self, radius: f64, angle: f64) -> (f64, f64) {
        (
            self.center_x + radius * angle.cos(),
            self.center_y + radius * angle.sin(),
        )
    }
}

/// Builds [`Graph`]s from [`Entities`]
#[derive(Debug, Clone, Default)]
pub struct GraphModelBuilder {
    layout: LayoutConfig,
}

impl GraphModelBuilder {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Build a graph with fresh placement for every node
    pub fn build(&self, entities: &Entities) -> Graph {
        let mut graph = Graph::new();
        let layout = &self.layout;

        let project_colors: HashMap<&str, &str> = entities
            .projects
            .iter()
            .map(|p| (p.id.as_str(), p.color.as_str()))
            .collect();

        // Episodes on the inner ring
        let mut episode_angle: HashMap<&str, (f64, (f64, f64))> = HashMap::new();
        let episode_count = entities.episodes.len();
        for (i, episode) in entities.episodes.iter().enumerate() {
            let angle = LayoutConfig::ring_angle(i, episode_count);
            let (x, y) = layout.on_ring(layout.episode_ring_radius, angle);

            let color = match project_colors.get(episode.project_id.as_str()) {
                Some(hex) => parse_hex_color(hex).unwrap_or_else(|err| {
                    warn!(episode = %episode.id, %err, "falling back to default episode color");
                    NodeKind::Episode.default_color()
                }),
                None => NodeKind::Episode.default_color(),
            };

            let node = Node::new(&episode.id, NodeKind::Episode, &episode.name, x, y)
                .with_color(color)
                .with_progress(Some(episode.progress.clamp(0.0, 100.0)));
            if insert(&mut graph, node) {
                episode_angle.insert(episode.id.as_str(), (angle, (x, y)));
            }
        }

        // First episode listing a task decides where it clusters
        let mut parent_slot: HashMap<&str, (&str, usize, usize)> = HashMap::new();
        for episode in &entities.episodes {
            let count = episode.task_ids.len();
            for (j, task_id) in episode.task_ids.iter().enumerate() {
                parent_slot
                    .entry(task_id.as_str())
                    .or_insert((episode.id.as_str(), j, count));
            }
        }

        // Tasks clustered around their episode
        let task_count = entities.tasks.len();
        let orphan_radius = (layout.episode_ring_radius + layout.member_ring_radius) / 2.0;
        for (i, task) in entities.tasks.iter().enumerate() {
            let placed = parent_slot
                .get(task.id.as_str())
                .and_then(|(parent, j, count)| {
                    let (angle, (px, py)) = *episode_angle.get(parent)?;
                    let fan = (*j as f64 - (*count as f64 - 1.0) / 2.0) * layout.task_fan_angle;
                    let a = angle + fan;
                    Some((
                        px + layout.task_cluster_radius * a.cos(),
                        py + layout.task_cluster_radius * a.sin(),
                    ))
                });
            let (x, y) = placed
                .unwrap_or_else(|| layout.on_ring(orphan_radius, LayoutConfig::ring_angle(i, task_count)));

            let node = Node::new(&task.id, NodeKind::Task, &task.title, x, y)
                .with_color(task.status.color())
                .with_status(Some(task.status));
            insert(&mut graph, node);
        }

        // Members, only if some task is assigned to them
        let referenced: HashSet<&str> = entities
            .tasks
            .iter()
            .filter_map(|t| t.assignee_id.as_deref())
            .collect();
        let members: Vec<_> = entities
            .members
            .iter()
            .filter(|m| referenced.contains(m.id.as_str()))
            .collect();
        for (i, member) in members.iter().enumerate() {
            let angle = LayoutConfig::ring_angle(i, members.len());
            let (x, y) = layout.on_ring(layout.member_ring_radius, angle);
            let node = Node::new(&member.id, NodeKind::Member, &member.name, x, y)
                .with_color(member.status.color())
                .with_status(Some(member.status));
            insert(&mut graph, node);
        }

        // Edges, in a stable order: contains, assigned, dependency
        for episode in &entities.episodes {
            for task_id in &episode.task_ids {
                connect(&mut graph, Edge::new(&episode.id, task_id, EdgeKind::Contains));
            }
        }
        for task in &entities.tasks {
            if let Some(member) = &task.assignee_id {
                connect(&mut graph, Edge::new(member, &task.id, EdgeKind::Assigned));
            }
        }
        for task in &entities.tasks {
            for linked in &task.linked_task_ids {
                connect(&mut graph, Edge::new(&task.id, linked, EdgeKind::Dependency));
            }
        }

        debug!(
            nodes = graph.len(),
            edges = graph.edges().len(),
            "built node map graph"
        );
        graph
    }

    /// Build from new entities, carrying over position, velocity and pin
    /// state of every node whose id already existed in `previous`.
    pub fn rebuild(&self, entities: &Entities, previous: &Graph) -> Graph {
        let mut graph = self.build(entities);
        let mut carried = 0;
        for node in graph.nodes_mut() {
            if let Some(prior) = previous.node(&node.id) {
                node.carry_over(prior);
                carried += 1;
            }
        }
        debug!(
            carried,
            added = graph.len() - carried,
            removed = previous.len() - carried,
            "rebuilt node map graph"
        );
        graph
    }
}

fn insert(graph: &mut Graph, node: Node) -> bool {
    match graph.insert_node(node) {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, "skipping node");
            false
        }
    }
}

fn connect(graph: &mut Graph, edge: Edge) {
    if edge.from == edge.to {
        debug!(node = %edge.from, kind = %edge.kind, "dropping self-loop");
        return;
    }
    if let Err(err) = graph.add_edge(edge) {
        debug!(%err, "dropping edge");
    }
}
