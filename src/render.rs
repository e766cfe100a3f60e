//! Render contract: a read-only, screen-space snapshot of the node map and
//! the draw interface that consumes it.
//!
//! Concrete drawing (canvas, GPU, terminal) lives with the host. The snapshot
//! applies the viewport transform, the kind filter and hover/selection
//! emphasis, so a renderer only has to paint what it is given.

use serde::Serialize;

use crate::entities::Status;
use crate::graph::{EdgeKind, Graph, NodeKind};
use crate::interaction::{InteractionController, KindFilter};
use crate::viewport::Viewport;

/// Visual weight of a node or edge relative to the current focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    /// Nothing is hovered or selected
    Normal,
    /// Part of the highlight set
    Emphasized,
    /// Outside the highlight set
    Dimmed,
}

/// A node as it should be drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    /// Screen-space center
    pub x: f64,
    pub y: f64,
    /// Screen-space radius
    pub radius: f64,
    pub color: [f32; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    pub pinned: bool,
    pub selected: bool,
    pub hovered: bool,
    pub emphasis: Emphasis,
}

/// An edge as it should be drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub emphasis: Emphasis,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub zoom_percent: u32,
    pub filter: KindFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl FrameSnapshot {
    /// Capture the visible part of `graph` through `viewport`
    pub fn capture(graph: &Graph, viewport: &Viewport, interaction: &InteractionController) -> Self {
        let highlight = interaction.highlight_set(graph);
        let focus = interaction.focus();
        let hovered = interaction.hovered();
        let selected = interaction.selected();

        let nodes = graph
            .nodes()
            .iter()
            .filter(|n| interaction.is_visible(n))
            .map(|n| {
                let (x, y) = viewport.model_to_screen(n.x, n.y);
                let emphasis = if highlight.is_empty() {
                    Emphasis::Normal
                } else if highlight.contains(&n.id) {
                    Emphasis::Emphasized
                } else {
                    Emphasis::Dimmed
                };
                RenderNode {
                    id: n.id.clone(),
                    kind: n.kind,
                    label: n.label.clone(),
                    x,
                    y,
                    radius: n.kind.radius() * viewport.scale(),
                    color: n.color,
                    status: n.status,
                    progress: n.progress,
                    pinned: n.pinned,
                    selected: selected == Some(n.id.as_str()),
                    hovered: hovered == Some(n.id.as_str()),
                    emphasis,
                }
            })
            .collect();

        let edges = graph
            .edges()
            .iter()
            .filter(|e| interaction.is_edge_visible(graph, e))
            .filter_map(|e| {
                let from = graph.node(&e.from)?;
                let to = graph.node(&e.to)?;
                let (x1, y1) = viewport.model_to_screen(from.x, from.y);
                let (x2, y2) = viewport.model_to_screen(to.x, to.y);
                let emphasis = match focus {
                    None => Emphasis::Normal,
                    Some(id) if e.touches(id) => Emphasis::Emphasized,
                    Some(_) => Emphasis::Dimmed,
                };
                Some(RenderEdge {
                    from: e.from.clone(),
                    to: e.to.clone(),
                    kind: e.kind,
                    x1,
                    y1,
                    x2,
                    y2,
                    emphasis,
                })
            })
            .collect();

        let (offset_x, offset_y) = viewport.offset();
        Self {
            scale: viewport.scale(),
            offset_x,
            offset_y,
            zoom_percent: viewport.zoom_percent(),
            filter: interaction.filter(),
            selected: selected.map(str::to_string),
            nodes,
            edges,
        }
    }
}

/// Host-side drawing surface
pub trait Renderer {
    /// Called once before any draw call of a frame (clear the surface here)
    fn begin_frame(&mut self, _frame: &FrameSnapshot) {}

    fn draw_edge(&mut self, edge: &RenderEdge);

    fn draw_node(&mut self, node: &RenderNode);

    fn end_frame(&mut self) {}
}

/// Draw a frame: edges first so nodes paint over them
pub fn render<R: Renderer + ?Sized>(frame: &FrameSnapshot, renderer: &mut R) {
    renderer.begin_frame(frame);
    for edge in &frame.edges {
        renderer.draw_edge(edge);
    }
    for node in &frame.nodes {
        renderer.draw_node(node);
    }
    renderer.end_frame();
}
