//! Pointer interaction: drag, pan, hover, select and filter
//!
//! The controller is a small state machine over [`InteractionState`].
//! Selection is separate, persistent state. Every handler leaves each node's
//! position and velocity consistent before returning, since a simulation tick
//! may run right after it.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NodeMapError;
use crate::graph::{Edge, Graph, Node, NodeKind};
use crate::viewport::Viewport;

/// Pointer input in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    Leave,
    Wheel { delta_y: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Panning,
    DraggingNode(String),
    Hovering(String),
}

/// Which node kinds are rendered and interactive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindFilter {
    #[default]
    All,
    Episode,
    Task,
    Member,
}

impl KindFilter {
    pub fn admits(&self, kind: NodeKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Episode => kind == NodeKind::Episode,
            KindFilter::Task => kind == NodeKind::Task,
            KindFilter::Member => kind == NodeKind::Member,
        }
    }
}

impl fmt::Display for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KindFilter::All => "all",
            KindFilter::Episode => "episode",
            KindFilter::Task => "task",
            KindFilter::Member => "member",
        };
        f.write_str(name)
    }
}

impl FromStr for KindFilter {
    type Err = NodeMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(KindFilter::All),
            "episode" | "episodes" => Ok(KindFilter::Episode),
            "task" | "tasks" => Ok(KindFilter::Task),
            "member" | "members" => Ok(KindFilter::Member),
            _ => Err(NodeMapError::UnknownFilter(s.to_string())),
        }
    }
}

/// What happens to a dragged node when it is let go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    /// Unpin; the node rejoins the simulation at rest
    #[default]
    Resume,
    /// Stay pinned where dropped until [`InteractionController::unpin_all`]
    Sticky,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Screen pixels a press may travel and still count as a click
    pub drag_threshold: f64,
    pub release_policy: ReleasePolicy,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 4.0,
            release_policy: ReleasePolicy::Resume,
        }
    }
}

/// Called with the new selection whenever it changes
pub type SelectCallback = Box<dyn FnMut(Option<&str>)>;

/// An in-progress press, from pointer-down to pointer-up
#[derive(Debug, Clone)]
struct Press {
    origin: (f64, f64),
    last: (f64, f64),
    /// Node position minus pointer position, in model units
    grab: (f64, f64),
    exceeded: bool,
}

pub struct InteractionController {
    config: InteractionConfig,
    state: InteractionState,
    selected: Option<String>,
    filter: KindFilter,
    press: Option<Press>,
    on_select: Option<SelectCallback>,
}

impl fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionController")
            .field("state", &self.state)
            .field("selected", &self.selected)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        let drag_threshold = if config.drag_threshold.is_finite() {
            config.drag_threshold.max(0.0)
        } else {
            InteractionConfig::default().drag_threshold
        };
        Self {
            config: InteractionConfig {
                drag_threshold,
                ..config
            },
            state: InteractionState::Idle,
            selected: None,
            filter: KindFilter::All,
            press: None,
            on_select: None,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Node under the pointer, including the one being dragged
    pub fn hovered(&self) -> Option<&str> {
        match &self.state {
            InteractionState::Hovering(id) | InteractionState::DraggingNode(id) => Some(id),
            _ => None,
        }
    }

    pub fn filter(&self) -> KindFilter {
        self.filter
    }

    pub fn release_policy(&self) -> ReleasePolicy {
        self.config.release_policy
    }

    pub fn set_release_policy(&mut self, policy: ReleasePolicy) {
        self.config.release_policy = policy;
    }

    pub fn set_on_select(&mut self, callback: SelectCallback) {
        self.on_select = Some(callback);
    }

    /// Feed one pointer event. Returns true if anything visible changed.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        graph: &mut Graph,
        viewport: &mut Viewport,
    ) -> bool {
        match event {
            PointerEvent::Down { x, y } => self.pointer_down(x, y, graph, viewport),
            PointerEvent::Move { x, y } => self.pointer_move(x, y, graph, viewport),
            PointerEvent::Up { x, y } => {
                // The release point counts as a final move of the gesture
                let moved = self.press.is_some() && self.pointer_move(x, y, graph, viewport);
                self.pointer_up(graph, viewport, Some((x, y))) || moved
            }
            PointerEvent::Leave => self.pointer_up(graph, viewport, None),
            PointerEvent::Wheel { delta_y } => {
                let before = viewport.scale();
                viewport.wheel(delta_y);
                viewport.scale() != before
            }
        }
    }

    fn pointer_down(&mut self, x: f64, y: f64, graph: &mut Graph, viewport: &mut Viewport) -> bool {
        if !(x.is_finite() && y.is_finite()) {
            return false;
        }
        // A lost pointer-up leaves a gesture open; close it without a click
        if self.press.is_some() {
            self.pointer_up(graph, viewport, None);
        }

        let (mx, my) = viewport.screen_to_model(x, y);
        let hit = self.hit_test(graph, viewport, x, y).map(str::to_string);
        let grab = match hit.as_deref().and_then(|id| graph.node_mut(id)) {
            Some(node) => {
                node.pin();
                let (nx, ny) = node.position();
                (nx - mx, ny - my)
            }
            None => (0.0, 0.0),
        };

        self.press = Some(Press {
            origin: (x, y),
            last: (x, y),
            grab,
            exceeded: false,
        });
        self.state = match hit {
            Some(id) => {
                debug!(node = %id, "drag start");
                InteractionState::DraggingNode(id)
            }
            None => {
                viewport.begin_pan();
                InteractionState::Panning
            }
        };
        true
    }

    fn pointer_move(&mut self, x: f64, y: f64, graph: &mut Graph, viewport: &mut Viewport) -> bool {
        if !(x.is_finite() && y.is_finite()) {
            return false;
        }
        let threshold = self.config.drag_threshold;
        if let Some(press) = &mut self.press {
            let (dx, dy) = (x - press.origin.0, y - press.origin.1);
            if dx * dx + dy * dy > threshold * threshold {
                press.exceeded = true;
            }
        }

        match &self.state {
            InteractionState::Panning => {
                let Some(press) = &mut self.press else {
                    return false;
                };
                let (dx, dy) = (x - press.last.0, y - press.last.1);
                press.last = (x, y);
                viewport.pan_by(dx, dy)
            }
            InteractionState::DraggingNode(id) => {
                let grab = self.press.as_ref().map_or((0.0, 0.0), |p| p.grab);
                let (mx, my) = viewport.screen_to_model(x, y);
                match graph.node_mut(id) {
                    Some(node) => {
                        node.place(mx + grab.0, my + grab.1);
                        true
                    }
                    None => false,
                }
            }
            InteractionState::Idle | InteractionState::Hovering(_) => {
                let next = match self.hit_test(graph, viewport, x, y) {
                    Some(id) => InteractionState::Hovering(id.to_string()),
                    None => InteractionState::Idle,
                };
                let changed = next != self.state;
                self.state = next;
                changed
            }
        }
    }

    /// Finish the current gesture at the release point, or with `None` for
    /// pointer-leave (never a click)
    fn pointer_up(
        &mut self,
        graph: &mut Graph,
        viewport: &mut Viewport,
        release: Option<(f64, f64)>,
    ) -> bool {
        let press = self.press.take();
        let was_click = release.is_some() && press.as_ref().is_some_and(|p| !p.exceeded);

        match std::mem::take(&mut self.state) {
            InteractionState::Panning => {
                viewport.end_pan();
                if was_click && self.selected.is_some() {
                    self.set_selection(None);
                }
                self.state = self.hover_at(graph, viewport, release);
                true
            }
            InteractionState::DraggingNode(id) => {
                if let Some(node) = graph.node_mut(&id) {
                    match self.config.release_policy {
                        ReleasePolicy::Resume => node.unpin(),
                        ReleasePolicy::Sticky => node.pin(),
                    }
                }
                debug!(node = %id, click = was_click, "drag end");
                if was_click {
                    let next = if self.selected.as_deref() == Some(id.as_str()) {
                        None
                    } else {
                        Some(id)
                    };
                    self.set_selection(next);
                }
                self.state = self.hover_at(graph, viewport, release);
                true
            }
            InteractionState::Hovering(id) if release.is_some() => {
                self.state = InteractionState::Hovering(id);
                false
            }
            InteractionState::Hovering(_) => true,
            InteractionState::Idle => false,
        }
    }

    /// Hover state for a pointer resting at `at`
    fn hover_at(&self, graph: &Graph, viewport: &Viewport, at: Option<(f64, f64)>) -> InteractionState {
        at.and_then(|(x, y)| self.hit_test(graph, viewport, x, y))
            .map(|id| InteractionState::Hovering(id.to_string()))
            .unwrap_or_default()
    }

    /// Top-most visible node under a screen point
    pub fn hit_test<'g>(
        &self,
        graph: &'g Graph,
        viewport: &Viewport,
        sx: f64,
        sy: f64,
    ) -> Option<&'g str> {
        let (mx, my) = viewport.screen_to_model(sx, sy);
        graph
            .nodes()
            .iter()
            .rev()
            .filter(|n| self.is_visible(n))
            .find(|n| n.contains_point(mx, my))
            .map(|n| n.id.as_str())
    }

    pub fn is_visible(&self, node: &Node) -> bool {
        self.filter.admits(node.kind)
    }

    /// An edge is visible only if both endpoints are
    pub fn is_edge_visible(&self, graph: &Graph, edge: &Edge) -> bool {
        let visible = |id: &str| graph.node(id).is_some_and(|n| self.is_visible(n));
        visible(&edge.from) && visible(&edge.to)
    }

    /// Change the kind filter. The graph itself is never modified; hover,
    /// drag and selection on nodes that become hidden are dropped.
    pub fn set_filter(&mut self, filter: KindFilter, graph: &mut Graph, viewport: &mut Viewport) {
        self.filter = filter;
        let hidden = |graph: &Graph, id: &str| graph.node(id).is_none_or(|n| !filter.admits(n.kind));

        if self.hovered().is_some_and(|id| hidden(&*graph, id)) {
            if matches!(self.state, InteractionState::DraggingNode(_)) {
                self.pointer_up(graph, viewport, None);
            } else {
                self.state = InteractionState::Idle;
            }
        }
        if self.selected.as_deref().is_some_and(|id| hidden(&*graph, id)) {
            self.set_selection(None);
        }
    }

    /// Drop references to nodes that no longer exist after a rebuild
    pub fn sync_with_graph(&mut self, graph: &Graph) {
        if self.hovered().is_some_and(|id| !graph.contains(id)) {
            self.state = InteractionState::Idle;
            self.press = None;
        }
        if self.selected.as_deref().is_some_and(|id| !graph.contains(id)) {
            self.set_selection(None);
        }
    }

    /// Select a node programmatically (or clear with `None`)
    pub fn select(&mut self, id: Option<&str>, graph: &Graph) {
        let id = id.filter(|id| graph.node(id).is_some_and(|n| self.is_visible(n)));
        if id != self.selected.as_deref() {
            self.set_selection(id.map(str::to_string));
        }
    }

    fn set_selection(&mut self, next: Option<String>) {
        self.selected = next;
        if let Some(callback) = &mut self.on_select {
            callback(self.selected.as_deref());
        }
    }

    /// Release every sticky pin, except a node currently being dragged
    pub fn unpin_all(&self, graph: &mut Graph) {
        let dragging = match &self.state {
            InteractionState::DraggingNode(id) => Some(id.as_str()),
            _ => None,
        };
        for node in graph.nodes_mut() {
            if node.pinned && Some(node.id.as_str()) != dragging {
                node.unpin();
            }
        }
    }

    /// The hovered node, else the selected one
    pub fn focus(&self) -> Option<&str> {
        self.hovered().or(self.selected())
    }

    /// `{X} ∪ neighbors(X)` for the focused node X; empty without focus
    pub fn highlight_set(&self, graph: &Graph) -> HashSet<String> {
        let Some(focus) = self.focus().filter(|id| graph.contains(id)) else {
            return HashSet::new();
        };
        let mut set = graph.neighbors(focus);
        set.insert(focus.to_string());
        set
    }
}
