//! The node map engine
//!
//! [`NodeMap`] owns one graph plus the builder, simulator, viewport and
//! interaction controller that act on it, and drives the simulation from a
//! host [`FrameScheduler`]. Everything runs on the caller's thread.

use tracing::{debug, info};

use crate::builder::GraphModelBuilder;
use crate::config::EngineConfig;
use crate::entities::Entities;
use crate::graph::Graph;
use crate::interaction::{
    InteractionController, KindFilter, PointerEvent, ReleasePolicy, SelectCallback,
};
use crate::render::{FrameSnapshot, Renderer, render};
use crate::scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
use crate::simulation::{PhysicsConfig, PhysicsParam, Simulator, TickReport};
use crate::viewport::Viewport;

/// Interactive force-directed node map
#[derive(Debug)]
pub struct NodeMap<S: FrameScheduler = ManualScheduler> {
    entities: Entities,
    graph: Graph,
    builder: GraphModelBuilder,
    simulator: Simulator,
    viewport: Viewport,
    interaction: InteractionController,
    scheduler: S,
    pending: Option<FrameHandle>,
    torn_down: bool,
}

impl<S: FrameScheduler> NodeMap<S> {
    /// Create an empty map and start the frame loop
    pub fn new(config: EngineConfig, scheduler: S) -> Self {
        let layout = config.layout;
        let mut map = Self {
            entities: Entities::default(),
            graph: Graph::new(),
            builder: GraphModelBuilder::new(layout),
            simulator: Simulator::new(config.physics).with_center(layout.center_x, layout.center_y),
            viewport: Viewport::new(config.viewport),
            interaction: InteractionController::new(config.interaction),
            scheduler,
            pending: None,
            torn_down: false,
        };
        map.schedule();
        map
    }

    /// Replace the entity set. Nodes that survive keep their position,
    /// velocity and pin state; new ones get a fresh radial placement.
    pub fn set_entities(&mut self, entities: Entities) {
        self.entities = entities;
        self.refresh();
    }

    /// Rebuild the graph from the current entity set
    pub fn refresh(&mut self) {
        self.graph = self.builder.rebuild(&self.entities, &self.graph);
        self.interaction.sync_with_graph(&self.graph);
        info!(
            nodes = self.graph.len(),
            edges = self.graph.edges().len(),
            "node map rebuilt"
        );
    }

    /// Remove one entity and exactly its node and incident edges.
    ///
    /// Nodes that only existed because of the removed entity (an assignee no
    /// task references any more) stay until the next [`refresh`](Self::refresh).
    pub fn remove_entity(&mut self, id: &str) -> bool {
        let from_entities = self.entities.remove(id);
        let from_graph = self.graph.remove_node(id).is_ok();
        if from_graph {
            self.interaction.sync_with_graph(&self.graph);
            debug!(id, "removed node");
        }
        from_entities || from_graph
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    // Frame loop

    /// Host callback for a frame requested earlier.
    ///
    /// Stale handles and frames delivered after teardown are ignored and
    /// return `None`.
    pub fn on_frame(&mut self, handle: FrameHandle) -> Option<TickReport> {
        if self.torn_down || self.pending != Some(handle) {
            debug!(?handle, "ignoring stale frame");
            return None;
        }
        self.pending = None;
        let report = self.simulator.tick(&mut self.graph);
        self.schedule();
        Some(report)
    }

    /// Advance one tick outside the frame loop
    pub fn tick(&mut self) -> TickReport {
        if self.torn_down {
            return TickReport::default();
        }
        self.simulator.tick(&mut self.graph)
    }

    /// Tick until the layout comes to rest. Returns the ticks executed.
    pub fn settle(&mut self, max_ticks: usize, threshold: f64) -> usize {
        if self.torn_down {
            return 0;
        }
        self.simulator.settle(&mut self.graph, max_ticks, threshold)
    }

    pub fn pause(&mut self) {
        self.simulator.pause();
        self.cancel_pending();
    }

    pub fn resume(&mut self) {
        if self.torn_down {
            return;
        }
        self.simulator.resume();
        self.schedule();
    }

    pub fn is_running(&self) -> bool {
        !self.torn_down && !self.simulator.is_paused()
    }

    /// Stop for good. Later frames, ticks and pointer events are no-ops.
    pub fn teardown(&mut self) {
        self.cancel_pending();
        self.torn_down = true;
        debug!("node map torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn schedule(&mut self) {
        if self.torn_down || self.simulator.is_paused() || self.pending.is_some() {
            return;
        }
        self.pending = Some(self.scheduler.request_frame());
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
    }

    // Interaction

    /// Feed one pointer event. Returns true if a redraw is warranted.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        if self.torn_down {
            return false;
        }
        self.interaction
            .handle(event, &mut self.graph, &mut self.viewport)
    }

    pub fn on_select(&mut self, callback: impl FnMut(Option<&str>) + 'static) {
        let callback: SelectCallback = Box::new(callback);
        self.interaction.set_on_select(callback);
    }

    pub fn selected(&self) -> Option<&str> {
        self.interaction.selected()
    }

    pub fn select(&mut self, id: Option<&str>) {
        self.interaction.select(id, &self.graph);
    }

    pub fn filter(&self) -> KindFilter {
        self.interaction.filter()
    }

    pub fn set_filter(&mut self, filter: KindFilter) {
        self.interaction
            .set_filter(filter, &mut self.graph, &mut self.viewport);
    }

    pub fn set_release_policy(&mut self, policy: ReleasePolicy) {
        self.interaction.set_release_policy(policy);
    }

    pub fn unpin_all(&mut self) {
        self.interaction.unpin_all(&mut self.graph);
    }

    // Viewport

    pub fn zoom_percent(&self) -> u32 {
        self.viewport.zoom_percent()
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset_view();
    }

    /// Pan and zoom so the whole graph fits a `width` x `height` canvas
    pub fn fit_to_view(&mut self, width: f64, height: f64, padding: f64) {
        let bounds = self.graph.bounds();
        self.viewport.fit_to_bounds(&bounds, width, height, padding);
    }

    // Physics

    pub fn physics(&self) -> &PhysicsConfig {
        self.simulator.config()
    }

    pub fn physics_param(&self, param: PhysicsParam) -> f64 {
        self.simulator.param(param)
    }

    /// Set a physics parameter, clamped into range. Returns the stored value.
    pub fn set_physics_param(&mut self, param: PhysicsParam, value: f64) -> f64 {
        self.simulator.set_param(param, value)
    }

    pub fn reset_physics(&mut self) {
        self.simulator.reset_params();
    }

    // Rendering

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(&self.graph, &self.viewport, &self.interaction)
    }

    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        render(&self.snapshot(), renderer);
    }
}

impl NodeMap<ManualScheduler> {
    /// Deliver every frame currently due. Returns how many ticked.
    pub fn pump(&mut self) -> usize {
        let due = self.scheduler.take_due();
        due.into_iter()
            .filter_map(|handle| self.on_frame(handle))
            .count()
    }
}

impl Default for NodeMap<ManualScheduler> {
    fn default() -> Self {
        Self::new(EngineConfig::default(), ManualScheduler::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Episode, Member, Status, Task};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn entities() -> Entities {
        Entities {
            projects: vec![],
            episodes: vec![Episode {
                id: "ep".into(),
                name: "ep.1".into(),
                project_id: "p".into(),
                task_ids: vec!["t1".into(), "t2".into()],
                progress: 50.0,
            }],
            tasks: vec![
                Task {
                    id: "t1".into(),
                    title: "Layout".into(),
                    episode_id: "ep".into(),
                    assignee_id: Some("m".into()),
                    status: Status::Progress,
                    linked_task_ids: vec![],
                },
                Task {
                    id: "t2".into(),
                    title: "Comp".into(),
                    episode_id: "ep".into(),
                    assignee_id: None,
                    status: Status::Waiting,
                    linked_task_ids: vec![],
                },
            ],
            members: vec![Member {
                id: "m".into(),
                name: "Kim".into(),
                status: Status::Working,
            }],
        }
    }

    fn map() -> NodeMap {
        let mut map = NodeMap::default();
        map.set_entities(entities());
        map
    }

    #[test]
    fn starts_with_one_pending_frame() {
        let map = NodeMap::default();
        assert!(map.is_running());
        assert_eq!(map.scheduler().pending().len(), 1);
    }

    #[test]
    fn each_frame_requests_the_next() {
        let mut map = map();
        for _ in 0..5 {
            assert_eq!(map.pump(), 1);
            assert_eq!(map.scheduler().pending().len(), 1);
        }
    }

    #[test]
    fn pause_cancels_and_resume_rearms() {
        let mut map = map();
        map.pause();
        assert!(map.scheduler().pending().is_empty());
        assert_eq!(map.pump(), 0);

        map.resume();
        assert_eq!(map.scheduler().pending().len(), 1);
        map.resume();
        assert_eq!(map.scheduler().pending().len(), 1, "no duplicate request");
    }

    #[test]
    fn stale_and_post_teardown_frames_are_ignored() {
        let mut map = map();
        let handle = map.scheduler_mut().take_due()[0];
        assert!(map.on_frame(FrameHandle(u64::MAX)).is_none());
        assert!(map.on_frame(handle).is_some());
        assert!(map.on_frame(handle).is_none(), "already fired");

        let next = map.scheduler().pending()[0];
        map.teardown();
        assert!(map.scheduler().pending().is_empty());

        let before: Vec<_> = map.graph().nodes().iter().map(|n| n.position()).collect();
        assert!(map.on_frame(next).is_none());
        assert_eq!(map.tick(), TickReport::default());
        assert!(!map.handle_pointer(PointerEvent::Down { x: 0.0, y: 0.0 }));
        let after: Vec<_> = map.graph().nodes().iter().map(|n| n.position()).collect();
        assert_eq!(before, after);

        map.resume();
        assert!(map.scheduler().pending().is_empty());
    }

    #[test]
    fn remove_entity_is_exact_until_refresh() {
        let mut map = map();
        assert_eq!(map.graph().len(), 4);
        assert_eq!(map.graph().edges().len(), 3);

        assert!(map.remove_entity("t1"));
        assert_eq!(map.graph().len(), 3);
        assert_eq!(map.graph().edges().len(), 1);
        assert!(map.graph().contains("m"));

        map.refresh();
        assert_eq!(map.graph().len(), 2);
        assert!(!map.graph().contains("m"));
        assert!(!map.remove_entity("t1"));
    }

    #[test]
    fn removing_selected_node_fires_deselect() {
        let mut map = map();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        map.on_select(move |id| sink.borrow_mut().push(id.map(str::to_string)));

        map.select(Some("t2"));
        map.remove_entity("t2");
        assert_eq!(map.selected(), None);
        assert_eq!(*log.borrow(), vec![Some("t2".to_string()), None]);
    }

    #[test]
    fn physics_params_are_clamped_and_reset() {
        let mut map = map();
        assert_eq!(map.set_physics_param(PhysicsParam::Damping, 2.0), 0.99);
        assert_eq!(map.physics_param(PhysicsParam::Damping), 0.99);
        map.reset_physics();
        assert_eq!(*map.physics(), PhysicsConfig::default());
    }

    #[test]
    fn zoom_controls_report_percent() {
        let mut map = map();
        assert_eq!(map.zoom_percent(), 100);
        map.zoom_in();
        assert_eq!(map.zoom_percent(), 110);
        for _ in 0..20 {
            map.zoom_out();
        }
        assert_eq!(map.zoom_percent(), 50);
        map.reset_view();
        assert_eq!(map.zoom_percent(), 100);
    }

    #[test]
    fn fit_to_view_brings_every_node_on_screen() {
        let mut map = map();
        map.fit_to_view(800.0, 600.0, 20.0);
        for node in map.snapshot().nodes {
            assert!((0.0..=800.0).contains(&node.x), "{} x={}", node.id, node.x);
            assert!((0.0..=600.0).contains(&node.y), "{} y={}", node.id, node.y);
        }
    }

    #[test]
    fn ticks_keep_state_finite() {
        let mut map = map();
        for _ in 0..200 {
            map.pump();
        }
        for node in map.graph().nodes() {
            let (x, y) = node.position();
            let (vx, vy) = node.velocity();
            assert!(x.is_finite() && y.is_finite() && vx.is_finite() && vy.is_finite());
        }
    }
}
