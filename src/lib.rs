//! nodemap - an interactive force-directed node map for production tracking.
//!
//! Episodes, tasks and team members become nodes of a [`Graph`]; containment,
//! assignment and task dependencies become edges. A [`Simulator`] relaxes the
//! layout tick by tick, a [`Viewport`] maps it to the screen, and an
//! [`InteractionController`] turns pointer input into dragging, panning,
//! hovering, selection and filtering. [`NodeMap`] ties them together behind a
//! host frame scheduler and hands finished frames to a [`Renderer`].

pub mod builder;
pub mod config;
pub mod engine;
pub mod entities;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod render;
pub mod scheduler;
pub mod simulation;
pub mod viewport;

pub use builder::{GraphModelBuilder, LayoutConfig};
pub use config::EngineConfig;
pub use engine::NodeMap;
pub use entities::{Entities, Episode, Member, Project, Status, Task};
pub use error::{NodeMapError, Result};
pub use graph::{Edge, EdgeKind, Graph, Node, NodeKind};
pub use interaction::{
    InteractionConfig, InteractionController, InteractionState, KindFilter, PointerEvent,
    ReleasePolicy,
};
pub use render::{Emphasis, FrameSnapshot, RenderEdge, RenderNode, Renderer};
pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
pub use simulation::{PhysicsConfig, PhysicsParam, Simulator, TickReport};
pub use viewport::{BoundingBox, Viewport, ViewportConfig};
