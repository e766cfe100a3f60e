//! Domain entities supplied by the dashboard's collaborators
//!
//! These are the inputs of the graph builder. References between entities are
//! plain ids; the builder resolves them through lookup maps.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NodeMapError, Result};
use crate::graph::colors;

/// Work status shared by tasks and members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Waiting,
    Progress,
    Review,
    Done,
    /// Members only
    Working,
    /// Members only
    Absent,
}

impl Status {
    /// Node color for this status
    pub fn color(&self) -> [f32; 4] {
        match self {
            Status::Waiting => colors::WAITING,
            Status::Progress => colors::PROGRESS,
            Status::Review => colors::REVIEW,
            Status::Done => colors::DONE,
            Status::Working => colors::WORKING,
            Status::Absent => colors::ABSENT,
        }
    }
}

/// A project groups episodes and supplies their color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    /// Hex color, `#RRGGBB`
    pub color: String,
}

/// A unit of production work, containing tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    pub name: String,
    pub project_id: String,
    /// Ordered ids of the tasks this episode contains
    #[serde(default)]
    pub task_ids: Vec<String>,
    /// Completion percentage (0-100)
    #[serde(default)]
    pub progress: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub episode_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    pub status: Status,
    /// Tasks this one depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_task_ids: Vec<String>,
}

/// A team member who can be assigned to tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub status: Status,
}

/// Everything the builder needs, in collaborator order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entities {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Entities {
    /// Load entities from a `.json`, `.yaml` or `.yml` file
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        match extension(path)?.as_str() {
            "json" => Ok(serde_json::from_str(&text)?),
            "yaml" | "yml" => Ok(serde_yaml::from_str(&text)?),
            other => Err(NodeMapError::UnknownExtension(other.to_string())),
        }
    }

    /// Drop an entity by id, together with the references other entities
    /// hold to it. Returns true if anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.len();
        self.episodes.retain(|e| e.id != id);
        self.tasks.retain(|t| t.id != id);
        self.members.retain(|m| m.id != id);
        self.projects.retain(|p| p.id != id);

        for episode in &mut self.episodes {
            episode.task_ids.retain(|t| t != id);
        }
        for task in &mut self.tasks {
            if task.assignee_id.as_deref() == Some(id) {
                task.assignee_id = None;
            }
            task.linked_task_ids.retain(|t| t != id);
        }
        self.len() != before
    }

    fn len(&self) -> usize {
        self.projects.len() + self.episodes.len() + self.tasks.len() + self.members.len()
    }
}

/// Lower-cased file extension, used for format dispatch
pub(crate) fn extension(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| NodeMapError::UnknownExtension(path.display().to_string()))
}
