//! Engine configuration
//!
//! Loaded from YAML or JSON by file extension. Every section and field has a
//! default, so a config file only needs the values it changes. Physics values
//! outside their documented ranges are clamped, never rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::LayoutConfig;
use crate::entities::extension;
use crate::error::{NodeMapError, Result};
use crate::interaction::InteractionConfig;
use crate::simulation::PhysicsConfig;
use crate::viewport::ViewportConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub layout: LayoutConfig,
    pub viewport: ViewportConfig,
    pub interaction: InteractionConfig,
}

impl EngineConfig {
    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = match extension(path)?.as_str() {
            "json" => Self::from_json(&text)?,
            "yaml" | "yml" => Self::from_yaml(&text)?,
            other => return Err(NodeMapError::UnknownExtension(other.to_string())),
        };
        debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        Ok(config.normalized())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        self.physics = self.physics.clamped();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::ReleasePolicy;

    #[test]
    fn empty_yaml_is_all_defaults() {
        let config = EngineConfig::from_yaml("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_and_clamps() {
        let yaml = r#"
physics:
  repulsion: 99999
  damping: 0.7
viewport:
  max_scale: 3.0
interaction:
  release_policy: sticky
"#;
        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.physics.repulsion, 15000.0);
        assert_eq!(config.physics.damping, 0.7);
        assert_eq!(config.physics.gravity, PhysicsConfig::default().gravity);
        assert_eq!(config.viewport.max_scale, 3.0);
        assert_eq!(config.viewport.min_scale, 0.5);
        assert_eq!(config.interaction.release_policy, ReleasePolicy::Sticky);
    }

    #[test]
    fn json_layout_section() {
        let config =
            EngineConfig::from_json(r#"{ "layout": { "episode_ring_radius": 150 } }"#).unwrap();
        assert_eq!(config.layout.episode_ring_radius, 150.0);
        assert_eq!(config.layout.member_ring_radius, 380.0);
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        let err = EngineConfig::from_yaml("physics: [1, 2").unwrap_err();
        assert!(matches!(err, NodeMapError::Parse(_)));
    }

    #[test]
    fn loads_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodemap.yml");
        std::fs::write(&path, "physics:\n  gravity: 0.05\n").unwrap();
        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.physics.gravity, 0.05);

        let missing = dir.path().join("absent.yaml");
        assert!(matches!(
            EngineConfig::from_path(&missing),
            Err(NodeMapError::Io(_))
        ));
    }
}
