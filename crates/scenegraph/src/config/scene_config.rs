//! Scene and projection settings

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};

/// Which projection family a [`ProjectionConfig`] describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    /// Parallel projection, no foreshortening
    #[default]
    Orthographic,
    /// Frustum projection with perspective divide
    Perspective,
}

/// Projection derived from an aspect ratio and a vertical field of view
///
/// Feeds the `*_ex` projection setters on [`crate::scene::State`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Projection family
    pub kind: ProjectionKind,
    /// Viewport width divided by height
    pub aspect: f32,
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            kind: ProjectionKind::Orthographic,
            aspect: 1.0,
            fov_y_degrees: 90.0,
            near: -1.0,
            far: 1.0,
        }
    }
}

impl ProjectionConfig {
    /// Perspective projection settings
    pub fn perspective(aspect: f32, fov_y_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            kind: ProjectionKind::Perspective,
            aspect,
            fov_y_degrees,
            near,
            far,
        }
    }

    /// Orthographic projection settings
    pub fn orthographic(aspect: f32, fov_y_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            kind: ProjectionKind::Orthographic,
            aspect,
            fov_y_degrees,
            near,
            far,
        }
    }

    /// Builder pattern: replace the aspect ratio (e.g. after a resize)
    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Reject settings that would produce a non-finite projection
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.aspect.is_finite() && self.aspect > 0.0) {
            return Err(ConfigError::Invalid(format!("aspect must be positive, got {}", self.aspect)));
        }
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_y_degrees must lie in (0, 180), got {}",
                self.fov_y_degrees
            )));
        }
        if self.near == self.far {
            return Err(ConfigError::Invalid(format!("near and far planes coincide at {}", self.near)));
        }
        if self.kind == ProjectionKind::Perspective && self.near <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "perspective near plane must be positive, got {}",
                self.near
            )));
        }
        Ok(())
    }
}

/// Settings for a rendering context's [`crate::scene::State`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Projection applied when the state is built
    pub projection: ProjectionConfig,
    /// Matrix stack slots reserved up front; roughly the expected tree depth
    pub matrix_stack_capacity: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionConfig::default(),
            matrix_stack_capacity: 16,
        }
    }
}

impl SceneConfig {
    /// Validate all nested settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.projection.validate()
    }
}

impl Config for SceneConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.projection.kind, ProjectionKind::Orthographic);
    }

    #[test]
    fn test_parse_partial_toml_fills_defaults() {
        let text = r#"
            [projection]
            kind = "perspective"
            aspect = 1.5
            near = 0.1
            far = 50.0
        "#;
        let config: SceneConfig = toml::from_str(text).unwrap();

        assert_eq!(config.projection.kind, ProjectionKind::Perspective);
        assert_eq!(config.projection.aspect, 1.5);
        assert_eq!(config.projection.fov_y_degrees, 90.0);
        assert_eq!(config.matrix_stack_capacity, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_ron() {
        let text = "(projection: (kind: perspective, aspect: 2.0, fov_y_degrees: 60.0, near: 1.0, far: 10.0), matrix_stack_capacity: 4)";
        let config: SceneConfig = ron::from_str(text).unwrap();

        assert_eq!(config.projection, ProjectionConfig::perspective(2.0, 60.0, 1.0, 10.0));
        assert_eq!(config.matrix_stack_capacity, 4);
    }

    #[test]
    fn test_validate_rejects_degenerate_projection() {
        let flat = ProjectionConfig::orthographic(1.0, 90.0, 1.0, 1.0);
        assert!(matches!(flat.validate(), Err(ConfigError::Invalid(_))));

        let behind = ProjectionConfig::perspective(1.0, 60.0, -1.0, 10.0);
        assert!(behind.validate().is_err());

        let squashed = ProjectionConfig::default().with_aspect(0.0);
        assert!(squashed.validate().is_err());
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("scenegraph-{}-{}", std::process::id(), name))
    }

    fn sample() -> SceneConfig {
        SceneConfig {
            projection: ProjectionConfig::perspective(1.5, 60.0, 0.1, 250.0),
            matrix_stack_capacity: 32,
        }
    }

    #[test]
    fn test_save_and_load_toml() {
        let path = temp_path("scene.toml");
        sample().save_to_file(&path).unwrap();

        let loaded = SceneConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_save_and_load_ron() {
        let path = temp_path("scene.ron");
        sample().save_to_file(&path).unwrap();

        let loaded = SceneConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let path = temp_path("broken.toml");
        std::fs::write(&path, "[projection\nkind = 3").unwrap();

        let result = SceneConfig::load_from_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unsupported_extension_checked_before_io() {
        // Neither file exists; the extension is rejected first
        let result = SceneConfig::load_from_file("scene.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));

        let result = SceneConfig::default().save_to_file("scene.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = SceneConfig::load_from_file(temp_path("missing.ron"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
