//! Configuration system
//!
//! A [`Config`] is any serde-serializable settings struct that can be loaded
//! from or saved to a TOML or RON file, chosen by file extension.

mod scene_config;

use std::path::Path;

pub use serde::{Serialize, Deserialize};
pub use scene_config::{ProjectionConfig, ProjectionKind, SceneConfig};

/// On-disk settings format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Format named by the path's extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Parse settings from text in this format
    pub fn parse<T: for<'de> Deserialize<'de>>(self, text: &str) -> Result<T, ConfigError> {
        match self {
            Self::Toml => toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string())),
            Self::Ron => ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Render settings as text in this format
    pub fn render<T: Serialize>(self, value: &T) -> Result<String, ConfigError> {
        match self {
            Self::Toml => toml::to_string_pretty(value).map_err(|e| ConfigError::Serialize(e.to_string())),
            Self::Ron => ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::new())
                .map_err(|e| ConfigError::Serialize(e.to_string())),
        }
    }
}

/// Settings that persist as TOML or RON
///
/// The format is decided from the extension before the file is touched, so
/// an unsupported path is reported as such even when it does not exist.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load settings from a `.toml` or `.ron` file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        let config = format.parse(&contents)?;
        log::debug!("Loaded {:?} configuration from {}", format, path.display());
        Ok(config)
    }

    /// Save settings to a `.toml` or `.ron` file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = ConfigFormat::from_path(path)?.render(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The text is not valid for its format
    #[error("Parse error: {0}")]
    Parse(String),

    /// The settings could not be rendered as text
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// The path has no `.toml` or `.ron` extension
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value parsed fine but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
