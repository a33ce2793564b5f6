//! Configuration management for `vellum.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── templates  # [templates]
//! │   └── watch      # [watch]
//! ├── types/         # ConfigError
//! └── mod.rs         # Config (this file)
//! ```
//!
//! # Sections
//!
//! | Section        | Purpose                                          |
//! |----------------|--------------------------------------------------|
//! | `[templates]`  | Template root, extension, static/reserved names  |
//! | `[watch]`      | Filesystem watcher toggle and settle delay       |

pub mod section;
pub mod types;
mod util;

pub use section::{TemplatesConfig, WatchConfig};
pub use types::ConfigError;
pub use util::find_config_file;

use crate::log;
use crate::utils::path::normalize_path;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "vellum.toml";

/// Root configuration structure representing vellum.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Template tree settings
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Watcher settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults, rooted at the current directory.
    /// Relative template roots are resolved against the config file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_path(path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", path.display());
            Self::default()
        };

        config.config_path = normalize_path(path);
        config.finalize();
        config.validate()?;
        Ok(config)
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}: {}", path.display(), ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Resolve the template root to an absolute path.
    fn finalize(&mut self) {
        let base = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let root = if self.templates.root.is_absolute() {
            self.templates.root.clone()
        } else {
            base.join(&self.templates.root)
        };
        self.templates.root = normalize_path(&root);
    }

    /// Override the template root (e.g. from `--root`).
    pub fn set_root(&mut self, root: &Path) {
        self.templates.root = normalize_path(root);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.templates.validate()
    }
}

#[cfg(test)]
pub fn test_parse_config(content: &str) -> Config {
    let (parsed, ignored) = Config::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
