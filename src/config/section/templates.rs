//! `[templates]` section configuration.
//!
//! Describes the template tree the pipeline compiles.
//!
//! # Example
//!
//! ```toml
//! [templates]
//! root = "templates"          # Template root, relative to vellum.toml
//! extension = "tmpl"          # Template source extension (no dot)
//! static_dir = "static"       # Subtree pre-rendered once per compilation
//! static_output = "_static"   # Reserved output directory, never walked
//! generated_prefix = "_"      # Marker of generated files and reserved dirs
//! ignored_prefix = "."        # Hidden directories
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Template tree settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Template root directory.
    pub root: PathBuf,

    /// Extension of template source files, without the leading dot.
    pub extension: String,

    /// Directory (relative to root) whose templates are static.
    pub static_dir: String,

    /// Reserved directory name that is never walked nor watched.
    pub static_output: String,

    /// Prefix of generated files; directories with it are skipped too.
    pub generated_prefix: String,

    /// Prefix of directories that are skipped (hidden).
    pub ignored_prefix: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("templates"),
            extension: "tmpl".into(),
            static_dir: "static".into(),
            static_output: "_static".into(),
            generated_prefix: "_".into(),
            ignored_prefix: ".".into(),
        }
    }
}

impl TemplatesConfig {
    /// Config rooted at `root` with every other field at its default.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extension.is_empty() {
            return Err(ConfigError::validation(
                "templates.extension",
                "must not be empty",
            ));
        }
        if self.extension.starts_with('.') {
            return Err(ConfigError::validation(
                "templates.extension",
                format!("write `{}` without the leading dot", &self.extension[1..]),
            ));
        }
        if self.generated_prefix.is_empty() {
            return Err(ConfigError::validation(
                "templates.generated_prefix",
                "must not be empty",
            ));
        }
        if self.ignored_prefix.is_empty() {
            return Err(ConfigError::validation(
                "templates.ignored_prefix",
                "must not be empty",
            ));
        }
        if self.static_dir.is_empty() || self.static_dir.contains(['/', '\\']) {
            return Err(ConfigError::validation(
                "templates.static_dir",
                "must be a single directory name",
            ));
        }
        if self.is_reserved_dir(&self.static_dir) {
            return Err(ConfigError::validation(
                "templates.static_dir",
                format!(
                    "`{}` is never walked (starts with `{}` or `{}`, or equals `{}`)",
                    self.static_dir, self.ignored_prefix, self.generated_prefix, self.static_output
                ),
            ));
        }
        Ok(())
    }

    /// Whether the directory `name` is skipped by the walk and the watcher.
    pub fn is_reserved_dir(&self, name: &str) -> bool {
        name.starts_with(&self.ignored_prefix)
            || name.starts_with(&self.generated_prefix)
            || name == self.static_output
    }

    /// Whether `path` has the template extension.
    pub fn is_template_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// Whether a file name marks generated output.
    pub fn is_generated(&self, file_name: &str) -> bool {
        file_name.starts_with(&self.generated_prefix)
    }
}
