//! Template fragments found by the walk.

use std::path::{Path, PathBuf};

use crate::config::TemplatesConfig;
use crate::utils::path::logical_name;

/// How a fragment is handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Rendered on demand for each request.
    Normal,
    /// Rendered once per compilation and written back to disk.
    Static,
}

/// A template source file and its logical name.
#[derive(Debug, Clone)]
pub struct TemplateFragment {
    /// Path relative to the root, forward slashes, lower-case.
    pub name: String,
    pub path: PathBuf,
    pub kind: FragmentKind,
}

impl TemplateFragment {
    /// Classify `path`, returning `None` for files the pipeline ignores.
    pub fn classify(config: &TemplatesConfig, path: &Path) -> Option<Self> {
        if !config.is_template_file(path) {
            return None;
        }

        let name = logical_name(&config.root, path)?;
        let static_prefix = format!("{}/", config.static_dir.to_lowercase());
        let kind = if name.starts_with(&static_prefix) {
            FragmentKind::Static
        } else {
            FragmentKind::Normal
        };

        // Generated files only make sense inside the static subtree
        if kind == FragmentKind::Normal && config.is_generated(file_name(&name)) {
            return None;
        }

        Some(Self {
            name,
            path: path.to_path_buf(),
            kind,
        })
    }

    /// Whether this fragment is itself generated output.
    pub fn is_generated(&self, config: &TemplatesConfig) -> bool {
        self.name
            .split('/')
            .any(|segment| config.is_generated(segment))
    }

    /// Sibling path the rendered output of a static fragment is written to.
    ///
    /// `static/x/y.tmpl` → `static/x/_y.tmpl`.
    pub fn output_path(&self, config: &TemplatesConfig) -> PathBuf {
        let file = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path
            .with_file_name(format!("{}{}", config.generated_prefix, file))
    }
}

fn file_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TemplatesConfig {
        TemplatesConfig::with_root("/site/templates")
    }

    #[test]
    fn test_classify_normal() {
        let config = config();
        let fragment =
            TemplateFragment::classify(&config, Path::new("/site/templates/Blog/Post.tmpl"))
                .unwrap();
        assert_eq!(fragment.name, "blog/post.tmpl");
        assert_eq!(fragment.kind, FragmentKind::Normal);
    }

    #[test]
    fn test_classify_static() {
        let config = config();
        let fragment =
            TemplateFragment::classify(&config, Path::new("/site/templates/static/page.tmpl"))
                .unwrap();
        assert_eq!(fragment.name, "static/page.tmpl");
        assert_eq!(fragment.kind, FragmentKind::Static);
        assert!(!fragment.is_generated(&config));
    }

    #[test]
    fn test_classify_skips_other_extensions() {
        let config = config();
        assert!(TemplateFragment::classify(&config, Path::new("/site/templates/a.css")).is_none());
    }

    #[test]
    fn test_classify_skips_generated_normal_files() {
        let config = config();
        assert!(
            TemplateFragment::classify(&config, Path::new("/site/templates/_draft.tmpl"))
                .is_none()
        );
    }

    #[test]
    fn test_generated_static_fragment() {
        let config = config();
        let fragment =
            TemplateFragment::classify(&config, Path::new("/site/templates/static/_page.tmpl"))
                .unwrap();
        assert_eq!(fragment.kind, FragmentKind::Static);
        assert!(fragment.is_generated(&config));
    }

    #[test]
    fn test_output_path() {
        let config = config();
        let fragment =
            TemplateFragment::classify(&config, Path::new("/site/templates/static/x/y.tmpl"))
                .unwrap();
        assert_eq!(
            fragment.output_path(&config),
            PathBuf::from("/site/templates/static/x/_y.tmpl")
        );
    }
}
