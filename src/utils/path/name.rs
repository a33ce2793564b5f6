//! Logical template names.
//!
//! A logical name is a path relative to the template root with forward
//! slashes and lower-case letters, e.g. `Pages\Index.TMPL` → `pages/index.tmpl`.
//! Lookups normalize the requested name the same way, so callers may use
//! either separator and any casing.

use std::path::{Component, Path};

/// Normalize a user supplied template name.
pub fn normalize_name(name: &str) -> String {
    name.replace('\\', "/")
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_lowercase()
}

/// Logical name of `path` relative to `root`.
///
/// Returns `None` when `path` is not inside `root` or is not valid UTF-8.
pub fn logical_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_lowercase()),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Pages\\Index.TMPL"), "pages/index.tmpl");
        assert_eq!(normalize_name("./a.tmpl"), "a.tmpl");
        assert_eq!(normalize_name("/a/b.tmpl"), "a/b.tmpl");
    }

    #[test]
    fn test_logical_name() {
        let root = PathBuf::from("/site/templates");
        let path = root.join("Blog").join("Post.tmpl");
        assert_eq!(logical_name(&root, &path).as_deref(), Some("blog/post.tmpl"));
    }

    #[test]
    fn test_logical_name_outside_root() {
        let root = PathBuf::from("/site/templates");
        assert_eq!(logical_name(&root, Path::new("/elsewhere/a.tmpl")), None);
        assert_eq!(logical_name(&root, &root), None);
    }
}
