//! One compilation cycle: walk the tree, read and parse every fragment,
//! pre-render the static subtree.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use handlebars::Handlebars;
use jwalk::WalkDir;
use serde_json::Value as Json;

use super::fragment::{FragmentKind, TemplateFragment};
use super::helpers::HelperTable;
use super::set::CompiledSet;
use super::TemplateError;
use crate::config::TemplatesConfig;

/// Progress of the current compilation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Nothing running. The last cycle failed, or none has run yet.
    Idle = 0,
    Walking = 1,
    Parsing = 2,
    /// The last cycle succeeded and its set is installed.
    Installed = 3,
}

impl Phase {
    pub(super) fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Walking,
            2 => Self::Parsing,
            3 => Self::Installed,
            _ => Self::Idle,
        }
    }
}

/// Summary of a successful compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// Normal templates in the installed set.
    pub templates: usize,
    /// Static templates parsed, generated ones included.
    pub statics: usize,
    /// Static outputs written (unchanged outputs are not rewritten).
    pub emitted: usize,
    pub elapsed: Duration,
}

impl fmt::Display for CompileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} templates, {} static ({} written) in {:.1?}",
            self.templates, self.statics, self.emitted, self.elapsed
        )
    }
}

/// Directories and fragments found under the root.
#[derive(Debug, Default)]
pub(super) struct Tree {
    pub(super) dirs: Vec<PathBuf>,
    pub(super) fragments: Vec<TemplateFragment>,
}

/// Walk the root in sorted order, pruning reserved directories.
pub(super) fn walk(config: &TemplatesConfig) -> Result<Tree, TemplateError> {
    let filter = config.clone();
    let walker = WalkDir::new(&config.root)
        .sort(true)
        .skip_hidden(false)
        .process_read_dir(move |depth, _, _, children| {
            // `None` is the root's parent; the only child is the root itself
            if depth.is_none() {
                return;
            }
            children.retain(|entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => {
                    !filter.is_reserved_dir(&entry.file_name().to_string_lossy())
                }
                _ => true,
            });
        });

    let mut tree = Tree::default();
    for entry in walker {
        let entry = entry.map_err(|source| TemplateError::Walk {
            path: source
                .path()
                .map_or_else(|| config.root.clone(), Path::to_path_buf),
            source,
        })?;

        let path = entry.path();
        if entry.file_type().is_dir() {
            tree.dirs.push(path);
        } else if let Some(fragment) = TemplateFragment::classify(config, &path) {
            tree.fragments.push(fragment);
        }
    }

    Ok(tree)
}

/// Parse every fragment and emit the static outputs.
///
/// Normal sources go through `before_parse` first. Nothing is installed
/// here; the first error aborts the whole cycle.
pub(super) fn build(
    config: &TemplatesConfig,
    helpers: &HelperTable,
    fragments: &[TemplateFragment],
    before_parse: impl Fn(&str, Vec<u8>) -> Vec<u8>,
) -> Result<(CompiledSet, CompileReport), TemplateError> {
    let mut registry = Handlebars::new();
    helpers.register(&mut registry);
    // Static pages are rendered once without request data, so no helpers
    let mut statics = Handlebars::new();

    let mut names = Vec::new();
    let mut report = CompileReport::default();

    for fragment in fragments {
        let source = fs::read(&fragment.path).map_err(|source| TemplateError::Io {
            path: fragment.path.clone(),
            source,
        })?;

        match fragment.kind {
            FragmentKind::Static => {
                register(&mut statics, fragment, source)?;
                report.statics += 1;
            }
            FragmentKind::Normal => {
                let source = before_parse(&fragment.name, source);
                register(&mut registry, fragment, source)?;
                names.push(fragment.name.clone());
            }
        }
        crate::debug!("template"; "parsed {}", fragment.name);
    }

    report.emitted = emit_statics(config, &statics, fragments)?;

    let set = CompiledSet::new(registry, names);
    report.templates = set.len();
    Ok((set, report))
}

fn register(
    registry: &mut Handlebars<'static>,
    fragment: &TemplateFragment,
    source: Vec<u8>,
) -> Result<(), TemplateError> {
    let source = String::from_utf8(source).map_err(|err| TemplateError::Io {
        path: fragment.path.clone(),
        source: io::Error::new(io::ErrorKind::InvalidData, err),
    })?;

    registry
        .register_template_string(&fragment.name, source)
        .map_err(|source| TemplateError::Parse {
            name: fragment.name.clone(),
            source: Box::new(source),
        })
}

/// Render each non-generated static fragment and write it next to its source.
fn emit_statics(
    config: &TemplatesConfig,
    statics: &Handlebars<'static>,
    fragments: &[TemplateFragment],
) -> Result<usize, TemplateError> {
    let mut emitted = 0;

    let pending = fragments
        .iter()
        .filter(|f| f.kind == FragmentKind::Static && !f.is_generated(config));
    for fragment in pending {
        let html = statics
            .render(&fragment.name, &Json::Null)
            .map_err(|source| TemplateError::Execution {
                name: fragment.name.clone(),
                source: Box::new(source),
            })?;

        let output = fragment.output_path(config);
        if write_if_changed(&output, html.as_bytes())? {
            crate::debug!("template"; "wrote {}", output.display());
            emitted += 1;
        }
    }

    Ok(emitted)
}

/// Returns `false` when `path` already holds `content`.
fn write_if_changed(path: &Path, content: &[u8]) -> Result<bool, TemplateError> {
    if fs::read(path).is_ok_and(|existing| existing == content) {
        return Ok(false);
    }

    let emit_err = |source| TemplateError::Emit {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(emit_err)?;
    }
    fs::write(path, content).map_err(emit_err)?;
    Ok(true)
}
