//! The installed, immutable template set.

use std::io::Write;
use std::sync::Arc;

use handlebars::Handlebars;
use serde_json::Value as Json;

use super::TemplateError;

/// Normal fragments of one successful compilation, cross-linked as partials
/// of a single registry.
pub struct CompiledSet {
    registry: Handlebars<'static>,
    /// Sorted logical names.
    names: Vec<String>,
}

impl CompiledSet {
    pub(super) fn new(registry: Handlebars<'static>, mut names: Vec<String>) -> Self {
        names.sort_unstable();
        names.dedup();
        Self { registry, names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A template of the installed set, together with the snapshot it came from.
///
/// Holding one keeps its set alive even after a recompilation has replaced
/// it, so a render never observes a half-swapped set.
#[derive(Clone)]
pub struct CompiledTemplate {
    set: Arc<CompiledSet>,
    name: String,
}

impl CompiledTemplate {
    pub(super) fn new(set: Arc<CompiledSet>, name: String) -> Self {
        Self { set, name }
    }

    /// Normalized logical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&self) -> &Arc<CompiledSet> {
        &self.set
    }

    /// Execute against `data`, streaming to `out`. No hooks are fired.
    pub fn render(&self, data: &Json, out: &mut dyn Write) -> Result<(), TemplateError> {
        self.set
            .registry
            .render_to_write(&self.name, data, out)
            .map_err(|source| TemplateError::Execution {
                name: self.name.clone(),
                source: Box::new(source),
            })
    }
}

impl std::fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("name", &self.name)
            .field("set_len", &self.set.len())
            .finish()
    }
}
