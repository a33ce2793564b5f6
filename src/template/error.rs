//! Template pipeline error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from compiling or rendering templates.
///
/// `Walk`, `Io`, `Parse` and `Emit` abort a compilation cycle and leave the
/// installed set untouched, as does an `Execution` error while pre-rendering
/// a static template. `Watch` is only logged. Otherwise `NotFound` and
/// `Execution` are reported per render call.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to walk `{}`", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: jwalk::Error,
    },

    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse template `{name}`")]
    Parse {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("failed to write static output `{}`", path.display())]
    Emit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to watch `{}`", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("can't find template '{0}'")]
    NotFound(String),

    #[error("failed to render template '{name}'")]
    Execution {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

impl TemplateError {
    /// The error followed by its source chain, `: `-separated.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            detail.push_str(": ");
            detail.push_str(&err.to_string());
            source = err.source();
        }
        detail
    }

    /// Whether the error aborted a compilation cycle.
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            Self::Walk { .. } | Self::Io { .. } | Self::Parse { .. } | Self::Emit { .. }
        )
    }
}
