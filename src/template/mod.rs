//! Hot-reloading template pipeline.
//!
//! A [`TemplateManager`] owns a directory of Handlebars sources and keeps a
//! compiled, queryable set of them installed while requests are served.
//!
//! ```text
//! recompile()
//!   ├── resubscribe     drop old watcher, start a new one
//!   ├── walk            sorted, reserved directories pruned
//!   ├── watch dirs      every walked directory, non-recursive
//!   ├── parse           static → helper-less registry, written to _<file>
//!   │                   normal → TM_BEFORE_PARSE → shared registry
//!   └── install         atomic swap, old set kept on any error
//!
//! render(out, request, name, args)
//!   ├── lookup          normalized name against the installed set
//!   ├── TM_BEFORE_RENDER
//!   └── execute         streamed to `out`
//! ```
//!
//! Templates reference each other as partials by logical name:
//! `{{> blog/header.tmpl}}`.

mod compile;
mod error;
mod fragment;
pub mod helpers;
mod manager;
mod request;
mod set;
mod watch;

#[cfg(test)]
mod tests;

use serde_json::{Map, Value as Json};

use crate::hook::{Callback, HookId};

pub use compile::{CompileReport, Phase};
pub use error::TemplateError;
pub use fragment::{FragmentKind, TemplateFragment};
pub use helpers::{HelperFn, UrlReverser};
pub use manager::TemplateManager;
pub use request::RequestContext;
pub use set::{CompiledSet, CompiledTemplate};
pub use watch::{Trigger, triggers_recompile};

/// Fired for each normal template before it is parsed.
pub const TM_BEFORE_PARSE: HookId = HookId(0);
/// Fired before each render.
pub const TM_BEFORE_RENDER: HookId = HookId(1);

/// Handler of [`TM_BEFORE_PARSE`]: `(manager, logical name, source) -> source`.
///
/// Handlers are chained in attach order, each receiving the previous output.
pub type BeforeParseFn = dyn Fn(&TemplateManager, &str, Vec<u8>) -> Vec<u8> + Send + Sync;

/// Handler of [`TM_BEFORE_RENDER`]. May edit the render data in place.
pub type BeforeRenderFn =
    dyn Fn(&RequestContext, &TemplateManager, &CompiledTemplate, &mut Map<String, Json>)
        + Send
        + Sync;

impl Callback for BeforeParseFn {
    const ARITY: usize = 3;
}

impl Callback for BeforeRenderFn {
    const ARITY: usize = 4;
}
