//! vellum - typed hook points and a hot-reloading Handlebars template pipeline.
//!
//! ```ignore
//! let hooks = Arc::new(HookRegistry::new());
//! let templates = TemplateManager::from_config(&config, Arc::clone(&hooks))?;
//! templates.on_before_render(|req, _, _, args| {
//!     args.insert("path".into(), req.path().into());
//! })?;
//! templates.recompile()?;
//! templates.render(&mut out, &req, "blog/post.tmpl", args)?;
//! ```

pub mod config;
pub mod hook;
pub mod logger;
pub mod template;
pub mod utils;

pub use config::Config;
pub use hook::{HookError, HookId, HookRegistry};
pub use template::{RequestContext, TemplateError, TemplateManager};
