//! Configuration section definitions.

mod templates;
mod watch;

pub use templates::TemplatesConfig;
pub use watch::WatchConfig;
