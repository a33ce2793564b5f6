//! Command-line interface module.

mod args;
pub mod build;
pub mod render;
pub mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use vellum::config::{Config, find_config_file};
use vellum::{HookRegistry, TemplateManager};

pub use args::{Cli, Commands};

/// Load the config file (searched upward from the current directory) and
/// apply the command-line overrides.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let path = find_config_file(&cwd, &cli.config).unwrap_or_else(|| cwd.join(&cli.config));
    let mut config =
        Config::load(&path).with_context(|| format!("failed to load {}", path.display()))?;

    if let Some(root) = &cli.root {
        config.set_root(root);
    }
    if let Some(extension) = &cli.extension {
        config.templates.extension = extension.clone();
    }
    // Only `watch` keeps running long enough to use a watcher
    config.watch.enable &= cli.is_watch();

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Build a manager with a fresh hook registry.
pub fn manager(config: &Config) -> Result<TemplateManager> {
    let hooks = Arc::new(HookRegistry::new());
    TemplateManager::from_config(config, hooks).context("failed to declare template hooks")
}
