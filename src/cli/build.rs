//! `build` and `list`: one-shot compilation.

use anyhow::{Context, Result};
use vellum::config::Config;
use vellum::log;

/// Compile once, writing the static pages.
pub fn build(config: &Config) -> Result<()> {
    let manager = super::manager(config)?;
    let report = manager.recompile().context("compilation failed")?;
    log!("render"; "compiled {}", report);
    Ok(())
}

/// Compile once and print every template name on its own line.
pub fn list(config: &Config) -> Result<()> {
    let manager = super::manager(config)?;
    manager.recompile().context("compilation failed")?;

    for name in manager.template_names() {
        println!("{name}");
    }
    Ok(())
}
