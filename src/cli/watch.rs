//! `watch`: keep the template tree compiled until Ctrl+C.

use anyhow::{Context, Result, bail};
use crossbeam::channel;
use vellum::config::Config;
use vellum::log;
use vellum::logger::{status_error, status_success};

pub fn watch(config: &Config) -> Result<()> {
    let manager = super::manager(config)?;

    // A broken tree is still watched, so keep going and wait for a fix
    match manager.recompile() {
        Ok(report) => status_success(&format!("compiled {report}")),
        Err(err) => status_error("initial compilation failed", &err.detail()),
    }
    if !manager.is_watching() {
        bail!("watching is disabled or the watcher could not be started");
    }

    let (shutdown_tx, shutdown_rx) = channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("failed to set Ctrl+C handler")?;

    log!(
        "watch";
        "watching {} (Ctrl+C to stop)",
        config.templates.root.display()
    );
    let _ = shutdown_rx.recv();
    log!("watch"; "shutting down...");
    Ok(())
}
