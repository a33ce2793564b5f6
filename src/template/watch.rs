//! Filesystem subscription driving recompilation.
//!
//! ```text
//! notify watcher ──▶ channel ──▶ watch thread ──▶ settle ──▶ on_change (once)
//! ```
//!
//! A subscription fires at most once. The recompilation it triggers tears it
//! down and installs a fresh one that also covers directories created since.
//! Dropping the subscription drops the watcher, which disconnects the channel
//! and lets the thread exit.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver};
use notify::event::{CreateKind, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::TemplateError;
use crate::config::TemplatesConfig;

/// Why a subscription asked for a recompilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A relevant file or directory changed.
    Changed(PathBuf),
    /// The watcher reported an error; recompiling re-arms it.
    Failed(String),
}

/// Live watcher plus the thread consuming its events.
pub(super) struct Subscription {
    watcher: RecommendedWatcher,
}

impl Subscription {
    /// Start a watcher with no directories attached yet.
    pub(super) fn spawn<F>(
        config: &TemplatesConfig,
        settle: Duration,
        on_change: F,
    ) -> Result<Self, TemplateError>
    where
        F: FnOnce(Trigger) + Send + 'static,
    {
        let (tx, rx) = channel::unbounded();
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the watch thread already fired
            let _ = tx.send(res);
        })
        .map_err(|source| TemplateError::Watch {
            path: config.root.clone(),
            source,
        })?;

        let filter = config.clone();
        thread::Builder::new()
            .name("vellum-watch".into())
            .spawn(move || run(rx, &filter, settle, on_change))
            .map_err(|source| TemplateError::Io {
                path: config.root.clone(),
                source,
            })?;

        Ok(Self { watcher })
    }

    /// Observe the direct children of `dir`.
    pub(super) fn watch_dir(&mut self, dir: &Path) -> Result<(), TemplateError> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|source| TemplateError::Watch {
                path: dir.to_path_buf(),
                source,
            })
    }
}

fn run<F>(
    rx: Receiver<notify::Result<Event>>,
    config: &TemplatesConfig,
    settle: Duration,
    on_change: F,
) where
    F: FnOnce(Trigger),
{
    let trigger = loop {
        match rx.recv() {
            Ok(Ok(event)) => {
                if let Some(path) = triggering_path(&event, config) {
                    break Trigger::Changed(path.to_path_buf());
                }
            }
            Ok(Err(err)) => break Trigger::Failed(err.to_string()),
            // Superseded by a newer subscription
            Err(_) => return,
        }
    };
    drop(rx);

    crate::debug!("watch"; "{:?}", trigger);
    thread::sleep(settle);
    on_change(trigger);
}

/// Whether `event` should cause a recompilation.
pub fn triggers_recompile(event: &Event, config: &TemplatesConfig) -> bool {
    triggering_path(event, config).is_some()
}

fn triggering_path<'a>(event: &'a Event, config: &TemplatesConfig) -> Option<&'a Path> {
    let created = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Remove(_) => false,
        // Renames are not followed, metadata changes would loop on our own writes
        EventKind::Modify(ModifyKind::Name(_) | ModifyKind::Metadata(_)) => return None,
        EventKind::Modify(_) => false,
        _ => return None,
    };
    let folder = matches!(event.kind, EventKind::Create(CreateKind::Folder));

    event
        .paths
        .iter()
        .map(PathBuf::as_path)
        .find(|path| is_relevant(path, config, created, folder))
}

fn is_relevant(path: &Path, config: &TemplatesConfig, created: bool, folder: bool) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if created && (folder || path.is_dir()) {
        return !config.is_reserved_dir(name);
    }

    config.is_template_file(path) && !config.is_generated(name) && !is_temp_file(name)
}

/// Editor swap and backup files.
fn is_temp_file(name: &str) -> bool {
    name.starts_with('.') || name.ends_with('~')
}
