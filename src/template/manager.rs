use std::io::Write;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use arc_swap::ArcSwapOption;
use handlebars::{Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value as Json};

use super::compile::{self, CompileReport, Phase};
use super::helpers::{HelperTable, UrlReverser};
use super::set::{CompiledSet, CompiledTemplate};
use super::watch::{Subscription, Trigger};
use super::{
    BeforeParseFn, BeforeRenderFn, RequestContext, TM_BEFORE_PARSE, TM_BEFORE_RENDER,
    TemplateError,
};
use crate::config::{Config, TemplatesConfig, WatchConfig};
use crate::hook::{HookError, HookId, HookRegistry, HookSignature};
use crate::logger::{status_error, status_success, status_warning};
use crate::utils::path::normalize_name;
use crate::{debug, log};

/// Handle to a template tree that keeps itself compiled.
///
/// Cloning is cheap and every clone drives the same pipeline. Renders read
/// the installed set without locking; `recompile` is serialized.
#[derive(Clone)]
pub struct TemplateManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: TemplatesConfig,
    watch: WatchConfig,
    hooks: Arc<HookRegistry>,
    /// Snapshotted at the start of each compilation.
    helpers: RwLock<HelperTable>,
    installed: ArcSwapOption<CompiledSet>,
    subscription: Mutex<Option<Subscription>>,
    compile_lock: Mutex<()>,
    phase: AtomicU8,
    /// Bumped whenever the subscription is replaced.
    generation: AtomicU64,
}

impl TemplateManager {
    /// Create a manager for `config.root` and declare its hook points on
    /// `hooks`.
    ///
    /// Nothing is compiled until [`recompile`](Self::recompile) is called.
    pub fn new(
        config: TemplatesConfig,
        watch: WatchConfig,
        hooks: Arc<HookRegistry>,
    ) -> Result<Self, HookError> {
        declare(
            &hooks,
            TM_BEFORE_PARSE,
            HookSignature::callback::<BeforeParseFn>(),
        )?;
        declare(
            &hooks,
            TM_BEFORE_RENDER,
            HookSignature::callback::<BeforeRenderFn>(),
        )?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                watch,
                hooks,
                helpers: RwLock::new(HelperTable::default()),
                installed: ArcSwapOption::empty(),
                subscription: Mutex::new(None),
                compile_lock: Mutex::new(()),
                phase: AtomicU8::new(Phase::Idle as u8),
                generation: AtomicU64::new(0),
            }),
        })
    }

    pub fn from_config(config: &Config, hooks: Arc<HookRegistry>) -> Result<Self, HookError> {
        Self::new(config.templates.clone(), config.watch, hooks)
    }

    pub fn config(&self) -> &TemplatesConfig {
        &self.inner.config
    }

    pub fn hooks(&self) -> &Arc<HookRegistry> {
        &self.inner.hooks
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.inner.phase.load(Ordering::Acquire))
    }

    /// Whether a filesystem subscription is currently alive.
    pub fn is_watching(&self) -> bool {
        self.inner.subscription.lock().is_some()
    }

    // ------------------------------------------------------------------------
    // Extension
    // ------------------------------------------------------------------------

    /// Attach a transformation of normal template sources, run before parsing.
    pub fn on_before_parse<F>(&self, handler: F) -> Result<(), HookError>
    where
        F: Fn(&TemplateManager, &str, Vec<u8>) -> Vec<u8> + Send + Sync + 'static,
    {
        let handler: Arc<BeforeParseFn> = Arc::new(handler);
        self.inner.hooks.attach(TM_BEFORE_PARSE, handler)
    }

    /// Attach a handler that may edit the render data of every request.
    pub fn on_before_render<F>(&self, handler: F) -> Result<(), HookError>
    where
        F: Fn(&RequestContext, &TemplateManager, &CompiledTemplate, &mut Map<String, Json>)
            + Send
            + Sync
            + 'static,
    {
        let handler: Arc<BeforeRenderFn> = Arc::new(handler);
        self.inner.hooks.attach(TM_BEFORE_RENDER, handler)
    }

    /// Register an extra helper. Takes effect at the next compilation.
    pub fn add_helper<F>(&self, name: &str, helper: F)
    where
        F: Fn(&Helper, &Handlebars, &Context, &mut RenderContext, &mut dyn Output) -> HelperResult
            + Send
            + Sync
            + 'static,
    {
        self.inner.helpers.write().insert(name, Arc::new(helper));
    }

    /// Router used by the `url` helper. Takes effect at the next compilation.
    pub fn set_url_reverser(&self, reverser: Arc<dyn UrlReverser>) {
        self.inner.helpers.write().set_url_reverser(reverser);
    }

    // ------------------------------------------------------------------------
    // Compilation
    // ------------------------------------------------------------------------

    /// Rebuild the set from disk and re-arm the watcher.
    ///
    /// On error the previously installed set stays in place. Hook handlers
    /// must not call this (the compile lock is not reentrant).
    pub fn recompile(&self) -> Result<CompileReport, TemplateError> {
        let _guard = self.inner.compile_lock.lock();
        let started = Instant::now();
        let helpers = self.inner.helpers.read().clone();

        self.set_phase(Phase::Walking);
        self.resubscribe();
        let tree = match compile::walk(&self.inner.config) {
            Ok(tree) => tree,
            Err(err) => return self.abort(err),
        };
        // Before parsing, so a tree that fails to compile is still watched
        self.watch_dirs(&tree.dirs);

        self.set_phase(Phase::Parsing);
        let before_parse = self
            .inner
            .hooks
            .handlers::<BeforeParseFn>(TM_BEFORE_PARSE);
        let result = compile::build(
            &self.inner.config,
            &helpers,
            &tree.fragments,
            |name, source| {
                before_parse
                    .iter()
                    .fold(source, |source, handler| handler(self, name, source))
            },
        );

        match result {
            Ok((set, mut report)) => {
                report.elapsed = started.elapsed();
                self.inner.installed.store(Some(Arc::new(set)));
                self.set_phase(Phase::Installed);
                debug!("template"; "installed {}", report);
                Ok(report)
            }
            Err(err) => self.abort(err),
        }
    }

    fn abort(&self, err: TemplateError) -> Result<CompileReport, TemplateError> {
        log!("error"; "{}", err.detail());
        self.set_phase(Phase::Idle);
        Err(err)
    }

    fn set_phase(&self, phase: Phase) {
        self.inner.phase.store(phase as u8, Ordering::Release);
    }

    /// Drop the current subscription and start a new one, unless disabled.
    fn resubscribe(&self) {
        let mut slot = self.inner.subscription.lock();
        *slot = None;

        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if !self.inner.watch.enable {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let spawned = Subscription::spawn(
            &self.inner.config,
            self.inner.watch.settle(),
            move |trigger| on_trigger(&weak, generation, trigger),
        );
        match spawned {
            Ok(subscription) => *slot = Some(subscription),
            Err(err) => log!("watch"; "not watching: {}", err.detail()),
        }
    }

    fn watch_dirs(&self, dirs: &[std::path::PathBuf]) {
        let mut slot = self.inner.subscription.lock();
        let Some(subscription) = slot.as_mut() else {
            return;
        };

        for dir in dirs {
            if let Err(err) = subscription.watch_dir(dir) {
                log!("watch"; "{}", err.detail());
            }
        }
    }

    // ------------------------------------------------------------------------
    // Lookup & render
    // ------------------------------------------------------------------------

    /// Find `name` (any case, either separator) in the installed set.
    pub fn lookup(&self, name: &str) -> Option<CompiledTemplate> {
        let set = self.inner.installed.load_full()?;
        let name = normalize_name(name);
        set.contains(&name)
            .then(|| CompiledTemplate::new(set, name))
    }

    /// Sorted names of the installed set.
    pub fn template_names(&self) -> Vec<String> {
        self.inner
            .installed
            .load()
            .as_ref()
            .map(|set| set.names().to_vec())
            .unwrap_or_default()
    }

    /// Render template `name` to `out`.
    ///
    /// Before-render handlers run first, in attach order, and may edit
    /// `args`.
    pub fn render(
        &self,
        out: &mut dyn Write,
        request: &RequestContext,
        name: &str,
        mut args: Map<String, Json>,
    ) -> Result<(), TemplateError> {
        let template = self
            .lookup(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_owned()))?;

        for handler in self
            .inner
            .hooks
            .handlers::<BeforeRenderFn>(TM_BEFORE_RENDER)
        {
            handler(request, self, &template, &mut args);
        }

        let result = template.render(&Json::Object(args), out);
        if let Err(err) = &result {
            debug!("template"; "{}", err.detail());
        }
        result
    }

    pub fn render_to_string(
        &self,
        request: &RequestContext,
        name: &str,
        args: Map<String, Json>,
    ) -> Result<String, TemplateError> {
        let mut buf = Vec::new();
        self.render(&mut buf, request, name, args)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Declare `id`, accepting an earlier declaration with the same signature
/// (several managers may share one registry).
fn declare(hooks: &HookRegistry, id: HookId, signature: HookSignature) -> Result<(), HookError> {
    match hooks.declare(id, signature) {
        Err(HookError::Duplicate(_)) if hooks.signature(id) == Some(signature) => Ok(()),
        other => other,
    }
}

/// Runs on the watch thread of subscription `generation`.
fn on_trigger(inner: &Weak<Inner>, generation: u64, trigger: Trigger) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    if inner.generation.load(Ordering::Acquire) != generation {
        debug!("watch"; "subscription {} superseded", generation);
        return;
    }

    match &trigger {
        Trigger::Changed(path) => debug!("watch"; "changed: {}", path.display()),
        Trigger::Failed(err) => status_warning(&format!("watcher failed, re-arming: {err}")),
    }

    let manager = TemplateManager { inner };
    match manager.recompile() {
        Ok(report) => status_success(&format!("recompiled {report}")),
        Err(err) => status_error("recompile failed", &err.detail()),
    }
}
