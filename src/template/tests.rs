use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{Map, Value as Json, json};
use tempfile::TempDir;

use super::*;
use crate::config::{TemplatesConfig, WatchConfig};
use crate::hook::{HookError, HookRegistry};

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn manager(root: &Path) -> TemplateManager {
    TemplateManager::new(
        TemplatesConfig::with_root(root),
        WatchConfig::disabled(),
        Arc::new(HookRegistry::new()),
    )
    .unwrap()
}

fn args(value: Json) -> Map<String, Json> {
    match value {
        Json::Object(map) => map,
        _ => Map::new(),
    }
}

fn render(manager: &TemplateManager, name: &str, data: Json) -> Result<String, TemplateError> {
    manager.render_to_string(&RequestContext::default(), name, args(data))
}

#[test]
fn test_cross_reference() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "<main>{{> b.tmpl}}</main>");
    write(temp.path(), "b.tmpl", "hello {{name}}");

    let manager = manager(temp.path());
    let report = manager.recompile().unwrap();
    assert_eq!(report.templates, 2);
    assert_eq!(manager.phase(), Phase::Installed);

    let html = render(&manager, "a.tmpl", json!({"name": "vellum"})).unwrap();
    assert_eq!(html, "<main>hello vellum</main>");
}

#[test]
fn test_static_emission_is_not_repeated() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "static/page.tmpl", "hello");

    let manager = manager(temp.path());
    let first = manager.recompile().unwrap();
    assert_eq!(first.emitted, 1);
    assert_eq!(
        fs::read_to_string(temp.path().join("static/_page.tmpl")).unwrap(),
        "hello"
    );

    let second = manager.recompile().unwrap();
    assert_eq!(second.emitted, 0);
    assert_eq!(second.statics, 2);
    assert!(!temp.path().join("static/__page.tmpl").exists());

    // Static templates are not part of the request-time set
    assert!(manager.lookup("static/page.tmpl").is_none());
}

#[test]
fn test_static_templates_have_no_helpers() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "static/page.tmpl", "[{{antiClickjacking}}]");

    manager(temp.path()).recompile().unwrap();
    // Resolved as a missing variable instead of the helper
    assert_eq!(
        fs::read_to_string(temp.path().join("static/_page.tmpl")).unwrap(),
        "[]"
    );
}

#[test]
fn test_parse_error_keeps_installed_set() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "ok");

    let manager = manager(temp.path());
    manager.recompile().unwrap();

    write(temp.path(), "a.tmpl", "{{#if}}broken");
    let err = manager.recompile().unwrap_err();
    assert!(matches!(err, TemplateError::Parse { ref name, .. } if name == "a.tmpl"));
    assert_eq!(manager.phase(), Phase::Idle);

    assert_eq!(render(&manager, "a.tmpl", json!({})).unwrap(), "ok");
}

#[test]
fn test_failed_first_compile_installs_nothing() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "{{/each}}");

    let manager = manager(temp.path());
    assert!(manager.recompile().is_err());
    assert!(manager.template_names().is_empty());
    assert!(matches!(
        render(&manager, "a.tmpl", json!({})),
        Err(TemplateError::NotFound(_))
    ));
}

#[test]
fn test_not_found() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "a");

    let manager = manager(temp.path());
    manager.recompile().unwrap();

    let err = render(&manager, "missing.tmpl", json!({})).unwrap_err();
    assert_eq!(err.to_string(), "can't find template 'missing.tmpl'");
}

#[test]
fn test_lookup_is_case_and_separator_insensitive() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Blog/Post.tmpl", "post");

    let manager = manager(temp.path());
    manager.recompile().unwrap();

    assert_eq!(manager.template_names(), ["blog/post.tmpl"]);
    for name in ["blog/post.tmpl", "BLOG/Post.TMPL", "blog\\post.tmpl", "/blog/post.tmpl"] {
        let template = manager.lookup(name).unwrap();
        assert_eq!(template.name(), "blog/post.tmpl");
    }
}

#[test]
fn test_reserved_dirs_are_skipped() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "a");
    write(temp.path(), ".hidden/b.tmpl", "b");
    write(temp.path(), "_static/c.tmpl", "c");
    write(temp.path(), "_partials/d.tmpl", "d");
    write(temp.path(), "_e.tmpl", "e");

    let manager = manager(temp.path());
    manager.recompile().unwrap();
    assert_eq!(manager.template_names(), ["a.tmpl"]);
}

#[test]
fn test_new_files_appear_after_recompile() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "a");

    let manager = manager(temp.path());
    manager.recompile().unwrap();
    let old = manager.lookup("a.tmpl").unwrap();

    write(temp.path(), "b.tmpl", "b");
    manager.recompile().unwrap();

    assert!(manager.lookup("b.tmpl").is_some());
    // Templates looked up earlier keep rendering from their own snapshot
    assert!(!old.set().contains("b.tmpl"));
    let mut out = Vec::new();
    old.render(&json!({}), &mut out).unwrap();
    assert_eq!(out, b"a");
}

#[test]
fn test_before_parse_chain() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "body");
    write(temp.path(), "static/s.tmpl", "static");

    let manager = manager(temp.path());
    manager
        .on_before_parse(|_, name, source| {
            let mut out = format!("[{name}]").into_bytes();
            out.extend(source);
            out
        })
        .unwrap();
    manager
        .on_before_parse(|_, _, mut source| {
            source.extend_from_slice(b"!");
            source
        })
        .unwrap();

    manager.recompile().unwrap();
    assert_eq!(render(&manager, "a.tmpl", json!({})).unwrap(), "[a.tmpl]body!");
    // Static sources are not transformed
    assert_eq!(
        fs::read_to_string(temp.path().join("static/_s.tmpl")).unwrap(),
        "static"
    );
}

#[test]
fn test_before_render_edits_args() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "{{lang}} {{template}} {{count}}");

    let manager = manager(temp.path());
    manager
        .on_before_render(|req, _, template, args| {
            let lang = req.header("accept-language").unwrap_or("en");
            args.insert("lang".into(), json!(lang));
            args.insert("template".into(), json!(template.name()));
        })
        .unwrap();
    manager
        .on_before_render(|_, _, _, args| {
            let count = args.get("count").and_then(Json::as_i64).unwrap_or(0);
            args.insert("count".into(), json!(count + 1));
        })
        .unwrap();
    manager.recompile().unwrap();

    let req = RequestContext::new("GET", "/").with_header("Accept-Language", "fr");
    let html = manager
        .render_to_string(&req, "a.tmpl", args(json!({"count": 41})))
        .unwrap();
    assert_eq!(html, "fr a.tmpl 42");
}

#[test]
fn test_execution_error_names_template() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "{{url \"home\"}}");

    let manager = manager(temp.path());
    manager.recompile().unwrap();

    let err = render(&manager, "a.tmpl", json!({})).unwrap_err();
    assert!(matches!(err, TemplateError::Execution { ref name, .. } if name == "a.tmpl"));
    assert!(err.detail().contains("no router configured"));
}

#[test]
fn test_helpers_snapshot_per_compilation() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "{{shout}}");

    let manager = manager(temp.path());
    manager.recompile().unwrap();
    manager.add_helper("shout", |_, _, _, _, out| {
        out.write("HEY")?;
        Ok(())
    });
    assert_eq!(render(&manager, "a.tmpl", json!({})).unwrap(), "");

    manager.recompile().unwrap();
    assert_eq!(render(&manager, "a.tmpl", json!({})).unwrap(), "HEY");
}

#[test]
fn test_managers_share_hook_points() {
    let temp = TempDir::new().unwrap();
    let hooks = Arc::new(HookRegistry::new());
    let config = TemplatesConfig::with_root(temp.path());

    let first =
        TemplateManager::new(config.clone(), WatchConfig::disabled(), Arc::clone(&hooks)).unwrap();
    TemplateManager::new(config, WatchConfig::disabled(), Arc::clone(&hooks)).unwrap();

    first.on_before_parse(|_, _, source| source).unwrap();
    assert_eq!(hooks.len(TM_BEFORE_PARSE), 1);
}

#[test]
fn test_conflicting_hook_declaration_fails() {
    let hooks = Arc::new(HookRegistry::new());
    hooks
        .declare(
            TM_BEFORE_RENDER,
            crate::hook::HookSignature::callback::<BeforeParseFn>(),
        )
        .unwrap();

    let result = TemplateManager::new(
        TemplatesConfig::default(),
        WatchConfig::disabled(),
        hooks,
    );
    assert!(matches!(result, Err(HookError::Duplicate(id)) if id == TM_BEFORE_RENDER));
}

#[test]
fn test_watch_disabled_creates_no_subscription() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "a");

    let manager = manager(temp.path());
    manager.recompile().unwrap();
    assert!(!manager.is_watching());
}

#[test]
fn test_root_with_reserved_name_is_compiled() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("_site");
    write(&root, "a.tmpl", "a");
    write(&root, "_partials/b.tmpl", "b");

    let manager = manager(&root);
    let report = manager.recompile().unwrap();
    assert_eq!(report.templates, 1);
    assert_eq!(manager.template_names(), ["a.tmpl"]);
}

#[test]
fn test_failed_compile_writes_no_static_output() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "static/page.tmpl", "hello");
    write(temp.path(), "z.tmpl", "{{#if}}broken");

    let manager = manager(temp.path());
    assert!(manager.recompile().is_err());
    // Static pages are only written once the whole tree has parsed
    assert!(!temp.path().join("static/_page.tmpl").exists());

    write(temp.path(), "z.tmpl", "fixed");
    assert_eq!(manager.recompile().unwrap().emitted, 1);
    assert!(temp.path().join("static/_page.tmpl").exists());
}

fn wait_for(mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    check()
}

#[test]
fn test_watch_recompiles_on_change() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.tmpl", "one");

    let watch = WatchConfig {
        enable: true,
        settle_ms: 20,
    };
    let manager = TemplateManager::new(
        TemplatesConfig::with_root(temp.path()),
        watch,
        Arc::new(HookRegistry::new()),
    )
    .unwrap();
    manager.recompile().unwrap();
    assert!(manager.is_watching());

    let renders = |name: &str, expected: &str| {
        wait_for(|| render(&manager, name, json!({})).is_ok_and(|html| html == expected))
    };

    write(temp.path(), "a.tmpl", "two");
    assert!(renders("a.tmpl", "two"));

    // A new directory triggers a recompile that starts watching it
    fs::create_dir(temp.path().join("sub")).unwrap();
    write(temp.path(), "sub/b.tmpl", "b1");
    assert!(renders("sub/b.tmpl", "b1"));

    write(temp.path(), "sub/b.tmpl", "b2");
    assert!(renders("sub/b.tmpl", "b2"));
    assert!(manager.is_watching());
}
