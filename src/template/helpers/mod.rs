//! Helper functions available in every normal template.
//!
//! | Helper             | Usage                                      |
//! |--------------------|--------------------------------------------|
//! | `antiClickjacking` | `{{antiClickjacking}}`                     |
//! | `set`              | `{{set "title" "Home"}}` (outputs nothing) |
//! | `array`            | `{{#each (array "a" "b")}}...{{/each}}`    |
//! | `toHtml`           | `{{toHtml body}}` (no escaping)            |
//! | `url`              | `{{url "post.show" post.id}}`              |
//! | `since`            | `{{since post.created}}`                   |
//! | `paginate`         | `{{paginate page pages 2 "/posts"}}`       |
//!
//! Static templates get none of these.

mod paginate;
mod since;

use std::sync::Arc;

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason,
    handlebars_helper, html_escape,
};
use serde_json::Value as Json;

pub use paginate::paginate;
pub use since::{format_since, timestamp};

/// Signature of helpers added with `TemplateManager::add_helper`.
pub type HelperFn = dyn Fn(&Helper, &Handlebars, &Context, &mut RenderContext, &mut dyn Output) -> HelperResult
    + Send
    + Sync;

/// Reverse routing, provided by the router that owns the URL table.
pub trait UrlReverser: Send + Sync {
    /// URL of route `name` with `args` filled in, or `None` if unknown.
    fn reverse(&self, name: &str, args: &[Json]) -> Option<String>;
}

const ANTI_CLICKJACKING: &str =
    "<style id=\"antiClickjack\">body{display:none !important;}</style>";

/// Helpers injected into a compiled set.
///
/// Cloned at the start of each compilation, so changes only take effect
/// on the next one.
#[derive(Clone, Default)]
pub struct HelperTable {
    custom: Vec<(String, Arc<HelperFn>)>,
    url: Option<Arc<dyn UrlReverser>>,
}

impl HelperTable {
    pub fn insert(&mut self, name: &str, helper: Arc<HelperFn>) {
        self.custom.retain(|(existing, _)| existing != name);
        self.custom.push((name.to_owned(), helper));
    }

    pub fn set_url_reverser(&mut self, reverser: Arc<dyn UrlReverser>) {
        self.url = Some(reverser);
    }

    /// Register the built-in helpers, then the custom ones (which may
    /// override a built-in of the same name).
    pub fn register(&self, registry: &mut Handlebars<'static>) {
        registry.register_helper("antiClickjacking", Box::new(anti_clickjacking_helper));
        registry.register_helper("set", Box::new(set_helper));
        registry.register_helper("array", Box::new(array));
        registry.register_helper("toHtml", Box::new(to_html_helper));
        registry.register_helper("since", Box::new(since::since_helper));
        registry.register_helper("paginate", Box::new(paginate::paginate_helper));

        let reverser = self.url.clone();
        registry.register_helper(
            "url",
            Box::new(
                move |h: &Helper,
                      _: &Handlebars,
                      _: &Context,
                      _: &mut RenderContext,
                      out: &mut dyn Output|
                      -> HelperResult {
                    let name = h
                        .param(0)
                        .and_then(|p| p.value().as_str())
                        .ok_or(RenderErrorReason::ParamNotFoundForIndex("url", 0))?;
                    let args: Vec<Json> = h.params()[1..]
                        .iter()
                        .map(|p| p.value().clone())
                        .collect();

                    let reverser = reverser.as_ref().ok_or_else(|| {
                        RenderErrorReason::Other("url: no router configured".into())
                    })?;
                    let url = reverser.reverse(name, &args).ok_or_else(|| {
                        RenderErrorReason::Other(format!("url: no route named '{name}'"))
                    })?;

                    out.write(&html_escape(&url))?;
                    Ok(())
                },
            ),
        );

        for (name, helper) in &self.custom {
            let helper = Arc::clone(helper);
            registry.register_helper(
                name,
                Box::new(
                    move |h: &Helper,
                          r: &Handlebars,
                          ctx: &Context,
                          rc: &mut RenderContext,
                          out: &mut dyn Output|
                          -> HelperResult { helper(h, r, ctx, rc, out) },
                ),
            );
        }
    }
}

handlebars_helper!(array: |*args| args.into_iter().cloned().collect::<Vec<Json>>());

fn anti_clickjacking_helper(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(ANTI_CLICKJACKING)?;
    Ok(())
}

/// Writes the first parameter as-is, bypassing escaping.
fn to_html_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    match h.param(0).map(|p| p.value()) {
        Some(Json::String(s)) => out.write(s)?,
        Some(Json::Null) | None => {}
        Some(other) => out.write(&other.to_string())?,
    }
    Ok(())
}

/// Inserts `key = value` into the data of the current render.
fn set_helper(
    h: &Helper,
    _: &Handlebars,
    ctx: &Context,
    rc: &mut RenderContext,
    _: &mut dyn Output,
) -> HelperResult {
    let key = h
        .param(0)
        .and_then(|p| p.value().as_str())
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("set", 0))?;
    let value = h.param(1).map_or(Json::Null, |p| p.value().clone());

    let mut data = match rc.context() {
        Some(current) => current.data().clone(),
        None => ctx.data().clone(),
    };
    let Some(map) = data.as_object_mut() else {
        return Ok(());
    };
    map.insert(key.to_owned(), value);

    rc.set_context(Context::wraps(data)?);
    Ok(())
}
