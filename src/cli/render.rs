//! `render`: compile and render a single template to stdout.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value as Json};
use vellum::RequestContext;
use vellum::config::Config;

pub fn render(config: &Config, name: &str, data: Option<&Path>) -> Result<()> {
    let args = match data {
        Some(path) => read_data(path)?,
        None => Map::new(),
    };

    let manager = super::manager(config)?;
    manager.recompile().context("compilation failed")?;

    let request = RequestContext::new("GET", format!("/{name}"));
    let mut stdout = io::stdout().lock();
    manager.render(&mut stdout, &request, name, args)?;
    stdout.flush()?;
    Ok(())
}

/// Read a JSON object from `path`.
fn read_data(path: &Path) -> Result<Map<String, Json>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value: Json = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;

    match value {
        Json::Object(map) => Ok(map),
        other => bail!(
            "render data in {} must be a JSON object, found {}",
            path.display(),
            kind(&other)
        ),
    }
}

fn kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
