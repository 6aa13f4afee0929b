//! Fill-in engines and the placeholder syntax they share
//!
//! Placeholders look like `${name}` or `${name:default}`; `\$` produces a
//! literal dollar sign.

use super::Surface;
use anyhow::Context;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Renders a fill-in body into a surface
///
/// `render` only has to set the surface up; the user keeps interacting with
/// it afterwards and eventually calls [`Surface::advance`] or
/// [`Surface::defer`].
pub trait FillInEngine: Send + Sync {
    fn render(&self, surface: &Surface, body: &str) -> anyhow::Result<()>;

    /// Present a deferred surface again
    fn resume(&self, _surface: &Surface) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A piece of a fill-in body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Field {
        name: &'a str,
        default: Option<&'a str>,
    },
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\\\$|\$\{([A-Za-z_][A-Za-z0-9_-]*)(?::([^}]*))?\}").expect("valid regex")
    })
}

/// Split `body` into literal text and placeholders
pub fn parse(body: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in placeholder_regex().captures_iter(body) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            segments.push(Segment::Text(&body[last..whole.start()]));
        }
        match caps.get(1) {
            Some(name) => segments.push(Segment::Field {
                name: name.as_str(),
                default: caps.get(2).map(|m| m.as_str()),
            }),
            // escaped dollar: keep the "$" only
            None => segments.push(Segment::Text(&body[whole.start() + 1..whole.end()])),
        }
        last = whole.end();
    }
    if last < body.len() {
        segments.push(Segment::Text(&body[last..]));
    }
    segments
}

/// Distinct fields of `body` with their first default, in order of appearance
pub fn fields(body: &str) -> Vec<(&str, Option<&str>)> {
    let mut out: Vec<(&str, Option<&str>)> = Vec::new();
    for segment in parse(body) {
        if let Segment::Field { name, default } = segment {
            if !out.iter().any(|(n, _)| *n == name) {
                out.push((name, default));
            }
        }
    }
    out
}

/// Render `body`, asking `value` for each placeholder
pub fn render(body: &str, mut value: impl FnMut(&str, Option<&str>) -> String) -> String {
    let mut out = String::with_capacity(body.len());
    for segment in parse(body) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Field { name, default } => out.push_str(&value(name, default)),
        }
    }
    out
}

/// Write rendered content, creating missing parent directories
pub fn write_output(destination: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(destination, content)
        .with_context(|| format!("Failed to write file: {}", destination.display()))
}

/// Non-interactive engine: fills every placeholder from the surface
/// environment, falling back to its default, then to an empty string, and
/// writes the destination right away.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEngine;

impl FillInEngine for PlaceholderEngine {
    fn render(&self, surface: &Surface, body: &str) -> anyhow::Result<()> {
        let env = surface.environment();
        let content = render(body, |name, default| {
            env.get(name)
                .or(default)
                .unwrap_or_default()
                .to_string()
        });
        write_output(surface.destination(), &content)
    }
}
