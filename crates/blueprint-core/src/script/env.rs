//! Ordered variable environment shared with hooks and fill-ins

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Variable bound to the template root for every expansion
pub const SOURCE_DIR_VAR: &str = "source_directory";

/// Variable bound to the project root for every expansion
pub const TARGET_DIR_VAR: &str = "target_directory";

/// Ordered name → value bindings; later bindings shadow earlier ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    bindings: Vec<(String, String)>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.bindings.push((name.into(), value.into()));
    }

    /// Append every binding of `other` on top of this environment
    pub fn extend(&mut self, other: &Environment) {
        self.bindings.extend(other.bindings.iter().cloned());
    }

    /// Most recent value bound to `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All bindings in declaration order, shadowed ones included
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Visible bindings only, one per name, in first-declaration order
    pub fn resolved(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = Vec::new();
        for (name, _) in self.iter() {
            if !out.iter().any(|(n, _)| *n == name) {
                if let Some(value) = self.get(name) {
                    out.push((name, value));
                }
            }
        }
        out
    }
}

fn variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_-]*)\}").expect("valid regex"))
}

/// Replace `${name}` with `lookup(name)`; unresolved names are reported
pub fn interpolate(
    input: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, String> {
    let mut missing = None;
    let output = variable_regex().replace_all(input, |caps: &Captures<'_>| {
        let name = &caps[1];
        match lookup(name) {
            Some(value) => value,
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(name) => Err(name),
        None => Ok(output.into_owned()),
    }
}
