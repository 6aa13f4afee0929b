//! Error types for template expansion

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for blueprint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving, expanding, or filling in a template
#[derive(Debug, Error)]
pub enum Error {
    /// The target project directory already exists; nothing was written
    #[error("destination already exists: {}", path.display())]
    DestinationExists { path: PathBuf },

    /// A user- or script-supplied path could not be normalized
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// An ignore pattern has invalid glob syntax
    #[error("invalid ignore pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The customization script failed; the expansion was aborted.
    ///
    /// Files written before the failure are left in place.
    #[error("template script failed: {0:#}")]
    ScriptFailure(anyhow::Error),

    /// A phase hook failed
    #[error("{phase} hook '{name}' failed: {cause:#}")]
    HookFailure {
        phase: &'static str,
        name: String,
        cause: anyhow::Error,
    },

    /// The fill-in engine failed to present a surface
    #[error("fill-in of {} failed: {cause:#}", destination.display())]
    FillIn {
        destination: PathBuf,
        cause: anyhow::Error,
    },

    /// `defer` was requested by a surface that is not being presented
    #[error("nothing left to defer")]
    NothingToDefer,

    /// Filesystem error, tagged with the path that caused it
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The customization script file could not be parsed
    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
