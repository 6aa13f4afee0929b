//! Relative path normalization
//!
//! Every path that enters a [`Mapping`](super::Mapping) goes through
//! [`RelPath::parse`] first, so comparisons work on segments instead of raw
//! strings and the destination filesystem's separator only shows up when a
//! path is joined onto a root.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A normalized path relative to a template or project root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelPath {
    segments: Vec<String>,
    dir: bool,
}

impl RelPath {
    /// Normalize a user- or script-supplied path.
    ///
    /// Accepts `/` and the host separator. Empty and `.` segments are dropped,
    /// a trailing separator marks the path as a directory, and `..` is
    /// rejected. Leading separators are ignored since every path is relative.
    pub fn parse(input: &str) -> Result<Self> {
        let dir = input.ends_with('/') || input.ends_with(std::path::MAIN_SEPARATOR);
        let mut segments = Vec::new();

        for segment in input.split(|c| c == '/' || c == std::path::MAIN_SEPARATOR) {
            match segment {
                "" | "." => {}
                ".." => return Err(Error::invalid_path(input, "'..' is not allowed")),
                s => segments.push(s.to_string()),
            }
        }

        // "." and "" name the root itself
        let dir = dir || segments.is_empty();
        Ok(Self { segments, dir })
    }

    /// Convert a path relative to some root (as produced by a directory walk)
    pub fn from_relative(path: &Path, dir: bool) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(s) => segments.push(s.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => {
                    return Err(Error::invalid_path(
                        &path.to_string_lossy(),
                        "expected a relative path without '..'",
                    ))
                }
            }
        }
        Ok(Self {
            dir: dir || segments.is_empty(),
            segments,
        })
    }

    /// The root itself
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
            dir: true,
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_dir(&self) -> bool {
        self.dir
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Same location on disk, regardless of file/directory kind
    pub fn same_location(&self, other: &RelPath) -> bool {
        self.segments == other.segments
    }

    /// Segment-wise prefix test: `src` contains `src/a` but not `srcs/a`
    pub fn starts_with(&self, prefix: &RelPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// The segments remaining after `prefix`, if this path lies under it
    pub fn strip_prefix(&self, prefix: &RelPath) -> Option<&[String]> {
        self.segments.strip_prefix(prefix.segments.as_slice())
    }

    /// Append `rest` to this path; the result takes the kind given by `dir`
    pub fn join(&self, rest: &[String], dir: bool) -> RelPath {
        let mut segments = self.segments.clone();
        segments.extend(rest.iter().cloned());
        RelPath {
            dir: dir || segments.is_empty(),
            segments,
        }
    }

    /// Replace the last segment
    pub fn with_file_name(&self, name: &str) -> RelPath {
        let mut segments = self.segments.clone();
        segments.pop();
        segments.push(name.to_string());
        RelPath {
            segments,
            dir: self.dir,
        }
    }

    /// The same path marked as a directory
    pub fn into_dir(mut self) -> RelPath {
        self.dir = true;
        self
    }

    /// Resolve against `root` using the host separator
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, ".");
        }
        write!(f, "{}", self.segments.join("/"))?;
        if self.dir {
            write!(f, "/")?;
        }
        Ok(())
    }
}
