//! Blueprint Core - template expansion engine for project scaffolding
//!
//! A template is a directory of files. Expanding it into a new project
//! directory goes through three layers:
//!
//! - **Mapping** - discover the template's files and compute where each one
//!   lands, honoring the `.keep`, `.nocopy`, and `.fill` markers
//! - **Scripts** - declarative customization (`.blueprint.yaml` or
//!   [`Script`] values built in code) that reshapes the mapping and
//!   registers phase hooks
//! - **Session** - fill-in files are presented one at a time; each can be
//!   completed or deferred to the back of the queue
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based prompts and fill-in engine
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use blueprint_core::{Expansion, Script, Step};
//!
//! let expanded = Expansion::new("templates/rust/lib", "my-lib")
//!     .script(Script::new().ignore("*.bak"))
//!     .run()
//!     .await?;
//!
//! let mut step = expanded.step;
//! while let Step::Presenting(surface) = step {
//!     step = surface.advance()?;
//! }
//! ```

pub mod error;
pub mod mapping;
pub mod script;
pub mod session;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use mapping::{IgnorePattern, Mapping, MappingEntry, RelPath};
pub use script::{Environment, Hook, Phase, Script, ScriptContext};
pub use session::{FillInEngine, PlaceholderEngine, Session, State, Step, Surface};
pub use templates::{expand, Catalog, ExpandReport, Expanded, Expansion, TemplateRef};

#[cfg(feature = "tui")]
pub use tui::run;
