//! `wpinject_core` is the engine behind `wpinject`,
//! a build-time preprocessor that replaces placeholder tags with file
//! contents or generated import statements.
//!
//! ## Tags
//!
//! ```html
//! <webpack-inject src="./partials/nav.html" />
//! <webpack-import src='./components/*.scss'>
//! ```
//!
//! - `inject` is replaced by the trimmed contents of the referenced file. The
//!   file is registered as a dependency of the resource being processed.
//! - `import` is replaced by one statement per file matching the pattern:
//!   `import "...";` in scripts (`js`, `ts`, `tsx`, `jsx`), `@import "...";`
//!   everywhere else.
//!
//! Replacements are processed again with the referenced file as the owning
//! resource, so injected files can contain tags of their own. A tag that
//! starts a line passes its indentation on to every line of its replacement.
//! A tag that cannot be resolved is commented out (`<!-- -->` in `.html`,
//! `/* */` elsewhere) and reported, and the rest of the document is still
//! processed.
//!
//! ## Modules
//!
//! - [`config`]: `wpinject.toml` discovery and [`SubstituteOptions`].
//! - [`tag`]: the tag scanner, [`TagMatch`] and [`Verb`].
//! - [`finder`]: the [`FileFinder`] port and the default [`GlobFinder`].
//! - [`reporter`]: the [`Reporter`] port, [`SubstituteEvent`] and
//!   [`TracingReporter`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! let page = std::fs::read_to_string("src/index.html").unwrap();
//! let result = wpinject_core::substitute(&page, Path::new("src/index.html")).unwrap();
//!
//! println!("{}", result.output);
//! for dependency in &result.dependencies {
//! 	eprintln!("depends on {}", dependency.display());
//! }
//! ```

pub use config::*;
pub use engine::*;
pub use error::*;
pub use file_kind::*;
pub use finder::*;
pub use reporter::*;
pub use tag::*;

pub mod config;
mod engine;
#[allow(unused_assignments)]
mod error;
mod file_kind;
pub mod finder;
pub mod reporter;
pub mod tag;

#[cfg(test)]
mod __fixtures;
