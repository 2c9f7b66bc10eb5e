use std::path::PathBuf;

use crate::Position;
use crate::Verb;

/// Something that happened while substituting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubstituteEvent {
	/// A tag was replaced by the output of its verb.
	TagResolved {
		/// File containing the tag.
		file: PathBuf,
		verb: Verb,
		src: String,
		position: Position,
	},
	/// A tag could not be resolved and was replaced by a commented-out copy
	/// of itself.
	TagFailed {
		/// File containing the tag.
		file: PathBuf,
		/// The tag text without indentation.
		tag: String,
		position: Position,
		message: String,
	},
	/// A file was registered as a build dependency of `resource`.
	DependencyAdded {
		/// The top-level resource being substituted.
		resource: PathBuf,
		dependency: PathBuf,
	},
	/// The `import` verb produced `count` statements for `pattern`.
	ImportsGenerated {
		file: PathBuf,
		pattern: String,
		count: usize,
	},
}

/// Receives [`SubstituteEvent`]s as a substitution runs.
pub trait Reporter {
	fn report(&mut self, event: &SubstituteEvent);
}

/// Collects events, mostly useful in tests.
impl Reporter for Vec<SubstituteEvent> {
	fn report(&mut self, event: &SubstituteEvent) {
		self.push(event.clone());
	}
}

/// Forwards events to `tracing`. Failures are warnings; everything else is
/// debug output except the import summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
	fn report(&mut self, event: &SubstituteEvent) {
		match event {
			SubstituteEvent::TagResolved {
				file,
				verb,
				src,
				position,
			} => {
				tracing::debug!(
					file = %file.display(),
					line = position.line,
					column = position.column,
					"resolved webpack-{verb} `{src}`"
				);
			}
			SubstituteEvent::TagFailed {
				file,
				tag,
				position,
				message,
			} => {
				tracing::warn!(
					file = %file.display(),
					offset = position.offset,
					line = position.line,
					column = position.column,
					"could not resolve {tag}: {message}"
				);
			}
			SubstituteEvent::DependencyAdded {
				resource,
				dependency,
			} => {
				tracing::debug!(
					resource = %resource.display(),
					"added dependency {}",
					dependency.display()
				);
			}
			SubstituteEvent::ImportsGenerated {
				file,
				pattern,
				count,
			} => {
				tracing::info!(
					file = %file.display(),
					"generated {count} import(s) for `{pattern}`"
				);
			}
		}
	}
}
