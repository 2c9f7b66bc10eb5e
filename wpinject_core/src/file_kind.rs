use std::path::Path;

use crate::InjectError;
use crate::InjectResult;

/// Extensions that receive `import "...";` statements instead of
/// `@import "...";`.
pub const DEFAULT_SCRIPT_EXTENSIONS: [&str; 4] = ["js", "ts", "tsx", "jsx"];

/// Comment syntax used to neutralise a tag that could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
	/// `<!-- ... -->`
	Html,
	/// `/* ... */`
	Block,
}

impl CommentStyle {
	/// Pick the comment style for a resource. Fails when the path has no
	/// extension since there is nothing to decide from.
	pub fn for_resource(resource_path: &Path) -> InjectResult<Self> {
		let extension = resource_extension(resource_path)
			.ok_or_else(|| InjectError::MissingExtension(resource_path.display().to_string()))?;

		if extension.eq_ignore_ascii_case("html") {
			Ok(Self::Html)
		} else {
			Ok(Self::Block)
		}
	}

	/// Wrap `text` in a comment. Sequences that would end the comment early
	/// are broken up: `--` becomes `- -` in HTML and `*/` becomes `*\/`
	/// elsewhere.
	pub fn wrap(self, text: &str) -> String {
		match self {
			Self::Html => format!("<!-- {} -->", break_double_dashes(text)),
			Self::Block => format!("/* {} */", text.replace("*/", "*\\/")),
		}
	}
}

/// Wrap `text` in the comment syntax of `resource_path`.
pub fn wrap_in_comment(text: &str, resource_path: &Path) -> InjectResult<String> {
	Ok(CommentStyle::for_resource(resource_path)?.wrap(text))
}

/// Statement form emitted by the `import` verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSyntax {
	/// `import "path";`
	Script,
	/// `@import "path";`
	Stylesheet,
}

impl ImportSyntax {
	pub fn for_resource(resource_path: &Path, script_extensions: &[String]) -> Self {
		let is_script = resource_extension(resource_path).is_some_and(|extension| {
			script_extensions
				.iter()
				.any(|script| script.eq_ignore_ascii_case(extension))
		});

		if is_script {
			Self::Script
		} else {
			Self::Stylesheet
		}
	}

	pub fn statement(self, path: &str) -> String {
		match self {
			Self::Script => format!("import \"{path}\";"),
			Self::Stylesheet => format!("@import \"{path}\";"),
		}
	}
}

fn break_double_dashes(text: &str) -> String {
	let mut output = String::with_capacity(text.len());
	let mut previous = None;

	for character in text.chars() {
		if character == '-' && previous == Some('-') {
			output.push(' ');
		}
		output.push(character);
		previous = Some(character);
	}

	output
}

fn resource_extension(path: &Path) -> Option<&str> {
	path.extension()
		.and_then(|extension| extension.to_str())
		.filter(|extension| !extension.is_empty())
}
