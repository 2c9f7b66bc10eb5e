use std::path::Path;
use std::path::PathBuf;

use globset::GlobBuilder;
use globset::GlobMatcher;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::InjectError;
use crate::InjectResult;

/// Enumerates files for the `import` verb.
pub trait FileFinder {
	/// Return the absolute paths of all files below `base_dir` whose file
	/// name matches `name_pattern`.
	fn find(&self, base_dir: &Path, name_pattern: &str) -> InjectResult<Vec<PathBuf>>;
}

/// Default [`FileFinder`]: walks `base_dir` recursively and matches each file
/// name against a glob, the same way `find <dir> -name <pattern>` does.
/// Symlinked directories are not followed.
#[derive(Debug, Clone, Default)]
pub struct GlobFinder {
	exclude: Vec<String>,
}

impl GlobFinder {
	/// Create a finder that skips anything matching the gitignore-style
	/// `exclude` patterns. Patterns are relative to the searched directory.
	pub fn new(exclude: Vec<String>) -> Self {
		Self { exclude }
	}
}

impl FileFinder for GlobFinder {
	fn find(&self, base_dir: &Path, name_pattern: &str) -> InjectResult<Vec<PathBuf>> {
		let matcher = build_name_matcher(name_pattern)?;
		let base_dir = std::path::absolute(base_dir)?;
		let exclude = build_exclude_matcher(&base_dir, &self.exclude)?;
		let mut files = Vec::new();

		walk_dir(&base_dir, &matcher, &exclude, &mut files)?;
		// Sort for deterministic ordering.
		files.sort();
		Ok(files)
	}
}

fn build_name_matcher(pattern: &str) -> InjectResult<GlobMatcher> {
	GlobBuilder::new(pattern)
		.literal_separator(true)
		.build()
		.map(|glob| glob.compile_matcher())
		.map_err(|e| {
			InjectError::InvalidPattern {
				pattern: pattern.to_string(),
				reason: e.to_string(),
			}
		})
}

fn build_exclude_matcher(root: &Path, patterns: &[String]) -> InjectResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			InjectError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| InjectError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

fn walk_dir(
	dir: &Path,
	matcher: &GlobMatcher,
	exclude: &Gitignore,
	files: &mut Vec<PathBuf>,
) -> InjectResult<()> {
	if !dir.is_dir() {
		return Ok(());
	}

	for entry in std::fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();
		let file_type = entry.file_type()?;
		let is_dir = file_type.is_dir();

		if exclude.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			walk_dir(&path, matcher, exclude, files)?;
		} else if entry
			.file_name()
			.to_str()
			.is_some_and(|name| matcher.is_match(name))
		{
			files.push(path);
		}
	}

	Ok(())
}
