use std::collections::BTreeSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::GlobFinder;
use crate::ImportSyntax;
use crate::InjectError;
use crate::InjectResult;
use crate::SubstituteEvent;
use crate::TagMatch;
use crate::TracingReporter;
use crate::Verb;
use crate::config::ImportPathStyle;
use crate::config::SubstituteOptions;
use crate::file_kind::wrap_in_comment;
use crate::finder::FileFinder;
use crate::reporter::Reporter;
use crate::tag::find_tags;

/// Where injected files are registered so the host can rebuild the resource
/// when one of them changes.
pub trait DependencySink {
	fn add_dependency(&mut self, path: &Path);
}

impl DependencySink for Vec<PathBuf> {
	fn add_dependency(&mut self, path: &Path) {
		if !self.iter().any(|existing| existing == path) {
			self.push(path.to_path_buf());
		}
	}
}

impl DependencySink for BTreeSet<PathBuf> {
	fn add_dependency(&mut self, path: &Path) {
		self.insert(path.to_path_buf());
	}
}

/// Output of [`substitute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
	/// The document with every tag replaced.
	pub output: String,
	/// Files injected into the document, in the order they were first read.
	pub dependencies: Vec<PathBuf>,
	/// Number of tags that were replaced by a commented-out copy of
	/// themselves, nested tags included.
	pub failed_tags: usize,
}

/// Substitute every tag in `contents` using the default options, the
/// [`GlobFinder`] and a [`TracingReporter`].
pub fn substitute(contents: &str, resource_path: &Path) -> InjectResult<Substitution> {
	substitute_with_options(
		contents,
		resource_path,
		&SubstituteOptions::default(),
		&GlobFinder::default(),
	)
}

/// Substitute every tag in `contents` with explicit options and finder.
/// Events go to a [`TracingReporter`].
pub fn substitute_with_options(
	contents: &str,
	resource_path: &Path,
	options: &SubstituteOptions,
	finder: &dyn FileFinder,
) -> InjectResult<Substitution> {
	let mut reporter = TracingReporter;
	let mut dependencies: Vec<PathBuf> = Vec::new();
	let mut substitutor =
		Substitutor::new(options.clone(), finder, &mut reporter, &mut dependencies);
	let output = substitutor.substitute(contents, resource_path)?;
	let failed_tags = substitutor.failed_tags();

	Ok(Substitution {
		output,
		dependencies,
		failed_tags,
	})
}

/// Replaces `<webpack-*>` tags in a document, recursing into whatever each
/// tag produces.
///
/// Relative `src` values always resolve against the directory of the file
/// that contains the tag. For a nested pass that file is the injected file
/// itself (or, for `import`, the resolved pattern path).
pub struct Substitutor<'a> {
	options: SubstituteOptions,
	finder: &'a dyn FileFinder,
	reporter: &'a mut dyn Reporter,
	dependencies: &'a mut dyn DependencySink,
	resource: PathBuf,
	failed_tags: usize,
}

impl<'a> Substitutor<'a> {
	pub fn new(
		options: SubstituteOptions,
		finder: &'a dyn FileFinder,
		reporter: &'a mut dyn Reporter,
		dependencies: &'a mut dyn DependencySink,
	) -> Self {
		Self {
			options,
			finder,
			reporter,
			dependencies,
			resource: PathBuf::new(),
			failed_tags: 0,
		}
	}

	/// Substitute all tags in `contents`, which belongs to `resource_path`.
	///
	/// A tag that cannot be resolved is replaced by a commented-out copy of
	/// itself. The only error returned is a failure to pick a comment style
	/// for that fallback, which aborts the pass.
	pub fn substitute(&mut self, contents: &str, resource_path: &Path) -> InjectResult<String> {
		self.resource = resource_path.to_path_buf();
		self.substitute_nested(contents, resource_path, 0)
	}

	/// Read `path` and substitute its contents.
	pub fn substitute_file(&mut self, path: &Path) -> InjectResult<String> {
		let contents = std::fs::read_to_string(path)?;
		self.substitute(&contents, path)
	}

	/// Tags that fell back to a comment since this substitutor was created.
	pub fn failed_tags(&self) -> usize {
		self.failed_tags
	}

	fn substitute_nested(
		&mut self,
		contents: &str,
		resource_path: &Path,
		depth: usize,
	) -> InjectResult<String> {
		// Tags are collected once. Tags that a replacement brings into this
		// level are only resolved by the nested pass over that replacement.
		let tags = find_tags(contents);
		let mut document = contents.to_string();
		// Splices never look behind the previous replacement, which may
		// itself contain the text of a later tag.
		let mut cursor = 0;

		for tag in &tags {
			let replacement = match self.resolve_tag(tag, resource_path, depth) {
				Ok(replacement) => replacement,
				Err(error) => {
					self.failed_tags += 1;
					self.reporter.report(&SubstituteEvent::TagFailed {
						file: resource_path.to_path_buf(),
						tag: tag.tag().to_string(),
						position: tag.position,
						message: error.to_string(),
					});
					wrap_in_comment(tag.tag(), resource_path)?
				}
			};

			let replacement = match &tag.indent {
				Some(indent) => indent_lines(&replacement, indent),
				None => replacement,
			};

			// Earlier replacements shift offsets, so splice by text.
			let Some(found) = document[cursor..].find(&tag.text) else {
				continue;
			};
			let start = cursor + found;
			document.replace_range(start..start + tag.text.len(), &replacement);
			cursor = start + replacement.len();
		}

		Ok(document)
	}

	fn resolve_tag(
		&mut self,
		tag: &TagMatch,
		resource_path: &Path,
		depth: usize,
	) -> InjectResult<String> {
		let verb = tag.verb()?;
		let target = normalize_path(&resource_dir(resource_path).join(&tag.src));

		if depth >= self.options.max_depth {
			return Err(InjectError::RecursionLimit {
				path: target.display().to_string(),
				limit: self.options.max_depth,
			});
		}

		let replacement = match verb {
			Verb::Inject => self.inject(&target)?,
			Verb::Import => self.import(&tag.src, &target, resource_path)?,
		};
		let resolved = self.substitute_nested(&replacement, &target, depth + 1)?;

		self.reporter.report(&SubstituteEvent::TagResolved {
			file: resource_path.to_path_buf(),
			verb,
			src: tag.src.clone(),
			position: tag.position,
		});

		Ok(resolved)
	}

	fn inject(&mut self, path: &Path) -> InjectResult<String> {
		let content = std::fs::read_to_string(path).map_err(|e| {
			InjectError::ReadFile {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})?;

		self.dependencies.add_dependency(path);
		self.reporter.report(&SubstituteEvent::DependencyAdded {
			resource: self.resource.clone(),
			dependency: path.to_path_buf(),
		});

		Ok(content.trim().to_string())
	}

	fn import(&mut self, pattern: &str, target: &Path, resource_path: &Path) -> InjectResult<String> {
		let Some((base_dir, name_pattern)) = split_pattern(target) else {
			return Err(InjectError::InvalidPattern {
				pattern: pattern.to_string(),
				reason: "the pattern does not end in a file name".to_string(),
			});
		};

		let files = self.finder.find(&base_dir, &name_pattern)?;
		if files.is_empty() {
			return Err(InjectError::NoMatches {
				pattern: pattern.to_string(),
				dir: base_dir.display().to_string(),
			});
		}

		let syntax = ImportSyntax::for_resource(resource_path, &self.options.script_extensions);
		let owner_dir = normalize_path(&std::path::absolute(resource_dir(resource_path))?);
		let statements: Vec<String> = files
			.iter()
			.map(|file| syntax.statement(&self.import_path(file, &owner_dir)))
			.collect();

		self.reporter.report(&SubstituteEvent::ImportsGenerated {
			file: resource_path.to_path_buf(),
			pattern: pattern.to_string(),
			count: statements.len(),
		});

		Ok(statements.join("\n"))
	}

	fn import_path(&self, file: &Path, owner_dir: &Path) -> String {
		let file = normalize_path(file);
		match self.options.import_paths {
			ImportPathStyle::Absolute => to_slash(&file),
			ImportPathStyle::Relative => {
				let relative = to_slash(&relative_path(&file, owner_dir));
				if relative.starts_with("../") {
					relative
				} else {
					format!("./{relative}")
				}
			}
		}
	}
}

/// Prefix every line of `text`, empty ones included, with `indent`.
pub fn indent_lines(text: &str, indent: &str) -> String {
	text.split('\n')
		.map(|line| format!("{indent}{line}"))
		.collect::<Vec<_>>()
		.join("\n")
}

fn resource_dir(resource_path: &Path) -> &Path {
	match resource_path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	}
}

/// Split a resolved pattern path into the directory to search and the file
/// name glob. Trailing directory components containing glob syntax (as in
/// `styles/**/*.scss`) are dropped since the search is recursive anyway.
fn split_pattern(target: &Path) -> Option<(PathBuf, String)> {
	let name = target.file_name()?.to_str()?.to_string();
	let mut base = target.parent().map(Path::to_path_buf).unwrap_or_default();

	while base
		.file_name()
		.and_then(|component| component.to_str())
		.is_some_and(has_glob_syntax)
	{
		base.pop();
	}

	if base.as_os_str().is_empty() {
		base = PathBuf::from(".");
	}

	Some((base, name))
}

fn has_glob_syntax(component: &str) -> bool {
	component.contains(['*', '?', '[', '{'])
}

/// Lexically remove `.` and resolve `..` components.
fn normalize_path(path: &Path) -> PathBuf {
	let mut normalized = PathBuf::new();

	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				let last = normalized.components().next_back();
				let follows_name = matches!(last, Some(Component::Normal(_)));
				let follows_root = matches!(last, Some(Component::RootDir | Component::Prefix(_)));

				if follows_name {
					normalized.pop();
				} else if !follows_root {
					normalized.push("..");
				}
			}
			other => normalized.push(other.as_os_str()),
		}
	}

	if normalized.as_os_str().is_empty() {
		PathBuf::from(".")
	} else {
		normalized
	}
}

/// `path` relative to `base`. Both are expected to be absolute and
/// normalized.
fn relative_path(path: &Path, base: &Path) -> PathBuf {
	let path_components: Vec<Component<'_>> = path.components().collect();
	let base_components: Vec<Component<'_>> = base.components().collect();
	let common = path_components
		.iter()
		.zip(&base_components)
		.take_while(|(a, b)| a == b)
		.count();

	let mut relative = PathBuf::new();
	for _ in common..base_components.len() {
		relative.push("..");
	}
	for component in &path_components[common..] {
		relative.push(component.as_os_str());
	}
	relative
}

fn to_slash(path: &Path) -> String {
	path.to_string_lossy().replace('\\', "/")
}
