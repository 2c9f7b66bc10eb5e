use std::cell::RefCell;
use std::path::Path;
use std::path::PathBuf;

use crate::FileFinder;
use crate::InjectResult;
use crate::SubstituteEvent;
use crate::SubstituteOptions;
use crate::Substitutor;

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write: {e}"));
	path
}

/// Everything a test needs to inspect after a substitution.
pub struct Outcome {
	pub output: InjectResult<String>,
	pub events: Vec<SubstituteEvent>,
	pub dependencies: Vec<PathBuf>,
	pub failed_tags: usize,
}

/// Run a substitution with collecting ports.
pub fn run_substitution(
	contents: &str,
	resource_path: &Path,
	options: SubstituteOptions,
	finder: &dyn FileFinder,
) -> Outcome {
	let mut events: Vec<SubstituteEvent> = Vec::new();
	let mut dependencies: Vec<PathBuf> = Vec::new();
	let mut substitutor = Substitutor::new(options, finder, &mut events, &mut dependencies);
	let output = substitutor.substitute(contents, resource_path);
	let failed_tags = substitutor.failed_tags();

	Outcome {
		output,
		events,
		dependencies,
		failed_tags,
	}
}

/// A finder that returns a fixed list and records what it was asked for.
#[derive(Default)]
pub struct StaticFinder {
	pub files: Vec<PathBuf>,
	pub calls: RefCell<Vec<(PathBuf, String)>>,
}

impl StaticFinder {
	pub fn new(files: &[&str]) -> Self {
		Self {
			files: files.iter().map(PathBuf::from).collect(),
			calls: RefCell::new(Vec::new()),
		}
	}
}

impl FileFinder for StaticFinder {
	fn find(&self, base_dir: &Path, name_pattern: &str) -> InjectResult<Vec<PathBuf>> {
		self.calls
			.borrow_mut()
			.push((base_dir.to_path_buf(), name_pattern.to_string()));
		Ok(self.files.clone())
	}
}
