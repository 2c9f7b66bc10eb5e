use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::DEFAULT_SCRIPT_EXTENSIONS;
use crate::GlobFinder;
use crate::InjectError;
use crate::InjectResult;

/// Default limit on how deeply injected files may nest tags.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["wpinject.toml", ".wpinject.toml", ".config/wpinject.toml"];

/// How paths are written into generated import statements.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImportPathStyle {
	/// The absolute path of each matched file.
	#[default]
	Absolute,
	/// The path relative to the file containing the tag, prefixed with `./`
	/// or `../`.
	Relative,
}

/// Knobs used by [`Substitutor`](crate::Substitutor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstituteOptions {
	/// Maximum nesting of tags inside injected files before a tag fails.
	pub max_depth: usize,
	/// Resource extensions that get `import "...";` statements.
	pub script_extensions: Vec<String>,
	pub import_paths: ImportPathStyle,
}

impl Default for SubstituteOptions {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
			script_extensions: default_script_extensions(),
			import_paths: ImportPathStyle::default(),
		}
	}
}

/// Configuration loaded from a `wpinject.toml` file.
///
/// ```toml
/// max_depth = 32
/// script_extensions = ["js", "ts", "tsx", "jsx"]
/// import_paths = "relative"
///
/// [finder]
/// exclude = ["node_modules/", "*.min.css"]
/// ```
#[derive(Debug, Deserialize)]
pub struct InjectConfig {
	#[serde(default = "default_max_depth")]
	pub max_depth: usize,
	#[serde(default = "default_script_extensions")]
	pub script_extensions: Vec<String>,
	#[serde(default)]
	pub import_paths: ImportPathStyle,
	/// Settings for the file enumeration behind the `import` verb.
	#[serde(default)]
	pub finder: FinderConfig,
}

/// Configuration for file enumeration.
#[derive(Debug, Default, Deserialize)]
pub struct FinderConfig {
	/// Gitignore-style patterns for files and directories the `import` verb
	/// never matches.
	#[serde(default)]
	pub exclude: Vec<String>,
}

fn default_max_depth() -> usize {
	DEFAULT_MAX_DEPTH
}

fn default_script_extensions() -> Vec<String> {
	DEFAULT_SCRIPT_EXTENSIONS
		.iter()
		.map(ToString::to_string)
		.collect()
}

impl Default for InjectConfig {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
			script_extensions: default_script_extensions(),
			import_paths: ImportPathStyle::default(),
			finder: FinderConfig::default(),
		}
	}
}

impl InjectConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is none.
	pub fn load(root: &Path) -> InjectResult<Option<InjectConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: InjectConfig =
			toml::from_str(&content).map_err(|e| InjectError::ConfigParse(e.to_string()))?;

		Ok(Some(config))
	}

	/// Like [`InjectConfig::load`] but falls back to the defaults.
	pub fn load_or_default(root: &Path) -> InjectResult<InjectConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	pub fn to_options(&self) -> SubstituteOptions {
		SubstituteOptions {
			max_depth: self.max_depth,
			script_extensions: self.script_extensions.clone(),
			import_paths: self.import_paths,
		}
	}

	pub fn finder(&self) -> GlobFinder {
		GlobFinder::new(self.finder.exclude.clone())
	}
}
