use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum InjectError {
	#[error(transparent)]
	#[diagnostic(code(wpinject::io_error))]
	Io(#[from] std::io::Error),

	#[error("unknown verb: `webpack-{0}`")]
	#[diagnostic(
		code(wpinject::unknown_verb),
		help("supported tags are `<webpack-inject src=\"...\">` and `<webpack-import src=\"...\">`")
	)]
	UnknownVerb(String),

	#[error("failed to read `{path}`: {reason}")]
	#[diagnostic(code(wpinject::read_file))]
	ReadFile { path: String, reason: String },

	#[error("no files match `{pattern}` in `{dir}`")]
	#[diagnostic(
		code(wpinject::no_matches),
		help("check the pattern, or the `[finder] exclude` patterns in wpinject.toml")
	)]
	NoMatches { pattern: String, dir: String },

	#[error("invalid file pattern `{pattern}`: {reason}")]
	#[diagnostic(code(wpinject::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("nesting deeper than {limit} levels while resolving `{path}`")]
	#[diagnostic(
		code(wpinject::recursion_limit),
		help("an injected file probably includes itself, directly or through another file")
	)]
	RecursionLimit { path: String, limit: usize },

	#[error("cannot determine comment syntax for `{0}`: the path has no extension")]
	#[diagnostic(
		code(wpinject::missing_extension),
		help("resources must carry a file extension such as `.html`, `.css` or `.js`")
	)]
	MissingExtension(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(wpinject::config_parse),
		help("check that wpinject.toml is valid TOML")
	)]
	ConfigParse(String),
}

pub type InjectResult<T> = Result<T, InjectError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
