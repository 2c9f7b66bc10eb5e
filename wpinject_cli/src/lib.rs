use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Inject files and generate imports from placeholder tags at build time.",
	long_about = "wpinject replaces `<webpack-inject src=\"...\">` tags with the contents of the \
	              referenced file and `<webpack-import src=\"...\">` tags with one import \
	              statement per file matching a pattern.\n\nInjected files are processed \
	              again, so they can contain tags of their own. Tags that cannot be resolved \
	              are commented out and reported.\n\nQuick start:\n  wpinject process \
	              src/index.html          Print the processed file\n  wpinject process \
	              --write src/*.html      Rewrite files in place\n  wpinject list \
	              src/index.html             Show the tags in a file\n  wpinject deps \
	              src/index.html             Show the files a file depends on"
)]
pub struct WpinjectCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Directory used to discover `wpinject.toml`. Defaults to the current
	/// directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Substitute all tags in the given files.
	///
	/// By default the processed contents are printed to stdout. Use `--write`
	/// to replace the files in place or `--dry-run` to see a diff of what
	/// would change. Exits with status 1 when any tag could not be resolved.
	Process {
		/// Files to process.
		#[arg(required = true)]
		files: Vec<PathBuf>,

		/// Write the processed contents back to each file.
		#[arg(long, default_value_t = false)]
		write: bool,

		/// Show a diff of the changes instead of printing or writing the
		/// processed contents.
		#[arg(long, default_value_t = false, conflicts_with = "write")]
		dry_run: bool,

		/// Watch for file changes and re-run when a processed file or one of
		/// its injected files changes.
		#[arg(long, default_value_t = false, conflicts_with = "write")]
		watch: bool,
	},
	/// List the tags found in the given files without resolving them.
	List {
		/// Files to scan.
		#[arg(required = true)]
		files: Vec<PathBuf>,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Print the files each given file depends on through `inject` tags,
	/// nested injections included.
	Deps {
		/// Files to resolve.
		#[arg(required = true)]
		files: Vec<PathBuf>,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
