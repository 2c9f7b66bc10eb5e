use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;
use wpinject_cli::Commands;
use wpinject_cli::OutputFormat;
use wpinject_cli::WpinjectCli;
use wpinject_core::InjectConfig;
use wpinject_core::Reporter;
use wpinject_core::SubstituteEvent;
use wpinject_core::Substitutor;
use wpinject_core::TracingReporter;
use wpinject_core::find_tags;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = WpinjectCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Process {
			files,
			write,
			dry_run,
			watch,
		}) => run_process(&args, files, *write, *dry_run, *watch),
		Some(Commands::List { files, format }) => run_list(&args, files, *format),
		Some(Commands::Deps { files, format }) => run_deps(&args, files, *format),
		None => {
			eprintln!("No subcommand specified. Run `wpinject --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<wpinject_core::InjectError>() {
			Ok(inject_err) => {
				let report: miette::Report = (*inject_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log level comes from `WPINJECT_LOG`, falling back to warnings only (or
/// debug output for the engine with `--verbose`).
fn init_tracing(verbose: bool, use_color: bool) {
	let fallback = if verbose { "wpinject_core=debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env("WPINJECT_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.with_ansi(use_color)
		.try_init();
}

fn resolve_root(args: &WpinjectCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Prints unresolved tags as warnings and forwards every other event to
/// `tracing`.
struct CliReporter {
	root: PathBuf,
	tracing: TracingReporter,
}

impl Reporter for CliReporter {
	fn report(&mut self, event: &SubstituteEvent) {
		if let SubstituteEvent::TagFailed {
			file,
			tag,
			position,
			message,
		} = event
		{
			eprintln!(
				"{} {}:{position} could not resolve {tag}: {message}",
				colored!("warning:", yellow),
				make_relative(file, &self.root)
			);
		} else {
			self.tracing.report(event);
		}
	}
}

/// A file after substitution.
struct Processed {
	file: PathBuf,
	original: String,
	output: String,
	dependencies: Vec<PathBuf>,
	failed_tags: usize,
}

impl Processed {
	fn is_changed(&self) -> bool {
		self.output != self.original
	}
}

fn process_files(
	args: &WpinjectCli,
	files: &[PathBuf],
) -> Result<Vec<Processed>, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = InjectConfig::load_or_default(&root)?;
	let options = config.to_options();
	let finder = config.finder();
	let mut processed = Vec::with_capacity(files.len());

	for file in files {
		let original = std::fs::read_to_string(file)
			.map_err(|e| format!("failed to read {}: {e}", file.display()))?;
		let mut reporter = CliReporter {
			root: root.clone(),
			tracing: TracingReporter,
		};
		let mut dependencies: Vec<PathBuf> = Vec::new();
		let mut substitutor =
			Substitutor::new(options.clone(), &finder, &mut reporter, &mut dependencies);
		let output = substitutor.substitute(&original, file)?;
		let failed_tags = substitutor.failed_tags();

		processed.push(Processed {
			file: file.clone(),
			original,
			output,
			dependencies,
			failed_tags,
		});
	}

	if args.verbose {
		let dependency_count: usize = processed.iter().map(|p| p.dependencies.len()).sum();
		eprintln!(
			"Processed {} file(s) with {dependency_count} dependency(ies)",
			processed.len()
		);
	}

	Ok(processed)
}

fn run_process(
	args: &WpinjectCli,
	files: &[PathBuf],
	write: bool,
	dry_run: bool,
	watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	// Run the initial pass.
	let processed = run_process_once(args, files, write, dry_run)?;

	if !watch {
		if processed.iter().any(|p| p.failed_tags > 0) {
			process::exit(1);
		}
		return Ok(());
	}

	// Watch mode
	eprintln!("\nWatching for file changes... (press Ctrl+C to stop)");

	use notify::Watcher;

	let mut watch_set = WatchSet::new(args, &processed);
	let mut watched_dirs = HashSet::new();
	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_) | notify::EventKind::Create(_)
				) {
					let _ = tx.send(event.paths);
				}
			}
		})?;

	sync_watched_dirs(&mut watcher, &mut watched_dirs, &watch_set.dirs)?;

	loop {
		let mut changed = rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while let Ok(paths) = rx.recv_timeout(Duration::from_millis(200)) {
			changed.extend(paths);
		}

		if !changed.iter().any(|path| watch_set.contains(path)) {
			continue;
		}

		eprintln!("\nFile change detected, processing...");
		match run_process_once(args, files, false, dry_run) {
			Ok(processed) => {
				watch_set = WatchSet::new(args, &processed);
				if let Err(e) = sync_watched_dirs(&mut watcher, &mut watched_dirs, &watch_set.dirs) {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			Err(e) => eprintln!("{} {e}", colored!("error:", red)),
		}
	}
}

/// Files that trigger a re-run in watch mode and the directories holding
/// them.
struct WatchSet {
	files: HashSet<PathBuf>,
	dirs: HashSet<PathBuf>,
}

impl WatchSet {
	/// Every processed file, everything it injected, and the config file.
	fn new(args: &WpinjectCli, processed: &[Processed]) -> Self {
		let config = InjectConfig::resolve_path(&resolve_root(args));
		let absolute: Vec<PathBuf> = processed
			.iter()
			.flat_map(|entry| std::iter::once(&entry.file).chain(&entry.dependencies))
			.chain(config.as_ref())
			.filter_map(|path| std::path::absolute(path).ok())
			.collect();

		let dirs = absolute
			.iter()
			.filter_map(|path| path.parent())
			.filter(|dir| dir.is_dir())
			.map(Path::to_path_buf)
			.collect();
		// Watchers may report canonical paths, e.g. through symlinked temp
		// directories.
		let canonical: Vec<PathBuf> = absolute
			.iter()
			.filter_map(|path| path.canonicalize().ok())
			.collect();

		Self {
			files: absolute.into_iter().chain(canonical).collect(),
			dirs,
		}
	}

	fn contains(&self, path: &Path) -> bool {
		self.files.contains(path)
			|| path
				.canonicalize()
				.is_ok_and(|canonical| self.files.contains(&canonical))
	}
}

/// Watch each directory in `needed` without recursion and stop watching
/// directories that no longer hold a watched file.
fn sync_watched_dirs(
	watcher: &mut impl notify::Watcher,
	watched_dirs: &mut HashSet<PathBuf>,
	needed: &HashSet<PathBuf>,
) -> notify::Result<()> {
	for dir in watched_dirs.difference(needed) {
		let _ = watcher.unwatch(dir);
	}
	for dir in needed.difference(watched_dirs) {
		watcher.watch(dir, notify::RecursiveMode::NonRecursive)?;
	}
	watched_dirs.clone_from(needed);

	Ok(())
}

fn run_process_once(
	args: &WpinjectCli,
	files: &[PathBuf],
	write: bool,
	dry_run: bool,
) -> Result<Vec<Processed>, Box<dyn std::error::Error>> {
	let processed = process_files(args, files)?;
	let root = resolve_root(args);
	let changed: Vec<&Processed> = processed.iter().filter(|p| p.is_changed()).collect();

	if dry_run {
		if changed.is_empty() {
			println!("No tags to substitute.");
		} else {
			println!("Dry run: would update {} file(s):", changed.len());
			for entry in &changed {
				let rel = make_relative(&entry.file, &root);
				println!("  {rel}");
				eprintln!("{}", colored!(format!("--- {rel}"), bold));
				print_diff(&entry.original, &entry.output);
			}
		}
	} else if write {
		if changed.is_empty() {
			println!("No tags to substitute.");
		} else {
			for entry in &changed {
				std::fs::write(&entry.file, &entry.output)?;
			}
			println!("Updated {} file(s).", changed.len());

			if args.verbose {
				for entry in &changed {
					println!("  {}", make_relative(&entry.file, &root));
				}
			}
		}
	} else {
		for entry in &processed {
			print!("{}", entry.output);
			if !entry.output.ends_with('\n') {
				println!();
			}
		}
	}

	let failed_tags: usize = processed.iter().map(|p| p.failed_tags).sum();
	if failed_tags > 0 {
		eprintln!(
			"{} {failed_tags} tag(s) could not be resolved",
			colored!("warning:", yellow)
		);
	}

	Ok(processed)
}

fn run_list(
	args: &WpinjectCli,
	files: &[PathBuf],
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let mut scanned = Vec::with_capacity(files.len());

	for file in files {
		let content = std::fs::read_to_string(file)
			.map_err(|e| format!("failed to read {}: {e}", file.display()))?;
		scanned.push((file, find_tags(&content)));
	}

	match format {
		OutputFormat::Json => {
			let entries: Vec<serde_json::Value> = scanned
				.iter()
				.map(|(file, tags)| {
					let tags: Vec<serde_json::Value> = tags
						.iter()
						.map(|tag| {
							serde_json::json!({
								"verb": tag.verb,
								"src": tag.src,
								"known": tag.verb().is_ok(),
								"line": tag.position.line,
								"column": tag.position.column,
								"offset": tag.position.offset,
								"indent": tag.indent,
							})
						})
						.collect();
					serde_json::json!({
						"file": make_relative(file, &root),
						"tags": tags,
					})
				})
				.collect();
			println!("{}", serde_json::to_string_pretty(&entries)?);
		}
		OutputFormat::Text => {
			let mut total = 0;
			for (file, tags) in &scanned {
				println!("{}", colored!(make_relative(file, &root), bold));
				if tags.is_empty() {
					println!("  no tags");
				}
				for tag in tags {
					let status = if tag.verb().is_ok() {
						String::new()
					} else {
						format!(" {}", colored!("[unknown verb]", yellow))
					};
					println!(
						"  {} webpack-{} {}{status}",
						tag.position, tag.verb, tag.src
					);
				}
				total += tags.len();
			}
			println!("\n{total} tag(s) in {} file(s)", scanned.len());
		}
	}

	Ok(())
}

fn run_deps(
	args: &WpinjectCli,
	files: &[PathBuf],
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let processed = process_files(args, files)?;

	match format {
		OutputFormat::Json => {
			let entries: Vec<serde_json::Value> = processed
				.iter()
				.map(|entry| {
					let dependencies: Vec<String> = entry
						.dependencies
						.iter()
						.map(|dependency| make_relative(dependency, &root))
						.collect();
					serde_json::json!({
						"file": make_relative(&entry.file, &root),
						"dependencies": dependencies,
						"failed_tags": entry.failed_tags,
					})
				})
				.collect();
			println!("{}", serde_json::to_string_pretty(&entries)?);
		}
		OutputFormat::Text => {
			for entry in &processed {
				println!("{}", colored!(make_relative(&entry.file, &root), bold));
				if entry.dependencies.is_empty() {
					println!("  no dependencies");
				}
				for dependency in &entry.dependencies {
					println!("  {}", make_relative(dependency, &root));
				}
			}
		}
	}

	Ok(())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
