use std::io::BufRead;
use std::io::BufReader;
use std::process::Stdio;
use std::sync::mpsc;
use std::time::Duration;

use insta_cmd::get_cargo_bin;
use wpinject_cli::Commands;
use wpinject_cli::WpinjectCli;
use wpinject_core::AnyEmptyResult;

mod common;

use common::wpinject_cmd;
use common::write_file;

#[test]
fn process_watch_flag_is_accepted_by_cli_parser() {
	use clap::Parser;

	let cli = WpinjectCli::parse_from(["wpinject", "process", "--watch", "index.html"]);
	match cli.command {
		Some(Commands::Process {
			watch,
			write,
			dry_run,
			..
		}) => {
			assert!(watch);
			assert!(!write);
			assert!(!dry_run);
		}
		_ => panic!("expected Process command"),
	}

	let cli = WpinjectCli::parse_from(["wpinject", "process", "index.html"]);
	match cli.command {
		Some(Commands::Process { watch, .. }) => assert!(!watch),
		_ => panic!("expected Process command"),
	}

	// Watching rewrites nothing, so it cannot be combined with --write.
	let result =
		WpinjectCli::try_parse_from(["wpinject", "process", "--watch", "--write", "index.html"]);
	assert!(result.is_err());
}

#[test]
fn process_watch_flag_accepted_by_binary() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let page = write_file(tmp.path(), "index.html", "<webpack-inject src=\"./nav.html\">\n")?;
	write_file(tmp.path(), "nav.html", "<nav></nav>")?;

	// The watch loop never ends on its own; only check that the binary starts.
	let _ = wpinject_cmd()
		.arg("process")
		.arg("--watch")
		.arg("--path")
		.arg(tmp.path())
		.arg(&page)
		.timeout(Duration::from_secs(3))
		.assert();

	Ok(())
}

#[test]
fn process_watch_reruns_for_dependencies_outside_config_root() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config_root = tmp.path().join("cfg");
	std::fs::create_dir_all(&config_root)?;
	let page = write_file(
		tmp.path(),
		"site/index.html",
		"<webpack-inject src=\"./nav.html\">\n",
	)?;
	let nav = write_file(tmp.path(), "site/nav.html", "<nav>v1</nav>")?;

	let mut child = std::process::Command::new(get_cargo_bin("wpinject"))
		.env("NO_COLOR", "1")
		.arg("process")
		.arg("--watch")
		.arg("--path")
		.arg(&config_root)
		.arg(&page)
		.stdout(Stdio::piped())
		.stderr(Stdio::null())
		.spawn()?;

	let stdout = child.stdout.take().ok_or("stdout is piped")?;
	let (tx, rx) = mpsc::channel();
	std::thread::spawn(move || {
		for line in BufReader::new(stdout).lines().map_while(Result::ok) {
			if tx.send(line).is_err() {
				break;
			}
		}
	});

	let first = rx.recv_timeout(Duration::from_secs(20));

	// Keep touching the dependency until the watcher is registered and the
	// change is picked up.
	let mut rerun = false;
	for _ in 0..20 {
		std::fs::write(&nav, "<nav>v2</nav>")?;
		if let Ok(line) = rx.recv_timeout(Duration::from_secs(1)) {
			rerun = line.contains("<nav>v2</nav>");
			break;
		}
	}

	let _ = child.kill();
	let _ = child.wait();

	assert_eq!(first?, "<nav>v1</nav>");
	assert!(rerun, "editing nav.html did not trigger a re-run");

	Ok(())
}
