use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use owo_colors::OwoColorize;
use plait_cli::CacheCommands;
use plait_cli::Commands;
use plait_cli::OutputFormat;
use plait_cli::PlaitCli;
use plait_core::CacheStore;
use plait_core::Composed;
use plait_core::DataContext;
use plait_core::Engine;
use plait_core::FileCacheStore;
use plait_core::PlaitConfig;
use plait_core::load_data_file;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "PLAIT_LOG";

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

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
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = PlaitCli::parse();

	// Respect NO_COLOR, --no-color and terminals without color support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Render {
			file,
			data,
			output,
			debug,
			watch,
		}) => run_render(&args, file, data, output.as_deref(), *debug, *watch),
		Some(Commands::Compose { file, format }) => run_compose(&args, file, *format),
		Some(Commands::Cache {
			command: CacheCommands::Clear,
		}) => run_cache_clear(&args),
		None => {
			eprintln!("No subcommand specified. Run `plait --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		report_error(e);
		process::exit(2);
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let default_directives = if verbose {
		"plait=debug,plait_core=debug"
	} else {
		"warn"
	};
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directives));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.without_time()
		.try_init();
}

/// Render errors through miette when they carry diagnostics.
fn report_error(error: Box<dyn std::error::Error>) {
	match error.downcast::<plait_core::PlaitError>() {
		Ok(plait_err) => {
			let report: miette::Report = (*plait_err).into();
			eprintln!("{report:?}");
		}
		Err(e) => {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn resolve_root(args: &PlaitCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Relative file arguments resolve against the project root.
fn resolve_file(root: &Path, file: &Path) -> PathBuf {
	if file.is_absolute() {
		file.to_path_buf()
	} else {
		root.join(file)
	}
}

fn load_config(root: &Path) -> CliResult<PlaitConfig> {
	Ok(PlaitConfig::load(root)?.unwrap_or_default())
}

fn print_section(title: &str) {
	println!();
	println!("{}", colored!(title, bold));
}

fn print_field(label: &str, value: impl std::fmt::Display) {
	println!("{label:<14} {value}");
}

fn run_render(
	args: &PlaitCli,
	file: &Path,
	data: &[PathBuf],
	output: Option<&Path>,
	debug: bool,
	watch: bool,
) -> CliResult {
	render_once(args, file, data, output, debug)?;

	if !watch {
		return Ok(());
	}

	eprintln!("\nWatching for file changes... (press Ctrl+C to stop)");

	let root = resolve_root(args);
	let config = load_config(&root)?;
	let watch_root = std::fs::canonicalize(&root)?;

	// Cache writes and the rendered output must not trigger another render.
	let mut ignored = vec![config.runtime_dir(&watch_root)];
	if let Some(output) = output {
		let output = resolve_file(&root, output);
		ignored.push(std::fs::canonicalize(&output).unwrap_or(output));
	}

	let (tx, rx) = mpsc::channel();
	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				let relevant = matches!(
					event.kind,
					notify::EventKind::Modify(_)
						| notify::EventKind::Create(_)
						| notify::EventKind::Remove(_)
				) && event
					.paths
					.iter()
					.any(|path| !ignored.iter().any(|skip| path.starts_with(skip)));

				if relevant {
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&watch_root, notify::RecursiveMode::Recursive)?;

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		eprintln!("\nFile change detected, rendering...");
		if let Err(e) = render_once(args, file, data, output, debug) {
			report_error(e);
		}
	}
}

fn render_once(
	args: &PlaitCli,
	file: &Path,
	data: &[PathBuf],
	output: Option<&Path>,
	debug: bool,
) -> CliResult {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let engine = Engine::from_config(&root, &config)?.with_debug(config.debug || debug);

	let mut context = config.load_data(&root)?;
	for path in data {
		merge_data_file(&mut context, &resolve_file(&root, path))?;
	}

	let source = resolve_file(&root, file);
	tracing::debug!(source = %source.display(), "rendering document");
	let rendered = engine.render_file(&source, &context)?;

	match output {
		Some(output) => {
			let output = resolve_file(&root, output);
			if let Some(parent) = output.parent() {
				std::fs::create_dir_all(parent)?;
			}
			std::fs::write(&output, &rendered)?;
			eprintln!(
				"{} {} -> {}",
				colored!("rendered", green),
				source.display(),
				output.display()
			);
		}
		None => {
			let mut stdout = std::io::stdout().lock();
			stdout.write_all(rendered.as_bytes())?;
			stdout.flush()?;
		}
	}

	Ok(())
}

/// Objects merge into the top level of the context; any other value is
/// stored under the file stem.
fn merge_data_file(context: &mut DataContext, path: &Path) -> CliResult {
	match load_data_file(path)? {
		Value::Object(map) => context.merge(DataContext::from(map)),
		other => {
			let key = path
				.file_stem()
				.map(|stem| stem.to_string_lossy().to_string())
				.unwrap_or_default();
			context.insert(key, other);
		}
	}

	Ok(())
}

#[derive(Serialize)]
struct ComposeReport<'a> {
	path: String,
	#[serde(flatten)]
	composed: &'a Composed,
}

fn run_compose(args: &PlaitCli, file: &Path, format: OutputFormat) -> CliResult {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let engine = Engine::from_config(&root, &config)?;
	let source = resolve_file(&root, file);
	let composed = engine.compose_file(&source)?;

	match format {
		OutputFormat::Json => {
			let report = ComposeReport {
				path: source.display().to_string(),
				composed: &composed,
			};
			println!("{}", serde_json::to_string_pretty(&report)?);
		}
		OutputFormat::Text => {
			println!("{}", colored!(source.display(), bold));
			print_field("Fingerprint", &composed.fingerprint);

			print_section("Tag libraries");
			for (prefix, namespace) in composed.taglibs.iter() {
				println!("  {prefix:<12} {namespace}");
			}

			print_section("Document");
			println!("{}", composed.text);
		}
	}

	Ok(())
}

fn run_cache_clear(args: &PlaitCli) -> CliResult {
	let root = resolve_root(args);
	let config = load_config(&root)?;
	let store = FileCacheStore::new(config.runtime_dir(&root));
	let removed = store.clear()?;

	println!(
		"{} {removed} compiled template file(s) from {}",
		colored!("Removed", green),
		store.dir().display()
	);

	Ok(())
}
