use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Render markup templates with master layouts, parts and custom tags.",
	long_about = "plait is a server-side markup templating engine.\n\nDocuments declare a master \
	              template and fill its content holders, pull in reusable parts, call custom \
	              tags such as <core:if> and <core:link>, and reference variables with \
	              ${path.to.value}.\n\nQuick start:\n  plait render page.html --data site.json\n  \
	              plait compose page.html    Inspect the normalized document\n  plait cache \
	              clear           Drop compiled templates"
)]
pub struct PlaitCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory. `plait.toml` is discovered here
	/// and relative file arguments resolve against it.
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
	/// Render a document to text.
	///
	/// Composes the document with its master template and parts, expands
	/// every custom tag and substitutes variables from the data sources in
	/// `plait.toml` and any `--data` files.
	Render {
		/// The document to render.
		file: PathBuf,

		/// Additional data file merged into the data context. Objects are
		/// merged at the top level; other values are keyed by the file stem.
		/// May be repeated.
		#[arg(long, short)]
		data: Vec<PathBuf>,

		/// Write the rendered text to this file instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Recompose the document instead of reading the compiled-template
		/// cache.
		#[arg(long, default_value_t = false)]
		debug: bool,

		/// Watch the project for changes and render again automatically.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Print the composed and normalized form of a document.
	///
	/// Shows the document after master merge, part inclusion and
	/// normalization, along with its fingerprint and tag library prefixes.
	/// Nothing is expanded or cached.
	Compose {
		/// The document to compose.
		file: PathBuf,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Manage the compiled-template cache.
	Cache {
		#[command(subcommand)]
		command: CacheCommands,
	},
}

#[derive(Subcommand)]
pub enum CacheCommands {
	/// Delete every compiled template in the runtime directory.
	Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
