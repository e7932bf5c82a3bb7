use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Build the guess-the-Java-version quiz from annotated snippets.",
	long_about = "verquiz turns a corpus of annotated Java snippets into a quiz dataset. It reads \
	              the expected version and required features of each snippet, strips anything \
	              that would give the answer away, validates the per-feature markdown \
	              descriptions and renders the static game page.\n\nQuick start:\n  verquiz \
	              build --base-url https://example.com  Build every artifact\n  verquiz \
	              validate                               Check feature descriptions\n  verquiz \
	              sanitize Foo.java                      Show a sanitized snippet"
)]
pub struct QuizCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Explicit config file. Defaults to the first of `verquiz.toml`,
	/// `.verquiz.toml` and `.config/verquiz.toml` in the project root.
	#[arg(long, short, global = true)]
	pub config: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Build the dataset and write every artifact.
	///
	/// Scans the snippet tree, filters and sanitizes each snippet, merges the
	/// curated entries and writes `code.json`, `features.json`, `deps.js` and
	/// `index.html` into the output directory. Nothing is written when any
	/// stage fails.
	Build {
		/// Base URL for absolute asset and share links. Overrides `base_url`
		/// from the config file.
		#[arg(long)]
		base_url: Option<String>,

		/// Analytics endpoint embedded as an opt-in script tag.
		#[arg(long)]
		analytics: Option<String>,

		/// Seed for the entry shuffle, for reproducible output.
		#[arg(long)]
		seed: Option<u64>,

		/// Never download assets. Uncached assets become placeholders.
		#[arg(long, default_value_t = false)]
		offline: bool,

		/// Build everything in memory and print the summary without writing
		/// files.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Output format for the build summary.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Validate every feature description document.
	///
	/// Reports each failing document with the rule it violates and exits with
	/// a non-zero status when any document is invalid.
	Validate,
	/// Print the sanitized form of one snippet file.
	Sanitize {
		/// The snippet to sanitize.
		file: PathBuf,
	},
	/// List the features declared in the registry.
	Features {
		/// Output format for the feature list.
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
