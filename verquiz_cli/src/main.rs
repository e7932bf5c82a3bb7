use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use verquiz_cli::Commands;
use verquiz_cli::OutputFormat;
use verquiz_cli::QuizCli;
use verquiz_core::AnyEmptyResult;
use verquiz_core::AnyResult;
use verquiz_core::AssetFetcher;
use verquiz_core::BuildReport;
use verquiz_core::DescriptionMode;
use verquiz_core::HttpFetcher;
use verquiz_core::OfflineFetcher;
use verquiz_core::QuizConfig;
use verquiz_core::QuizError;
use verquiz_core::QuizProject;
use verquiz_core::RunOptions;
use verquiz_core::Sanitizer;
use verquiz_core::collect_description_files;
use verquiz_core::read_source;
use verquiz_core::validate_descriptions;

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
	let args = QuizCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}
	let stderr_color = use_color && supports_color::on(supports_color::Stream::Stderr).is_some();

	init_tracing(args.verbose, stderr_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(stderr_color)
				.unicode(stderr_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Build {
			base_url,
			analytics,
			seed,
			offline,
			dry_run,
			format,
		}) => {
			let options = RunOptions {
				base_url: base_url.clone(),
				analytics: analytics.clone(),
				seed: *seed,
			};
			run_build(&args, &options, *offline, *dry_run, *format)
		}
		Some(Commands::Validate) => run_validate(&args),
		Some(Commands::Sanitize { file }) => run_sanitize(&args, file),
		Some(Commands::Features { format }) => run_features(&args, *format),
		None => {
			eprintln!("No subcommand specified. Run `verquiz --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<QuizError>() {
			Ok(quiz_err) => {
				let report: miette::Report = (*quiz_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr at `warn`, or `info` with `--verbose`. `RUST_LOG` takes
/// precedence.
fn init_tracing(verbose: bool, ansi: bool) {
	let default_level = if verbose { "info" } else { "warn" };
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(ansi)
		.with_target(false)
		.init();
}

fn resolve_root(args: &QuizCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_project(args: &QuizCli) -> AnyResult<QuizProject> {
	let root = resolve_root(args);

	let project = match &args.config {
		Some(path) => QuizProject::new(root, QuizConfig::load_from(path)?),
		None => QuizProject::load(root)?,
	};
	tracing::debug!(root = %project.root().display(), "loaded project");

	Ok(project)
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

fn run_build(
	args: &QuizCli,
	options: &RunOptions,
	offline: bool,
	dry_run: bool,
	format: OutputFormat,
) -> AnyEmptyResult {
	let project = load_project(args)?;
	let fetcher: Box<dyn AssetFetcher> = if offline {
		Box::new(OfflineFetcher)
	} else {
		Box::new(HttpFetcher::default())
	};

	let report = if dry_run {
		project.build_artifacts(options, fetcher.as_ref())?.1
	} else {
		project.run(options, fetcher.as_ref())?
	};

	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
		OutputFormat::Text => print_build_report(&report, project.root(), dry_run),
	}

	Ok(())
}

fn print_build_report(report: &BuildReport, root: &Path, dry_run: bool) {
	let verb = if dry_run { "Would build" } else { "Built" };
	println!(
		"{} {} entries covering {} features",
		colored!(verb, green),
		report.entries,
		report.features
	);
	println!("  {:<12} {}", "scanned", report.summary.scanned);
	println!("  {:<12} {}", "included", report.summary.included);
	println!("  {:<12} {}", "curated", report.curated);

	for (reason, count) in &report.summary.excluded {
		println!("  {:<12} {count} ({reason})", "excluded");
	}

	for path in &report.written {
		println!("  {} {}", colored!("wrote", bold), make_relative(path, root));
	}
}

fn run_validate(args: &QuizCli) -> AnyEmptyResult {
	let project = load_project(args)?;
	let settings = &project.config().descriptions;
	let dir = project.path(&settings.dir);

	let files = collect_description_files(&dir, &settings.extension)?;
	let mut failures = validate_descriptions(&dir, &settings.extension)?;

	if settings.mode == DescriptionMode::Strict {
		let registry = project.load_registry();
		failures.extend(
			registry
				.ids()
				.into_iter()
				.filter(|id| !files.contains_key(*id))
				.map(|id| {
					QuizError::MissingDescription {
						feature: id.to_string(),
						path: dir
							.join(format!("{id}.{}", settings.extension))
							.display()
							.to_string(),
					}
				}),
		);
	}

	if failures.is_empty() {
		println!(
			"{} All {} feature descriptions are valid.",
			colored!("✓", green),
			files.len()
		);
		return Ok(());
	}

	for failure in &failures {
		eprintln!("{} {failure}", colored!("✗", red));
	}
	eprintln!(
		"\n{} {} invalid or missing feature description(s).",
		colored!("error:", red),
		failures.len()
	);
	process::exit(1);
}

fn run_sanitize(args: &QuizCli, file: &Path) -> AnyEmptyResult {
	let project = load_project(args)?;
	let sanitizer = Sanitizer::from_config(&project.config().sanitize);
	let text = read_source(file)?;

	let sanitized = sanitizer.sanitize(&text);
	if sanitized.is_empty() {
		eprintln!(
			"{} nothing is left of {} after sanitizing",
			colored!("warning:", yellow),
			file.display()
		);
	} else {
		println!("{sanitized}");
	}

	Ok(())
}

fn run_features(args: &QuizCli, format: OutputFormat) -> AnyEmptyResult {
	let project = load_project(args)?;
	let registry = project.load_registry();

	match format {
		OutputFormat::Json => {
			let features: Vec<_> = registry.iter().collect();
			println!("{}", serde_json::to_string_pretty(&features)?);
		}
		OutputFormat::Text => {
			if registry.is_empty() {
				println!("No features found.");
				return Ok(());
			}

			println!("{}", colored!("Features:", bold));
			for feature in registry.iter() {
				println!("  {:<36} {:>4}  {}", feature.id, feature.version, feature.label);
			}
			println!("\n{} feature(s)", registry.len());
		}
	}

	Ok(())
}
