use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::QuizResult;
use crate::assets::AssetCache;
use crate::assets::AssetFetcher;
use crate::assets::collect_assets;
use crate::artifacts::Artifacts;
use crate::config::DescriptionMode;
use crate::config::QuizConfig;
use crate::config::resolve_against;
use crate::curated::CuratedEntry;
use crate::curated::load_curated;
use crate::dataset::Dataset;
use crate::dataset::DatasetAssembler;
use crate::dataset::ScanSummary;
use crate::descriptions::FeatureDescription;
use crate::descriptions::load_descriptions;
use crate::descriptions::load_descriptions_strict;
use crate::registry::FeatureRegistry;
use crate::registry::load_registry;
use crate::render::PageContext;
use crate::render::load_page_template;
use crate::render::normalize_base_url;
use crate::render::render_page;
use crate::scanner::SourceScanOptions;
use crate::scanner::collect_source_files;

/// Run parameters that usually come from the command line. Each falls back
/// to the config file when unset.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
	pub base_url: Option<String>,
	pub analytics: Option<String>,
	/// Seed for the entry shuffle. Unseeded runs use a random order.
	pub seed: Option<u64>,
}

/// What a run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
	pub summary: ScanSummary,
	/// Curated entries loaded, before replication.
	pub curated: usize,
	/// Entries in the emitted corpus.
	pub entries: usize,
	pub features: usize,
	/// Files written, empty for a dry run.
	pub written: Vec<PathBuf>,
}

/// A project root and its configuration.
#[derive(Debug, Clone)]
pub struct QuizProject {
	root: PathBuf,
	config: QuizConfig,
}

impl QuizProject {
	pub fn new(root: impl Into<PathBuf>, config: QuizConfig) -> Self {
		Self {
			root: root.into(),
			config,
		}
	}

	/// Load the discovered config at `root`, or the defaults.
	pub fn load(root: impl Into<PathBuf>) -> QuizResult<Self> {
		let root = root.into();
		let config = QuizConfig::load_or_default(&root)?;
		Ok(Self::new(root, config))
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn config(&self) -> &QuizConfig {
		&self.config
	}

	/// A configured path resolved against the project root.
	pub fn path(&self, path: &Path) -> PathBuf {
		resolve_against(&self.root, path)
	}

	pub fn load_registry(&self) -> FeatureRegistry {
		load_registry(
			&self.path(&self.config.registry.path),
			&self.config.registry.block,
		)
	}

	/// Load descriptions according to the configured mode. The flag tells
	/// whether every registry feature must be described.
	pub fn load_descriptions(
		&self,
		registry: &FeatureRegistry,
	) -> QuizResult<(BTreeMap<String, FeatureDescription>, bool)> {
		let settings = &self.config.descriptions;
		let dir = self.path(&settings.dir);

		match settings.mode {
			DescriptionMode::Off => Ok((BTreeMap::new(), false)),
			DescriptionMode::Discover => Ok((load_descriptions(&dir, &settings.extension)?, false)),
			DescriptionMode::Strict => {
				let descriptions =
					load_descriptions_strict(&dir, &settings.extension, registry.ids())?;
				Ok((descriptions, true))
			}
		}
	}

	/// Every configured curated file, concatenated in order.
	pub fn load_curated(&self) -> QuizResult<Vec<CuratedEntry>> {
		let mut entries = Vec::new();
		for file in &self.config.curated.files {
			entries.extend(load_curated(&self.path(file))?);
		}
		Ok(entries)
	}

	/// Scan, filter, sanitize and merge everything into a shuffled dataset.
	pub fn build_dataset(&self, seed: Option<u64>) -> QuizResult<(Dataset, BuildReport)> {
		let registry = self.load_registry();
		let (descriptions, require_descriptions) = self.load_descriptions(&registry)?;
		let curated = self.load_curated()?;

		let files = collect_source_files(
			&self.path(&self.config.sources.root),
			&SourceScanOptions::from_config(&self.config.sources),
		)?;

		let assembler = DatasetAssembler::from_config(&self.config);
		let (scanned, summary) = assembler.scan_entries(&files)?;
		let mut dataset = assembler.assemble(
			scanned,
			&curated,
			&registry,
			&descriptions,
			require_descriptions,
		)?;
		dataset.shuffle(seed);

		let report = BuildReport {
			summary,
			curated: curated.len(),
			entries: dataset.entries.len(),
			features: dataset.features.len(),
			written: Vec::new(),
		};
		Ok((dataset, report))
	}

	/// Build every artifact in memory without touching the output directory.
	///
	/// The base URL is validated before any input is read.
	pub fn build_artifacts(
		&self,
		options: &RunOptions,
		fetcher: &dyn AssetFetcher,
	) -> QuizResult<(Artifacts, BuildReport)> {
		let base_url = normalize_base_url(
			options
				.base_url
				.as_deref()
				.or(self.config.base_url.as_deref()),
		)?;
		let analytics = options
			.analytics
			.as_deref()
			.or(self.config.analytics.as_deref());

		let (dataset, report) = self.build_dataset(options.seed)?;
		let code_json = dataset.entries_json()?;
		let features_json = dataset.features_json()?;

		let cache = AssetCache::new(self.path(&self.config.assets.cache_dir));
		let assets = collect_assets(&cache, fetcher, &self.config.assets);

		let template = load_page_template(&self.path(&self.config.output.template))?;
		let context = PageContext::new(
			assets.styles,
			analytics,
			base_url,
			report.entries,
			report.features,
		);
		let index_html = render_page(&template, &context)?;

		let artifacts = Artifacts {
			code_json,
			features_json,
			deps_js: assets.scripts,
			index_html,
		};
		Ok((artifacts, report))
	}

	/// Build and write every artifact. Nothing is written when any stage
	/// fails.
	pub fn run(&self, options: &RunOptions, fetcher: &dyn AssetFetcher) -> QuizResult<BuildReport> {
		let (artifacts, mut report) = self.build_artifacts(options, fetcher)?;
		report.written = artifacts.write(&self.path(&self.config.output.dir))?;

		tracing::info!(
			entries = report.entries,
			features = report.features,
			files = report.written.len(),
			"wrote quiz artifacts"
		);
		Ok(report)
	}
}
