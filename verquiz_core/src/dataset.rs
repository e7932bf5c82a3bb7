use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use rand::RngCore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde::Serialize;

use crate::QuizError;
use crate::QuizResult;
use crate::config::FilterConfig;
use crate::config::QuizConfig;
use crate::curated::CuratedEntry;
use crate::descriptions::FeatureDescription;
use crate::metadata::MetadataExtractor;
use crate::metadata::SourceCandidate;
use crate::registry::FeatureRegistry;
use crate::sanitizer::Sanitizer;
use crate::scanner::read_source;

/// One quiz question: sanitized code and the version it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizEntry {
	pub code: String,
	pub correct: i32,
	pub features: Vec<String>,
}

/// The emitted metadata of one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
	pub label: String,
	/// Markdown description, empty when none was loaded.
	pub description: String,
	pub version: i32,
}

/// The complete quiz corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
	pub entries: Vec<QuizEntry>,
	pub features: BTreeMap<String, FeatureRecord>,
}

#[derive(Serialize)]
struct EntriesDocument<'a> {
	entries: &'a [QuizEntry],
}

#[derive(Serialize)]
struct FeaturesDocument<'a> {
	features: &'a BTreeMap<String, FeatureRecord>,
}

impl Dataset {
	/// Every feature referenced by an entry must have a record, and no entry
	/// may be empty.
	pub fn check_invariants(&self) -> QuizResult<()> {
		for (index, entry) in self.entries.iter().enumerate() {
			if entry.code.trim().is_empty() {
				return Err(QuizError::DatasetInvariant(format!(
					"entry {index} has no code"
				)));
			}

			if let Some(missing) = entry
				.features
				.iter()
				.find(|id| !self.features.contains_key(*id))
			{
				return Err(QuizError::DatasetInvariant(format!(
					"entry {index} references unknown feature `{missing}`"
				)));
			}
		}

		Ok(())
	}

	/// Randomly permute the entries. A seed makes the order reproducible.
	pub fn shuffle(&mut self, seed: Option<u64>) {
		let mut rng: Box<dyn RngCore> = if let Some(seed) = seed {
			Box::new(StdRng::seed_from_u64(seed))
		} else {
			Box::new(rand::thread_rng())
		};

		self.entries.shuffle(&mut rng);
	}

	/// `{"entries": [...]}`
	pub fn entries_json(&self) -> QuizResult<String> {
		to_json(
			"code.json",
			&EntriesDocument {
				entries: &self.entries,
			},
		)
	}

	/// `{"features": {...}}`
	pub fn features_json(&self) -> QuizResult<String> {
		to_json(
			"features.json",
			&FeaturesDocument {
				features: &self.features,
			},
		)
	}
}

fn to_json(artifact: &str, value: &impl Serialize) -> QuizResult<String> {
	serde_json::to_string_pretty(value).map_err(|e| {
		QuizError::Serialize {
			artifact: artifact.to_string(),
			reason: e.to_string(),
		}
	})
}

/// Why a scanned snippet was left out of the corpus. Exclusions are routine
/// and never abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
	/// Neither a header annotation nor the file name gives a version.
	MissingVersion,
	VersionOutOfRange,
	/// Non-empty line count after comment stripping is out of bounds.
	LineCountOutOfRange,
	/// Nothing is left after sanitization.
	EmptyAfterSanitize,
}

impl fmt::Display for ExclusionReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let text = match self {
			Self::MissingVersion => "no expected version",
			Self::VersionOutOfRange => "version out of range",
			Self::LineCountOutOfRange => "line count out of range",
			Self::EmptyAfterSanitize => "empty after sanitizing",
		};
		f.write_str(text)
	}
}

/// Counts gathered while scanning snippets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
	pub scanned: usize,
	pub included: usize,
	pub excluded: BTreeMap<ExclusionReason, usize>,
}

impl ScanSummary {
	pub fn excluded_total(&self) -> usize {
		self.excluded.values().sum()
	}

	fn record(&mut self, outcome: Result<(), ExclusionReason>) {
		self.scanned += 1;
		match outcome {
			Ok(()) => self.included += 1,
			Err(reason) => *self.excluded.entry(reason).or_default() += 1,
		}
	}
}

/// Filters and sanitizes scanned snippets and merges them with curated
/// entries and the feature registry.
#[derive(Debug, Clone)]
pub struct DatasetAssembler {
	filter: FilterConfig,
	extractor: MetadataExtractor,
	sanitizer: Sanitizer,
	curated_weight: usize,
}

impl Default for DatasetAssembler {
	fn default() -> Self {
		Self::from_config(&QuizConfig::default())
	}
}

impl DatasetAssembler {
	pub fn from_config(config: &QuizConfig) -> Self {
		Self {
			filter: config.filter,
			extractor: MetadataExtractor::new(
				&config.sanitize.version_keyword,
				config.filter.earliest_milestone,
			),
			sanitizer: Sanitizer::from_config(&config.sanitize),
			curated_weight: config.curated.weight,
		}
	}

	#[must_use]
	pub fn with_curated_weight(mut self, weight: usize) -> Self {
		self.curated_weight = weight;
		self
	}

	#[must_use]
	pub fn with_filter(mut self, filter: FilterConfig) -> Self {
		self.filter = filter;
		self
	}

	pub fn sanitizer(&self) -> &Sanitizer {
		&self.sanitizer
	}

	/// Turn one snippet into a quiz entry or say why it is excluded.
	///
	/// Checks run in order: version, line count (after comment stripping,
	/// before renaming), then emptiness of the sanitized code.
	pub fn process_candidate(&self, path: &Path, text: &str) -> Result<QuizEntry, ExclusionReason> {
		let candidate = SourceCandidate::from_text(path, text, &self.extractor, &self.sanitizer)
			.ok_or(ExclusionReason::MissingVersion)?;

		if !self.filter.accepts_version(candidate.expected_version()) {
			return Err(ExclusionReason::VersionOutOfRange);
		}

		if !self.filter.accepts_line_count(candidate.line_count) {
			return Err(ExclusionReason::LineCountOutOfRange);
		}

		let code = self.sanitizer.sanitize_uncommented(&candidate.uncommented);
		if code.trim().is_empty() {
			return Err(ExclusionReason::EmptyAfterSanitize);
		}

		Ok(QuizEntry {
			code,
			correct: candidate.metadata.expected_version,
			features: candidate.metadata.features,
		})
	}

	/// Read and process every file, in order.
	pub fn scan_entries(&self, files: &[PathBuf]) -> QuizResult<(Vec<QuizEntry>, ScanSummary)> {
		let mut entries = Vec::new();
		let mut summary = ScanSummary::default();

		for path in files {
			let text = read_source(path)?;
			match self.process_candidate(path, &text) {
				Ok(entry) => {
					entries.push(entry);
					summary.record(Ok(()));
				}
				Err(reason) => {
					tracing::debug!(path = %path.display(), %reason, "excluded snippet");
					summary.record(Err(reason));
				}
			}
		}

		tracing::info!(
			scanned = summary.scanned,
			included = summary.included,
			excluded = summary.excluded_total(),
			"scanned snippets"
		);
		Ok((entries, summary))
	}

	/// Merge scanned and curated entries and build the feature records.
	///
	/// The curated set is repeated `curated_weight` times. Every registry
	/// feature gets a record; identifiers only known from entries get a
	/// fallback record labeled with the identifier. When
	/// `require_descriptions` is set, a registry feature without a description
	/// is an error.
	pub fn assemble(
		&self,
		scanned: Vec<QuizEntry>,
		curated: &[CuratedEntry],
		registry: &FeatureRegistry,
		descriptions: &BTreeMap<String, FeatureDescription>,
		require_descriptions: bool,
	) -> QuizResult<Dataset> {
		let mut entries = scanned;
		let scanned_count = entries.len();

		for _ in 0..self.curated_weight {
			entries.extend(curated.iter().map(|entry| {
				QuizEntry {
					code: entry.code.clone(),
					correct: entry.correct,
					features: entry.features.clone(),
				}
			}));
		}

		let description_of = |id: &str| {
			descriptions
				.get(id)
				.map(|description| description.markdown.clone())
				.unwrap_or_default()
		};

		let mut features = BTreeMap::new();
		for definition in registry.iter() {
			if require_descriptions && !descriptions.contains_key(&definition.id) {
				return Err(QuizError::MissingDescription {
					feature: definition.id.clone(),
					path: format!("{}.md", definition.id),
				});
			}

			features.insert(
				definition.id.clone(),
				FeatureRecord {
					label: definition.label.clone(),
					description: description_of(&definition.id),
					version: definition.version,
				},
			);
		}

		let legacy: BTreeMap<&str, _> = curated
			.iter()
			.flat_map(|entry| entry.legacy.iter())
			.map(|(id, feature)| (id.as_str(), feature))
			.collect();
		let mut unknown = BTreeSet::new();

		for entry in &entries {
			for id in &entry.features {
				if features.contains_key(id) {
					continue;
				}

				let metadata = legacy.get(id.as_str());
				let record = FeatureRecord {
					label: metadata
						.and_then(|feature| feature.label.clone())
						.unwrap_or_else(|| id.clone()),
					description: description_of(id),
					version: metadata
						.and_then(|feature| feature.numeric_version())
						.unwrap_or(entry.correct),
				};
				features.insert(id.clone(), record);
				unknown.insert(id.as_str());
			}
		}

		for id in &unknown {
			tracing::warn!(feature = *id, "feature is not in the registry, using a fallback record");
		}

		let dataset = Dataset { entries, features };
		dataset.check_invariants()?;

		tracing::info!(
			scanned = scanned_count,
			total = dataset.entries.len(),
			features = dataset.features.len(),
			"assembled dataset"
		);
		Ok(dataset)
	}
}
