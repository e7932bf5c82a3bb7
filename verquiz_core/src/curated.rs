use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::QuizError;
use crate::QuizResult;

/// A hand-written quiz entry, usually for a pre-release milestone that has no
/// snippet in the scanned corpus.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CuratedRecord {
	/// Quiz-ready code, shown as written.
	pub code: String,
	pub correct: i32,
	#[serde(default)]
	pub features: CuratedFeatures,
}

/// The two accepted shapes of a curated record's `features` list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CuratedFeatures {
	/// `["RECORDS", "SEALED_CLASSES"]`
	Ids(Vec<String>),
	/// `[{"name": "RECORDS", "label": "Records", "version": 16}]`
	Legacy(Vec<LegacyFeature>),
}

impl Default for CuratedFeatures {
	fn default() -> Self {
		Self::Ids(Vec::new())
	}
}

/// An inline feature object from the older curated format.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LegacyFeature {
	pub name: String,
	#[serde(default)]
	pub label: Option<String>,
	/// Usually an integer; older files use `"?"` for unknown versions.
	#[serde(default)]
	pub version: Option<serde_json::Value>,
}

impl LegacyFeature {
	/// The version when it is a number that fits an `i32`.
	pub fn numeric_version(&self) -> Option<i32> {
		match self.version.as_ref()? {
			serde_json::Value::Number(number) => {
				number.as_i64().and_then(|version| i32::try_from(version).ok())
			}
			serde_json::Value::String(text) => text.trim().parse().ok(),
			_ => None,
		}
	}
}

/// A curated record with its features normalized to identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct CuratedEntry {
	pub code: String,
	pub correct: i32,
	pub features: Vec<String>,
	/// Inline metadata of legacy-shaped features, keyed by identifier.
	pub legacy: BTreeMap<String, LegacyFeature>,
}

impl From<CuratedRecord> for CuratedEntry {
	fn from(record: CuratedRecord) -> Self {
		let (features, legacy) = match record.features {
			CuratedFeatures::Ids(ids) => (ids, BTreeMap::new()),
			CuratedFeatures::Legacy(objects) => {
				let ids = objects.iter().map(|feature| feature.name.clone()).collect();
				let legacy = objects
					.into_iter()
					.map(|feature| (feature.name.clone(), feature))
					.collect();
				(ids, legacy)
			}
		};

		Self {
			code: record.code,
			correct: record.correct,
			features,
			legacy,
		}
	}
}

/// Parse a curated JSON document: a list of `{code, correct, features}`.
pub fn parse_curated(content: &str) -> Result<Vec<CuratedEntry>, serde_json::Error> {
	let records: Vec<CuratedRecord> = serde_json::from_str(content)?;
	Ok(records.into_iter().map(CuratedEntry::from).collect())
}

/// Read and parse the curated file at `path`. Unlike the registry, a missing
/// curated file is an error since it was named explicitly.
pub fn load_curated(path: &Path) -> QuizResult<Vec<CuratedEntry>> {
	let content = std::fs::read_to_string(path).map_err(|e| {
		QuizError::Curated {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})?;

	let entries = parse_curated(&content).map_err(|e| {
		QuizError::Curated {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})?;

	tracing::info!(path = %path.display(), entries = entries.len(), "loaded curated entries");
	Ok(entries)
}
