use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use derive_more::Deref;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use snailquote::unescape;

/// `NAME(version, flag, "label"`. Any further constructor arguments are
/// ignored.
static ENTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"([A-Z0-9_]+)\s*\(\s*(-?\d+)\s*,\s*(?:true|false)\s*,\s*("(?:[^"\\\n]|\\.)+")"#)
		.unwrap_or_else(|e| panic!("invalid registry entry pattern: {e}"))
});

/// A language feature declared in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDefinition {
	/// Stable identifier, e.g. `SWITCH_EXPRESSIONS`.
	pub id: String,
	/// Version that introduced the feature.
	pub version: i32,
	/// Short human-readable label.
	pub label: String,
}

/// Feature definitions in declaration order, indexed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct FeatureRegistry {
	#[deref]
	definitions: Vec<FeatureDefinition>,
	index: BTreeMap<String, usize>,
}

impl FeatureRegistry {
	/// Insert a definition unless its identifier is already present. Returns
	/// whether it was inserted.
	pub fn insert(&mut self, definition: FeatureDefinition) -> bool {
		if self.index.contains_key(&definition.id) {
			return false;
		}

		self.index
			.insert(definition.id.clone(), self.definitions.len());
		self.definitions.push(definition);
		true
	}

	pub fn get(&self, id: &str) -> Option<&FeatureDefinition> {
		self.index.get(id).map(|&position| &self.definitions[position])
	}

	pub fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	/// All feature identifiers in sorted order.
	pub fn ids(&self) -> BTreeSet<&str> {
		self.index.keys().map(String::as_str).collect()
	}
}

impl FromIterator<FeatureDefinition> for FeatureRegistry {
	fn from_iter<T: IntoIterator<Item = FeatureDefinition>>(iter: T) -> Self {
		let mut registry = Self::default();
		for definition in iter {
			registry.insert(definition);
		}
		registry
	}
}

/// Extract the features declared in the `enum <block> { ... }` body of
/// `source`.
///
/// Entries not matching the `NAME(version, flag, "label"` shape are skipped.
/// A missing block produces an empty registry.
pub fn parse_registry(source: &str, block: &str) -> FeatureRegistry {
	let Some(body) = find_block_body(source, block) else {
		tracing::warn!(block, "feature registry block not found");
		return FeatureRegistry::default();
	};

	let mut registry = FeatureRegistry::default();

	for caps in ENTRY_PATTERN.captures_iter(body) {
		let id = caps[1].to_string();
		let Ok(version) = caps[2].parse::<i32>() else {
			tracing::debug!(id, "registry entry version out of range");
			continue;
		};
		let raw_label = &caps[3];
		let label = unescape(raw_label)
			.unwrap_or_else(|_| raw_label[1..raw_label.len() - 1].to_string());

		if !registry.insert(FeatureDefinition {
			id: id.clone(),
			version,
			label,
		}) {
			tracing::debug!(id, "duplicate registry entry ignored");
		}
	}

	registry
}

/// Read and parse the registry source at `path`.
///
/// A missing or unreadable file is not fatal: it produces an empty registry
/// and a warning, and every feature lookup falls back to its identifier.
pub fn load_registry(path: &Path, block: &str) -> FeatureRegistry {
	match std::fs::read_to_string(path) {
		Ok(source) => {
			let registry = parse_registry(&source, block);
			tracing::info!(
				path = %path.display(),
				features = registry.len(),
				"loaded feature registry"
			);
			registry
		}
		Err(e) => {
			tracing::warn!(
				path = %path.display(),
				error = %e,
				"feature registry source not found, feature details will be missing"
			);
			FeatureRegistry::default()
		}
	}
}

/// The text between `enum <block> ... {` and the first following `}`.
fn find_block_body<'a>(source: &'a str, block: &str) -> Option<&'a str> {
	let pattern = format!(r"(?s)\benum\s+{}\b[^{{]*\{{(.*?)\}}", regex::escape(block));
	let block_pattern = Regex::new(&pattern).ok()?;
	let caps = block_pattern.captures(source)?;
	caps.get(1).map(|body| body.as_str())
}
