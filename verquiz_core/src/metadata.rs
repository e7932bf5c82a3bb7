use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::FilterConfig;
use crate::sanitizer::Sanitizer;
use crate::sanitizer::count_non_empty_lines;

static EXPECTED_VERSION: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"Expected Version:[ \t]*(-?\d+)")
		.unwrap_or_else(|e| panic!("invalid version annotation pattern: {e}"))
});

static REQUIRED_FEATURES: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"Required Features:([^\n]*)")
		.unwrap_or_else(|e| panic!("invalid features annotation pattern: {e}"))
});

/// Where a snippet's expected version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
	/// An `Expected Version: N` header annotation.
	Header,
	/// A `<keyword><digits>` fragment in the file name.
	FileName,
	/// An explicitly empty `Required Features:` annotation.
	NoFeatures,
}

/// Metadata derived from a snippet's header annotations and file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetMetadata {
	pub expected_version: i32,
	pub version_source: VersionSource,
	/// Declared required feature identifiers in declaration order. Unknown
	/// identifiers are kept as-is.
	pub features: Vec<String>,
}

/// Reads version and feature annotations from snippet text.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
	file_name_version: Regex,
	earliest_milestone: i32,
}

impl Default for MetadataExtractor {
	fn default() -> Self {
		Self::new("Java", FilterConfig::default().earliest_milestone)
	}
}

impl MetadataExtractor {
	/// `keyword` is the file name prefix of an embedded version number, e.g.
	/// `Java` in `Java14_SwitchExpressions.java`.
	pub fn new(keyword: &str, earliest_milestone: i32) -> Self {
		let pattern = format!(r"{}(\d+)", regex::escape(keyword));
		let file_name_version = Regex::new(&pattern)
			.unwrap_or_else(|e| panic!("escaped keyword produced an invalid pattern: {e}"));

		Self {
			file_name_version,
			earliest_milestone,
		}
	}

	/// Derive the expected version and required features of a snippet.
	///
	/// Returns `None` when no version can be determined; such snippets are
	/// simply left out of the corpus.
	pub fn extract(&self, text: &str, file_name: &str) -> Option<SnippetMetadata> {
		let declared = parse_required_features(text);
		let features = declared.clone().unwrap_or_default();

		if declared.as_ref().is_some_and(Vec::is_empty) {
			return Some(SnippetMetadata {
				expected_version: self.earliest_milestone,
				version_source: VersionSource::NoFeatures,
				features,
			});
		}

		let (expected_version, version_source) = header_version(text)
			.map(|version| (version, VersionSource::Header))
			.or_else(|| {
				self.file_name_version(file_name)
					.map(|version| (version, VersionSource::FileName))
			})?;

		Some(SnippetMetadata {
			expected_version,
			version_source,
			features,
		})
	}

	fn file_name_version(&self, file_name: &str) -> Option<i32> {
		self.file_name_version
			.captures(file_name)
			.and_then(|caps| caps[1].parse().ok())
	}
}

fn header_version(text: &str) -> Option<i32> {
	EXPECTED_VERSION
		.captures(text)
		.and_then(|caps| caps[1].parse().ok())
}

/// Parse the `Required Features:` annotation. `None` when the annotation is
/// absent, an empty list when it is present but lists nothing.
pub fn parse_required_features(text: &str) -> Option<Vec<String>> {
	let caps = REQUIRED_FEATURES.captures(text)?;
	let features = caps[1]
		.split(|ch: char| ch.is_whitespace() || ch == ',')
		.filter(|token| !token.is_empty())
		.map(String::from)
		.collect();

	Some(features)
}

/// A snippet file that passed metadata extraction, with its comment-free
/// text and size.
#[derive(Debug, Clone)]
pub struct SourceCandidate {
	pub path: PathBuf,
	pub metadata: SnippetMetadata,
	/// The file text with comments stripped.
	pub uncommented: String,
	/// Number of non-empty lines after comment stripping.
	pub line_count: usize,
}

impl SourceCandidate {
	/// Extract metadata from `text` and measure it. Returns `None` when no
	/// version can be determined.
	pub fn from_text(
		path: &Path,
		text: &str,
		extractor: &MetadataExtractor,
		sanitizer: &Sanitizer,
	) -> Option<Self> {
		let file_name = path
			.file_name()
			.map(|name| name.to_string_lossy())
			.unwrap_or_default();
		let metadata = extractor.extract(text, &file_name)?;
		let uncommented = sanitizer.strip_comments(text);
		let line_count = count_non_empty_lines(&uncommented);

		Some(Self {
			path: path.to_path_buf(),
			metadata,
			uncommented,
			line_count,
		})
	}

	pub fn expected_version(&self) -> i32 {
		self.metadata.expected_version
	}
}
