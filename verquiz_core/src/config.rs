use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::QuizError;
use crate::QuizResult;

/// Default maximum snippet size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"verquiz.toml",
	".verquiz.toml",
	".config/verquiz.toml",
];

/// Configuration loaded from a `verquiz.toml` file.
///
/// Every section is optional. The defaults reproduce the layout of the
/// feature checker repository the game is built from.
///
/// ```toml
/// base_url = "https://example.com/quiz"
///
/// [sources]
/// root = "src/test/resources"
/// exclude_dirs = ["broken"]
///
/// [filter]
/// min_lines = 1
/// max_lines = 20
/// min_version = -1
/// max_version = 25
///
/// [descriptions]
/// mode = "strict"
///
/// [curated]
/// files = ["game/curated.json"]
/// weight = 2
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
	/// Where snippet files are discovered.
	pub sources: SourcesConfig,
	/// Where the feature registry declaration lives.
	pub registry: RegistryConfig,
	/// Where per-feature markdown descriptions live and how strictly they are
	/// loaded.
	pub descriptions: DescriptionsConfig,
	/// Inclusive bounds a scanned snippet must satisfy.
	pub filter: FilterConfig,
	/// Hand-curated historical entries merged into the corpus.
	pub curated: CuratedConfig,
	/// Spoiler patterns and replacement names used by the sanitizer.
	pub sanitize: SanitizeConfig,
	/// Output directory and page template.
	pub output: OutputConfig,
	/// Third-party scripts and stylesheets bundled with the page.
	pub assets: AssetsConfig,
	/// Base URL for absolute asset and share links. Required at run time; the
	/// command line flag takes precedence.
	pub base_url: Option<String>,
	/// Optional analytics endpoint embedded as an opt-in script tag.
	pub analytics: Option<String>,
}

/// Snippet discovery settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
	/// Directory tree scanned for snippets, relative to the project root.
	pub root: PathBuf,
	/// File extension (without the dot) a snippet must carry.
	pub extension: String,
	/// Directory names skipped anywhere in the tree.
	pub exclude_dirs: Vec<String>,
	/// Gitignore-style patterns, relative to the snippet root, for files and
	/// directories to skip.
	pub exclude: Vec<String>,
	/// Files larger than this many bytes are skipped.
	pub max_file_size: u64,
}

impl Default for SourcesConfig {
	fn default() -> Self {
		Self {
			root: PathBuf::from("src/test/resources"),
			extension: "java".to_string(),
			exclude_dirs: Vec::new(),
			exclude: Vec::new(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
		}
	}
}

/// Feature registry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
	/// Source file holding the registry enumeration.
	pub path: PathBuf,
	/// Name of the enumeration that demarcates the registry block.
	pub block: String,
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			path: PathBuf::from("src/main/java/me/bechberger/check/FeatureChecker.java"),
			block: "JavaFeature".to_string(),
		}
	}
}

/// How feature descriptions are loaded.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum DescriptionMode {
	/// Load and validate every description file found in the directory.
	#[default]
	Discover,
	/// Every registry feature must have a valid description file.
	Strict,
	/// Skip the description stage entirely.
	Off,
}

/// Feature description settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DescriptionsConfig {
	/// Directory containing one markdown file per feature.
	pub dir: PathBuf,
	/// Extension of description files (without the dot).
	pub extension: String,
	/// Loading behavior.
	pub mode: DescriptionMode,
}

impl Default for DescriptionsConfig {
	fn default() -> Self {
		Self {
			dir: PathBuf::from("src/main/resources/me/bechberger/check/features"),
			extension: "md".to_string(),
			mode: DescriptionMode::default(),
		}
	}
}

/// Inclusive bounds applied to scanned snippets.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterConfig {
	/// Minimum number of non-empty lines after comment stripping.
	pub min_lines: usize,
	/// Maximum number of non-empty lines after comment stripping.
	pub max_lines: usize,
	/// Lowest accepted expected version.
	pub min_version: i32,
	/// Highest accepted expected version.
	pub max_version: i32,
	/// Version assigned to snippets that explicitly declare no required
	/// features. Historical milestones are negative.
	pub earliest_milestone: i32,
}

impl Default for FilterConfig {
	fn default() -> Self {
		Self {
			min_lines: 1,
			max_lines: 20,
			min_version: -1,
			max_version: 25,
			earliest_milestone: -1,
		}
	}
}

impl FilterConfig {
	pub fn accepts_version(&self, version: i32) -> bool {
		(self.min_version..=self.max_version).contains(&version)
	}

	pub fn accepts_line_count(&self, lines: usize) -> bool {
		(self.min_lines..=self.max_lines).contains(&lines)
	}
}

/// Hand-curated entry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CuratedConfig {
	/// JSON files, each a list of `{code, correct, features}` objects.
	pub files: Vec<PathBuf>,
	/// How many times the curated set is replicated in the final corpus. `0`
	/// excludes it.
	pub weight: usize,
}

impl Default for CuratedConfig {
	fn default() -> Self {
		Self {
			files: Vec::new(),
			weight: 1,
		}
	}
}

/// Sanitizer settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
	/// Keyword that, immediately followed by digits, marks a version hint.
	pub version_keyword: String,
	/// Identifier prefixes that reveal a test category.
	pub test_prefixes: Vec<String>,
	/// Identifiers shorter than this and without digits are never renamed.
	pub min_length: usize,
	/// Replacement for spoiler identifiers.
	pub neutral_name: String,
	/// Replacement for a spoiler-named public top-level type.
	pub quiz_name: String,
	/// Line comment prefix that is kept during comment stripping.
	pub doc_marker: String,
}

impl Default for SanitizeConfig {
	fn default() -> Self {
		Self {
			version_keyword: "Java".to_string(),
			test_prefixes: ["Tiny_", "Edge_", "Combo_", "Minimal"]
				.into_iter()
				.map(String::from)
				.collect(),
			min_length: 4,
			neutral_name: "Example".to_string(),
			quiz_name: "Quiz".to_string(),
			doc_marker: "///".to_string(),
		}
	}
}

/// Output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
	/// Directory the artifacts are written to.
	pub dir: PathBuf,
	/// Page template rendered into `index.html`.
	pub template: PathBuf,
}

impl Default for OutputConfig {
	fn default() -> Self {
		Self {
			dir: PathBuf::from("game/dist"),
			template: PathBuf::from("game/template.html"),
		}
	}
}

/// A named third-party asset.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AssetSource {
	/// Human readable name used in bundle headers and placeholders.
	pub name: String,
	/// Where the asset is downloaded from.
	pub url: String,
}

impl AssetSource {
	fn new(name: &str, url: &str) -> Self {
		Self {
			name: name.to_string(),
			url: url.to_string(),
		}
	}
}

/// Bundled asset settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
	/// Directory holding downloaded assets between runs.
	pub cache_dir: PathBuf,
	/// Scripts concatenated into `deps.js`.
	pub scripts: Vec<AssetSource>,
	/// Stylesheets inlined into the page.
	pub styles: Vec<AssetSource>,
}

impl Default for AssetsConfig {
	fn default() -> Self {
		Self {
			cache_dir: PathBuf::from(".verquiz/cache"),
			scripts: vec![
				AssetSource::new("LemonadeJS", "https://lemonadejs.com/v5/lemonade.js"),
				AssetSource::new(
					"PrismJS Core",
					"https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/prism.min.js",
				),
				AssetSource::new(
					"PrismJS Java Language",
					"https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/components/prism-java.min.js",
				),
			],
			styles: vec![AssetSource::new(
				"Prism CSS",
				"https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/themes/prism-tomorrow.min.css",
			)],
		}
	}
}

impl QuizConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> QuizResult<Option<QuizConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_from(&config_path).map(Some)
	}

	/// Load the config from an explicit file.
	pub fn load_from(path: &Path) -> QuizResult<QuizConfig> {
		let content = std::fs::read_to_string(path)?;
		toml::from_str(&content).map_err(|e| QuizError::ConfigParse(e.to_string()))
	}

	/// Load the discovered config, falling back to defaults when absent.
	pub fn load_or_default(root: &Path) -> QuizResult<QuizConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}
}

/// Resolve a configured path against the project root. Absolute paths are
/// returned unchanged.
pub fn resolve_against(root: &Path, path: &Path) -> PathBuf {
	if path.is_absolute() {
		path.to_path_buf()
	} else {
		root.join(path)
	}
}
