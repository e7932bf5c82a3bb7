use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobMatcher;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::QuizError;
use crate::QuizResult;
use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::config::SourcesConfig;

/// Options for controlling which snippet files are collected.
///
/// Use [`SourceScanOptions::default()`] for the defaults or
/// [`SourceScanOptions::from_config`] to construct from a [`SourcesConfig`].
#[derive(Debug, Clone)]
pub struct SourceScanOptions {
	/// File extension of snippet files, without the dot.
	pub extension: String,
	/// Directory names skipped wherever they appear.
	pub exclude_dirs: Vec<String>,
	/// Gitignore-style patterns to exclude from scanning.
	pub exclude_patterns: Vec<String>,
	/// Files larger than this are skipped.
	pub max_file_size: u64,
}

impl Default for SourceScanOptions {
	fn default() -> Self {
		Self {
			extension: "java".to_string(),
			exclude_dirs: Vec::new(),
			exclude_patterns: Vec::new(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
		}
	}
}

impl SourceScanOptions {
	pub fn from_config(config: &SourcesConfig) -> Self {
		Self {
			extension: config.extension.trim_start_matches('.').to_string(),
			exclude_dirs: config.exclude_dirs.clone(),
			exclude_patterns: config.exclude.clone(),
			max_file_size: config.max_file_size,
		}
	}
}

/// Collect every snippet file below `root`, sorted by path.
///
/// Hidden directories, the configured directory names and paths matched by
/// the exclude patterns are skipped.
pub fn collect_source_files(root: &Path, options: &SourceScanOptions) -> QuizResult<Vec<PathBuf>> {
	if !root.is_dir() {
		return Err(QuizError::MissingSourceRoot(root.display().to_string()));
	}

	let exclude = build_exclude_matcher(root, &options.exclude_patterns)?;
	let matcher = Glob::new(&format!("*.{}", options.extension))
		.map_err(|e| {
			QuizError::ConfigParse(format!(
				"invalid source extension `{}`: {e}",
				options.extension
			))
		})?
		.compile_matcher();

	let walker = Walker {
		options,
		exclude: &exclude,
		matcher: &matcher,
	};
	let mut files = Vec::new();
	let mut ancestors = Vec::new();
	walker.walk_dir(root, &mut files, &mut ancestors)?;

	// Sort for deterministic ordering.
	files.sort();
	tracing::debug!(root = %root.display(), files = files.len(), "collected snippet files");
	Ok(files)
}

/// Build a `Gitignore` matcher from the `[sources] exclude` patterns.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> QuizResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			QuizError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| QuizError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

struct Walker<'a> {
	options: &'a SourceScanOptions,
	exclude: &'a Gitignore,
	matcher: &'a GlobMatcher,
}

impl Walker<'_> {
	fn walk_dir(
		&self,
		dir: &Path,
		files: &mut Vec<PathBuf>,
		ancestors: &mut Vec<PathBuf>,
	) -> QuizResult<()> {
		// A directory that is its own ancestor is a symlink cycle. Reaching
		// the same directory through sibling links is not.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if ancestors.contains(&canonical) {
			return Err(QuizError::SymlinkCycle {
				path: dir.display().to_string(),
			});
		}
		ancestors.push(canonical);

		for entry in std::fs::read_dir(dir)? {
			let path = entry?.path();
			let is_dir = path.is_dir();

			if self.exclude.matched(&path, is_dir).is_ignore() {
				continue;
			}

			if is_dir {
				if self.is_ignored_directory(&path) {
					continue;
				}
				self.walk_dir(&path, files, ancestors)?;
			} else if self.is_snippet_file(&path) {
				files.push(path);
			}
		}

		ancestors.pop();
		Ok(())
	}

	fn is_ignored_directory(&self, path: &Path) -> bool {
		let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
			return false;
		};

		name.starts_with('.') || self.options.exclude_dirs.iter().any(|dir| dir == name)
	}

	fn is_snippet_file(&self, path: &Path) -> bool {
		let Some(name) = path.file_name() else {
			return false;
		};

		if !self.matcher.is_match(name) {
			return false;
		}

		match path.metadata() {
			Ok(metadata) if metadata.len() > self.options.max_file_size => {
				tracing::debug!(path = %path.display(), size = metadata.len(), "skipping oversized file");
				false
			}
			Ok(_) => true,
			Err(_) => false,
		}
	}
}

/// Read a snippet file, replacing invalid UTF-8 and normalizing line endings.
pub fn read_source(path: &Path) -> QuizResult<String> {
	let bytes = std::fs::read(path).map_err(|e| {
		QuizError::Read {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})?;

	Ok(normalize_line_endings(&String::from_utf8_lossy(&bytes)))
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}
