use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::config::AssetSource;
use crate::config::AssetsConfig;

/// Downloads the text of a third-party asset.
pub trait AssetFetcher {
	/// Fetch the body at `url`. Errors are plain messages since a failed
	/// fetch is never fatal.
	fn fetch(&self, url: &str) -> Result<String, String>;
}

/// Fetches assets over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
	agent: ureq::Agent,
}

impl Default for HttpFetcher {
	fn default() -> Self {
		Self::new(Duration::from_secs(30))
	}
}

impl HttpFetcher {
	pub fn new(timeout: Duration) -> Self {
		Self {
			agent: ureq::AgentBuilder::new().timeout(timeout).build(),
		}
	}
}

impl AssetFetcher for HttpFetcher {
	fn fetch(&self, url: &str) -> Result<String, String> {
		let response = self.agent.get(url).call().map_err(|e| e.to_string())?;
		response.into_string().map_err(|e| e.to_string())
	}
}

/// Never reaches the network. Only cached assets are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl AssetFetcher for OfflineFetcher {
	fn fetch(&self, url: &str) -> Result<String, String> {
		Err(format!("offline, not fetching {url}"))
	}
}

/// Downloaded assets kept on disk between runs, one file per URL.
#[derive(Debug, Clone)]
pub struct AssetCache {
	dir: PathBuf,
}

impl AssetCache {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// The cache file for `url`. Every character outside `[A-Za-z0-9.-]` is
	/// replaced with `_`.
	pub fn path_for(&self, url: &str) -> PathBuf {
		let key: String = url
			.trim_start_matches("https://")
			.trim_start_matches("http://")
			.chars()
			.map(|ch| {
				if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
					ch
				} else {
					'_'
				}
			})
			.collect();
		self.dir.join(key)
	}

	pub fn get(&self, url: &str) -> Option<String> {
		std::fs::read_to_string(self.path_for(url)).ok()
	}

	/// Store `content` for `url`. Best effort: failures leave the cache
	/// without the entry.
	pub fn put(&self, url: &str, content: &str) {
		let cache_path = self.path_for(url);

		if std::fs::create_dir_all(&self.dir).is_err() {
			tracing::debug!(dir = %self.dir.display(), "could not create asset cache directory");
			return;
		}

		let temp_path = cache_path.with_extension(format!(
			"tmp-{}-{}",
			std::process::id(),
			SystemTime::now()
				.duration_since(UNIX_EPOCH)
				.map_or(0, |duration| duration.as_nanos())
		));

		if std::fs::write(&temp_path, content).is_err() {
			return;
		}

		if std::fs::rename(&temp_path, &cache_path).is_err() {
			let _ = std::fs::remove_file(temp_path);
		}
	}

	/// The cached text of `source`, fetching and caching it when absent.
	///
	/// A failed fetch yields a placeholder comment and is not cached, so the
	/// next run tries again.
	pub fn fetch_or_placeholder(&self, fetcher: &dyn AssetFetcher, source: &AssetSource) -> String {
		if let Some(content) = self.get(&source.url) {
			tracing::debug!(asset = %source.name, "using cached asset");
			return content;
		}

		match fetcher.fetch(&source.url) {
			Ok(content) => {
				self.put(&source.url, &content);
				content
			}
			Err(error) => {
				tracing::warn!(asset = %source.name, url = %source.url, %error, "asset download failed");
				placeholder(&source.name)
			}
		}
	}
}

/// Stand-in text for an asset that could not be downloaded.
pub fn placeholder(name: &str) -> String {
	format!("/* Error downloading {name} */")
}

/// Fetched third-party text ready to embed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBundle {
	/// Contents of `deps.js`.
	pub scripts: String,
	/// Stylesheet text inlined into the page.
	pub styles: String,
}

/// Fetch every configured script and stylesheet.
pub fn collect_assets(
	cache: &AssetCache,
	fetcher: &dyn AssetFetcher,
	config: &AssetsConfig,
) -> AssetBundle {
	let scripts: Vec<(&str, String)> = config
		.scripts
		.iter()
		.map(|source| (source.name.as_str(), cache.fetch_or_placeholder(fetcher, source)))
		.collect();
	let styles: Vec<String> = config
		.styles
		.iter()
		.map(|source| cache.fetch_or_placeholder(fetcher, source))
		.collect();

	AssetBundle {
		scripts: bundle_scripts(&scripts),
		styles: styles.join("\n"),
	}
}

/// Concatenate scripts under a header naming each of them.
pub fn bundle_scripts(scripts: &[(&str, String)]) -> String {
	let names: Vec<&str> = scripts.iter().map(|(name, _)| *name).collect();
	let mut bundle = format!(
		"// Dependencies: {}\n// Auto-generated - do not edit\n",
		names.join(" + ")
	);

	for (name, content) in scripts {
		bundle.push_str(&format!("\n// === {name} ===\n{content}\n"));
	}

	bundle
}
