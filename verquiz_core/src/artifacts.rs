use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::QuizResult;

pub const CODE_JSON: &str = "code.json";
pub const FEATURES_JSON: &str = "features.json";
pub const DEPS_JS: &str = "deps.js";
pub const INDEX_HTML: &str = "index.html";

/// Every output file of a run, rendered in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
	pub code_json: String,
	pub features_json: String,
	pub deps_js: String,
	pub index_html: String,
}

impl Artifacts {
	/// File names paired with their contents, in write order.
	pub fn files(&self) -> [(&'static str, &str); 4] {
		[
			(CODE_JSON, self.code_json.as_str()),
			(FEATURES_JSON, self.features_json.as_str()),
			(DEPS_JS, self.deps_js.as_str()),
			(INDEX_HTML, self.index_html.as_str()),
		]
	}

	/// Write every artifact into `dir`.
	///
	/// All contents are first written to temporary files next to their
	/// targets. Only when every temporary file exists are they renamed into
	/// place, so an I/O failure while writing leaves earlier outputs intact.
	pub fn write(&self, dir: &Path) -> QuizResult<Vec<PathBuf>> {
		std::fs::create_dir_all(dir)?;

		let suffix = format!(
			"tmp-{}-{}",
			std::process::id(),
			SystemTime::now()
				.duration_since(UNIX_EPOCH)
				.map_or(0, |duration| duration.as_nanos())
		);

		let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
		for (name, content) in self.files() {
			let target = dir.join(name);
			let temp = dir.join(format!(".{name}.{suffix}"));

			if let Err(e) = std::fs::write(&temp, content) {
				remove_staged(&staged);
				let _ = std::fs::remove_file(&temp);
				return Err(e.into());
			}

			staged.push((temp, target));
		}

		let mut written = Vec::with_capacity(staged.len());
		for (index, (temp, target)) in staged.iter().enumerate() {
			if let Err(e) = std::fs::rename(temp, target) {
				remove_staged(&staged[index..]);
				return Err(e.into());
			}

			tracing::debug!(path = %target.display(), "wrote artifact");
			written.push(target.clone());
		}

		Ok(written)
	}
}

fn remove_staged(staged: &[(PathBuf, PathBuf)]) {
	for (temp, _) in staged {
		let _ = std::fs::remove_file(temp);
	}
}
