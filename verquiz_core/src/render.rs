use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::QuizError;
use crate::QuizResult;

/// Page used when the configured template file does not exist.
pub const DEFAULT_PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Guess the Java Version</title>
<base href="{{ base_url }}/">
<style>
{{ style }}
</style>
{{ analytics }}
</head>
<body>
<div id="root" data-entries="{{ entry_count }}" data-features="{{ feature_count }}"></div>
<script src="deps.js"></script>
</body>
</html>
"#;

/// Older templates use `{%name%}` placeholders.
static LEGACY_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\{%\s*([a-z_][a-z0-9_]*)\s*%\}")
		.unwrap_or_else(|e| panic!("invalid placeholder pattern: {e}"))
});

/// Variables available to the page template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageContext {
	/// Concatenated stylesheet text.
	pub style: String,
	/// Analytics script tag, or an empty string.
	pub analytics: String,
	/// Base URL without a trailing slash.
	pub base_url: String,
	pub entry_count: usize,
	pub feature_count: usize,
	/// Alias of `style` for older templates.
	pub prism_css: String,
}

impl PageContext {
	pub fn new(
		style: String,
		analytics: Option<&str>,
		base_url: String,
		entry_count: usize,
		feature_count: usize,
	) -> Self {
		Self {
			prism_css: style.clone(),
			style,
			analytics: analytics_snippet(analytics),
			base_url,
			entry_count,
			feature_count,
		}
	}

	fn names() -> [&'static str; 6] {
		[
			"style",
			"analytics",
			"base_url",
			"entry_count",
			"feature_count",
			"prism_css",
		]
	}
}

/// Render the page template through minijinja.
///
/// Legacy `{%name%}` placeholders are treated as `{{ name }}`. References to
/// unknown variables render empty and are logged.
pub fn render_page(template: &str, context: &PageContext) -> QuizResult<String> {
	let template = upgrade_legacy_placeholders(template);

	let mut env = minijinja::Environment::new();
	env.set_keep_trailing_newline(true);
	env.add_template("__page__", &template)
		.map_err(|e| QuizError::TemplateRender(e.to_string()))?;

	let page = env
		.get_template("__page__")
		.map_err(|e| QuizError::TemplateRender(e.to_string()))?;

	let known: HashSet<&str> = PageContext::names().into_iter().collect();
	let mut undefined: Vec<String> = page
		.undeclared_variables(false)
		.into_iter()
		.filter(|name| !known.contains(name.as_str()))
		.collect();
	undefined.sort();
	if !undefined.is_empty() {
		tracing::warn!(variables = ?undefined, "page template uses undefined variables");
	}

	page.render(minijinja::Value::from_serialize(context))
		.map_err(|e| QuizError::TemplateRender(e.to_string()))
}

/// Rewrite `{%name%}` placeholders as minijinja expressions. Block tags
/// such as `{% if x %}` contain a space-separated keyword and are left alone.
pub fn upgrade_legacy_placeholders(template: &str) -> String {
	LEGACY_PLACEHOLDER
		.replace_all(template, |caps: &regex::Captures<'_>| {
			let name = &caps[1];
			if is_block_keyword(name) {
				caps[0].to_string()
			} else {
				format!("{{{{ {name} }}}}")
			}
		})
		.into_owned()
}

fn is_block_keyword(name: &str) -> bool {
	matches!(
		name,
		"else" | "endif" | "endfor" | "endblock" | "endmacro" | "endset" | "endwith" | "endfilter"
			| "endcall" | "endautoescape" | "endraw" | "raw"
	)
}

/// A deferred script tag for the analytics endpoint, or an empty string
/// when there is none.
pub fn analytics_snippet(endpoint: Option<&str>) -> String {
	match endpoint.map(str::trim) {
		Some(endpoint) if !endpoint.is_empty() => {
			format!(
				r#"<script defer data-opt-in="true" src="{}"></script>"#,
				endpoint.replace('"', "&quot;")
			)
		}
		_ => String::new(),
	}
}

/// Validate the base URL: blank values are rejected and trailing slashes
/// removed.
pub fn normalize_base_url(base_url: Option<&str>) -> QuizResult<String> {
	let base_url = base_url.map(str::trim).unwrap_or_default();
	let normalized = base_url.trim_end_matches('/');

	if normalized.is_empty() {
		return Err(QuizError::MissingBaseUrl);
	}

	Ok(normalized.to_string())
}

/// Read the page template, falling back to [`DEFAULT_PAGE_TEMPLATE`] when the
/// file does not exist.
pub fn load_page_template(path: &Path) -> QuizResult<String> {
	match std::fs::read_to_string(path) {
		Ok(template) => Ok(template),
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
			tracing::warn!(path = %path.display(), "page template not found, using the built-in page");
			Ok(DEFAULT_PAGE_TEMPLATE.to_string())
		}
		Err(e) => {
			Err(QuizError::Read {
				path: path.display().to_string(),
				reason: e.to_string(),
			})
		}
	}
}
