use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// The structural rule a feature description document violated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DescriptionRule {
	/// One of the required section headers is absent.
	MissingHeader(&'static str),
	/// A required section header appears more than once.
	DuplicateHeader(&'static str),
	/// A required section header appears before one that should precede it.
	HeaderOutOfOrder { found: &'static str, expected: &'static str },
	/// Section headers use different heading levels.
	MixedHeadingLevels { section: &'static str, expected: u8, got: u8 },
	/// The Example section does not hold exactly one code block.
	ExampleBlockCount(usize),
	/// The Example code block has no language tag.
	ExampleMissingLanguage,
	/// The Example code block contains no comment.
	ExampleMissingComment,
	/// The Links section has no entries.
	LinksEmpty,
	/// A Links line is not a `- ` bullet.
	LinkNotBullet { line: usize },
	/// A Links bullet has no `[label](url)` link.
	LinkMissingLabel { line: usize },
}

impl fmt::Display for DescriptionRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MissingHeader(name) => write!(f, "missing header `{name}`"),
			Self::DuplicateHeader(name) => write!(f, "header `{name}` appears more than once"),
			Self::HeaderOutOfOrder { found, expected } => {
				write!(f, "header `{found}` found where `{expected}` was expected")
			}
			Self::MixedHeadingLevels {
				section,
				expected,
				got,
			} => {
				write!(
					f,
					"header `{section}` is level {got} but sections use level {expected}"
				)
			}
			Self::ExampleBlockCount(count) => {
				write!(
					f,
					"Example section must contain exactly one fenced code block, found {count}"
				)
			}
			Self::ExampleMissingLanguage => {
				write!(f, "Example code block has no language tag")
			}
			Self::ExampleMissingComment => {
				write!(f, "Example code block contains no comment")
			}
			Self::LinksEmpty => write!(f, "Links section empty"),
			Self::LinkNotBullet { line } => {
				write!(f, "Links line {line} is not a `- ` bullet")
			}
			Self::LinkMissingLabel { line } => {
				write!(f, "Links line {line} has no labeled `[label](url)` link")
			}
		}
	}
}

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum QuizError {
	#[error(transparent)]
	#[diagnostic(code(verquiz::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to read `{path}`: {reason}")]
	#[diagnostic(code(verquiz::read))]
	Read { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(verquiz::config_parse),
		help("check that verquiz.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("the base URL must not be empty")]
	#[diagnostic(
		code(verquiz::missing_base_url),
		help("pass `--base-url https://...` or set `base_url` in verquiz.toml")
	)]
	MissingBaseUrl,

	#[error("snippet root `{0}` does not exist")]
	#[diagnostic(code(verquiz::missing_source_root))]
	MissingSourceRoot(String),

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(verquiz::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },

	#[error("invalid description for feature `{feature}`: {rule}")]
	#[diagnostic(
		code(verquiz::invalid_description),
		help(
			"each description needs `Summary`, `Details`, `Example`, `Historical` and `Links` \
			 sections in that order"
		)
	)]
	InvalidDescription {
		feature: String,
		rule: DescriptionRule,
	},

	#[error("missing description for feature `{feature}`: expected `{path}`")]
	#[diagnostic(
		code(verquiz::missing_description),
		help("every registry feature needs a markdown description in strict mode")
	)]
	MissingDescription { feature: String, path: String },

	#[error("failed to load markdown: {0}")]
	#[diagnostic(code(verquiz::markdown))]
	Markdown(String),

	#[error("failed to parse curated entries in `{path}`: {reason}")]
	#[diagnostic(
		code(verquiz::curated),
		help("curated files hold a JSON list of `{{code, correct, features}}` objects")
	)]
	Curated { path: String, reason: String },

	#[error("dataset invariant violated: {0}")]
	#[diagnostic(code(verquiz::dataset_invariant))]
	DatasetInvariant(String),

	#[error("template rendering failed: {0}")]
	#[diagnostic(code(verquiz::template_render))]
	TemplateRender(String),

	#[error("failed to serialize `{artifact}`: {reason}")]
	#[diagnostic(code(verquiz::serialize))]
	Serialize { artifact: String, reason: String },
}

pub type QuizResult<T> = Result<T, QuizError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
