//! `verquiz_core` builds the data behind a "guess the Java version" quiz. It
//! turns a corpus of annotated Java snippets into quiz entries, checks the
//! per-feature markdown descriptions shown after each answer, and renders the
//! static game page.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Snippet tree
//!   → Scanner (collects snippet files, honoring exclude rules)
//!   → Metadata extractor (expected version + required features per snippet)
//!   → Filter (version range, non-empty line count after comment stripping)
//!   → Sanitizer (comments, package, spoiler identifiers, quiz type name, blank lines)
//!   → Assembler (curated entries, registry completion, shuffle)
//!   → Artifacts (code.json, features.json, deps.js, index.html)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `verquiz.toml`.
//! - [`sanitizer`]: Rewrites a snippet so it no longer gives its answer away.
//! - [`metadata`]: Reads `Expected Version:` and `Required Features:` annotations.
//! - [`registry`]: Parses the feature registry out of the enum that declares it.
//! - [`descriptions`]: Structural validation of feature description documents.
//! - [`dataset`]: Filtering, merging and invariants of the emitted corpus.
//! - [`assets`]: Fetching and caching of third-party scripts and stylesheets.
//!
//! ## Key Types
//!
//! - [`Sanitizer`]: The configurable code sanitizer.
//! - [`DatasetAssembler`]: Turns snippets and curated entries into a [`Dataset`].
//! - [`QuizProject`]: A project root with its config, able to run the whole pipeline.
//! - [`QuizError`]: Every hard failure, rendered through `miette`.
//!
//! ## Spoiler identifiers
//!
//! A snippet named `Tiny_SwitchPatterns_Java21` would answer its own question.
//! Identifiers that contain the version keyword followed by digits, or start
//! with a test-category prefix, are replaced with a neutral name. Identifiers
//! shorter than four characters without digits are always kept, so
//! `interface I {}` stays as written.

pub use artifacts::*;
pub use assets::*;
pub use config::*;
pub use curated::*;
pub use dataset::*;
pub use descriptions::*;
pub use error::*;
pub use metadata::*;
pub use pipeline::*;
pub use registry::*;
pub use render::*;
pub use sanitizer::*;
pub use scanner::*;

mod artifacts;
pub mod assets;
pub mod config;
mod curated;
pub mod dataset;
pub mod descriptions;
#[allow(unused_assignments)]
mod error;
pub(crate) mod lexer;
pub mod metadata;
mod pipeline;
pub mod registry;
mod render;
pub mod sanitizer;
mod scanner;

#[cfg(test)]
mod __fixtures;
