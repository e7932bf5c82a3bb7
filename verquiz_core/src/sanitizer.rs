use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::config::SanitizeConfig;
use crate::lexer::JavaToken;
use crate::lexer::Lexeme;
use crate::lexer::lex;

/// A rule marking an identifier as a spoiler: a name that would reveal the
/// snippet's target version or test category to a player.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpoilerPattern {
	/// The keyword immediately followed by one or more digits anywhere in the
	/// identifier, e.g. `Java8`, `Tiny_Foo_Java16`, `Java21Feature`.
	VersionHint(Cow<'static, str>),
	/// The identifier starts with this test-category prefix, e.g. `Edge_`.
	Prefix(Cow<'static, str>),
}

impl SpoilerPattern {
	/// Whether `ident` matches this pattern.
	pub fn matches(&self, ident: &str) -> bool {
		match self {
			Self::VersionHint(keyword) => {
				ident.match_indices(keyword.as_ref()).any(|(index, _)| {
					ident[index + keyword.len()..]
						.chars()
						.next()
						.is_some_and(|ch| ch.is_ascii_digit())
				})
			}
			Self::Prefix(prefix) => ident.starts_with(prefix.as_ref()),
		}
	}
}

/// The spoiler patterns applied when no configuration overrides them.
pub const SPOILER_PATTERNS: &[SpoilerPattern] = &[
	SpoilerPattern::VersionHint(Cow::Borrowed("Java")),
	SpoilerPattern::Prefix(Cow::Borrowed("Tiny_")),
	SpoilerPattern::Prefix(Cow::Borrowed("Edge_")),
	SpoilerPattern::Prefix(Cow::Borrowed("Combo_")),
	SpoilerPattern::Prefix(Cow::Borrowed("Minimal")),
];

/// Identifiers shorter than this that contain no digit are never treated as
/// spoilers.
pub const MIN_SPOILER_LENGTH: usize = 4;

/// Replacement for every spoiler identifier.
pub const NEUTRAL_NAME: &str = "Example";

/// Replacement for a spoiler-named public top-level type.
pub const QUIZ_NAME: &str = "Quiz";

/// Line comments starting with this marker survive comment stripping.
pub const DOC_MARKER: &str = "///";

/// Keywords that may start a type declaration line following the imports.
const TYPE_START_KEYWORDS: &[&str] = &[
	"public",
	"class",
	"interface",
	"enum",
	"record",
	"abstract",
	"final",
	"sealed",
	"non-sealed",
	"strictfp",
	"@",
];

/// Maximal runs of identifier characters, including runs that begin with a
/// digit so that a version hint glued to a number is still caught.
static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"[A-Za-z0-9_$]+").unwrap_or_else(|e| panic!("invalid word pattern: {e}"))
});

/// The kind of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
	Class,
	Record,
	Interface,
	Enum,
	/// An `@interface` annotation type.
	Annotation,
}

impl TypeKind {
	fn from_keyword(keyword: &str, annotation: bool) -> Option<Self> {
		match keyword {
			"interface" if annotation => Some(Self::Annotation),
			"class" => Some(Self::Class),
			"record" => Some(Self::Record),
			"interface" => Some(Self::Interface),
			"enum" => Some(Self::Enum),
			_ => None,
		}
	}

	/// Class and record declarations are the typical main type of a file.
	pub fn is_preferred(self) -> bool {
		matches!(self, Self::Class | Self::Record)
	}
}

/// A top-level type declaration found in a snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
	pub kind: TypeKind,
	pub name: String,
	pub public: bool,
}

/// Turns raw snippet text into code that can be shown as a "guess the
/// version" puzzle without breaking its syntax.
///
/// The transformation runs in a fixed order:
///
/// 1. strip block and line comments, keeping doc-marker lines;
/// 2. remove the package declaration;
/// 3. replace every spoiler identifier with the neutral name;
/// 4. rename a spoiler-named public top-level type to the quiz name;
/// 5. normalize blank lines.
#[derive(Debug, Clone)]
pub struct Sanitizer {
	patterns: Vec<SpoilerPattern>,
	min_length: usize,
	neutral_name: String,
	quiz_name: String,
	doc_marker: String,
}

impl Default for Sanitizer {
	fn default() -> Self {
		Self {
			patterns: SPOILER_PATTERNS.to_vec(),
			min_length: MIN_SPOILER_LENGTH,
			neutral_name: NEUTRAL_NAME.to_string(),
			quiz_name: QUIZ_NAME.to_string(),
			doc_marker: DOC_MARKER.to_string(),
		}
	}
}

impl Sanitizer {
	/// Build a sanitizer from the `[sanitize]` config section.
	pub fn from_config(config: &SanitizeConfig) -> Self {
		let mut patterns = vec![SpoilerPattern::VersionHint(Cow::Owned(
			config.version_keyword.clone(),
		))];
		patterns.extend(
			config
				.test_prefixes
				.iter()
				.map(|prefix| SpoilerPattern::Prefix(Cow::Owned(prefix.clone()))),
		);

		Self {
			patterns,
			min_length: config.min_length,
			neutral_name: config.neutral_name.clone(),
			quiz_name: config.quiz_name.clone(),
			doc_marker: config.doc_marker.clone(),
		}
	}

	/// Add another spoiler pattern.
	#[must_use]
	pub fn with_pattern(mut self, pattern: SpoilerPattern) -> Self {
		self.patterns.push(pattern);
		self
	}

	pub fn patterns(&self) -> &[SpoilerPattern] {
		&self.patterns
	}

	/// Short identifiers without digits are never spoilers, e.g. an interface
	/// called `I`.
	pub fn is_exempt(&self, ident: &str) -> bool {
		ident.chars().count() < self.min_length && !ident.chars().any(|ch| ch.is_ascii_digit())
	}

	/// Whether `ident` reveals a version or test category.
	pub fn is_spoiler(&self, ident: &str) -> bool {
		!self.is_exempt(ident) && self.patterns.iter().any(|pattern| pattern.matches(ident))
	}

	/// Run every sanitization step over `source`.
	///
	/// An empty result means the snippet has nothing left to show.
	pub fn sanitize(&self, source: &str) -> String {
		self.sanitize_uncommented(&self.strip_comments(source))
	}

	/// Run the steps after comment stripping. `uncommented` must be the output
	/// of [`Sanitizer::strip_comments`].
	pub(crate) fn sanitize_uncommented(&self, uncommented: &str) -> String {
		let code = remove_package_declaration(uncommented);
		let code = self.replace_spoilers(&code);
		let code = self.rename_quiz_type(&code);
		normalize_blank_lines(&code)
	}

	/// Remove block and line comments. Line comments starting with the doc
	/// marker are kept. Literals are never mistaken for comments.
	pub fn strip_comments(&self, source: &str) -> String {
		let mut output = String::with_capacity(source.len());

		for lexeme in lex(source) {
			match lexeme.token {
				JavaToken::BlockComment => {
					let previous = output.chars().next_back();
					let next = source[lexeme.span.end..].chars().next();
					if previous.is_some_and(is_word_char) && next.is_some_and(is_word_char) {
						output.push(' ');
					}
				}
				JavaToken::LineComment if !lexeme.text.starts_with(&self.doc_marker) => {}
				_ => output.push_str(lexeme.text),
			}
		}

		output
	}

	/// Replace every spoiler identifier with the neutral name.
	pub fn replace_spoilers(&self, code: &str) -> String {
		WORD_PATTERN
			.replace_all(code, |caps: &Captures<'_>| {
				let word = &caps[0];
				if self.is_spoiler(word) {
					self.neutral_name.clone()
				} else {
					word.to_string()
				}
			})
			.into_owned()
	}

	/// Rename the first public top-level type to the quiz name when its name
	/// is spoiler-like or was already neutralized.
	pub fn rename_quiz_type(&self, code: &str) -> String {
		let Some(declaration) = find_quiz_type(code) else {
			return code.to_string();
		};

		if !self.is_spoiler(&declaration.name) && declaration.name != self.neutral_name {
			return code.to_string();
		}

		rename_word(code, &declaration.name, &self.quiz_name)
	}
}

/// Sanitize with the default spoiler patterns.
pub fn sanitize(source: &str) -> String {
	Sanitizer::default().sanitize(source)
}

/// Strip comments with the default doc marker.
pub fn strip_comments(source: &str) -> String {
	Sanitizer::default().strip_comments(source)
}

/// Count lines containing anything other than whitespace.
pub fn count_non_empty_lines(text: &str) -> usize {
	text.lines().filter(|line| !line.trim().is_empty()).count()
}

fn is_word_char(ch: char) -> bool {
	ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

/// Remove the `package ...;` declaration, from the keyword through its
/// terminating semicolon. Code sharing a line with the declaration is kept.
pub fn remove_package_declaration(code: &str) -> String {
	let lexemes = lex(code);
	let mut output = String::with_capacity(code.len());
	let mut depth = 0usize;
	let mut index = 0;

	while index < lexemes.len() {
		let lexeme = &lexemes[index];

		match lexeme.token {
			JavaToken::BraceOpen => depth += 1,
			JavaToken::BraceClose => depth = depth.saturating_sub(1),
			JavaToken::Ident if depth == 0 && lexeme.text == "package" => {
				if let Some(len) = package_declaration_len(&lexemes[index + 1..]) {
					index += 1 + len;
					while lexemes
						.get(index)
						.is_some_and(|next| next.token == JavaToken::Whitespace)
					{
						index += 1;
					}

					// A declaration alone on its line takes the line with it.
					let line_start = output.rfind('\n').map_or(0, |newline| newline + 1);
					if output[line_start..].trim().is_empty()
						&& lexemes
							.get(index)
							.is_some_and(|next| next.token == JavaToken::Newline)
					{
						output.truncate(line_start);
						index += 1;
					}
					continue;
				}
			}
			_ => {}
		}

		output.push_str(lexeme.text);
		index += 1;
	}

	output
}

/// Number of lexemes after `package` up to and including the `;` ending a
/// dotted name. `None` when the tokens do not form a declaration.
fn package_declaration_len(rest: &[Lexeme<'_>]) -> Option<usize> {
	let mut named = false;

	for (offset, lexeme) in rest.iter().enumerate() {
		match lexeme.token {
			JavaToken::Semicolon if named => return Some(offset + 1),
			JavaToken::Ident => named = true,
			JavaToken::Punct if lexeme.text == "." => {}
			JavaToken::Whitespace
			| JavaToken::Newline
			| JavaToken::LineComment
			| JavaToken::BlockComment => {}
			_ => return None,
		}
	}

	None
}

/// Replace every whole-word occurrence of `from` with `to`.
fn rename_word(code: &str, from: &str, to: &str) -> String {
	WORD_PATTERN
		.replace_all(code, |caps: &Captures<'_>| {
			if &caps[0] == from {
				to.to_string()
			} else {
				caps[0].to_string()
			}
		})
		.into_owned()
}

/// Collect the top-level type declarations of `code` in source order.
pub fn find_top_level_types(code: &str) -> Vec<TypeDeclaration> {
	let lexemes: Vec<_> = lex(code)
		.into_iter()
		.filter(|lexeme| lexeme.token.is_significant())
		.collect();
	let mut declarations = Vec::new();
	let mut modifiers: Vec<&str> = Vec::new();
	let mut depth = 0usize;
	let mut index = 0;

	while index < lexemes.len() {
		let lexeme = &lexemes[index];

		match lexeme.token {
			JavaToken::BraceOpen => {
				depth += 1;
				modifiers.clear();
			}
			JavaToken::BraceClose => {
				depth = depth.saturating_sub(1);
				modifiers.clear();
			}
			JavaToken::Semicolon if depth == 0 => modifiers.clear(),
			JavaToken::Ident if depth == 0 => {
				let annotation = index > 0 && lexemes[index - 1].token == JavaToken::At;
				let kind = TypeKind::from_keyword(lexeme.text, annotation);
				let name = lexemes
					.get(index + 1)
					.filter(|next| next.token == JavaToken::Ident);

				if let (Some(kind), Some(name)) = (kind, name) {
					declarations.push(TypeDeclaration {
						kind,
						name: name.text.to_string(),
						public: modifiers.contains(&"public"),
					});
					modifiers.clear();
					index += 2;
					continue;
				}

				modifiers.push(lexeme.text);
			}
			_ => {}
		}

		index += 1;
	}

	declarations
}

/// The first public top-level type, preferring classes and records over
/// interfaces, enums and annotation types.
pub fn find_quiz_type(code: &str) -> Option<TypeDeclaration> {
	let public: Vec<_> = find_top_level_types(code)
		.into_iter()
		.filter(|declaration| declaration.public)
		.collect();
	let preferred = public
		.iter()
		.position(|declaration| declaration.kind.is_preferred());

	match preferred {
		Some(index) => public.into_iter().nth(index),
		None => public.into_iter().next(),
	}
}

/// Trim trailing whitespace, put one blank line between the imports and the
/// first type declaration, collapse blank-line runs and trim blank lines at
/// both ends. Lines inside multi-line text blocks are kept verbatim.
pub fn normalize_blank_lines(code: &str) -> String {
	let literal = text_block_lines(code);
	let mut lines: Vec<(&str, bool)> = code
		.split('\n')
		.enumerate()
		.map(|(number, line)| {
			if literal.contains(&number) {
				(line, true)
			} else {
				(line.trim_end(), false)
			}
		})
		.collect();

	if let Some(last_import) = lines
		.iter()
		.rposition(|(line, verbatim)| !verbatim && line.trim_start().starts_with("import "))
	{
		let next = lines[last_import + 1..]
			.iter()
			.position(|(line, _)| !line.is_empty())
			.map(|offset| last_import + 1 + offset);

		if let Some(next) = next {
			if starts_type_declaration(lines[next].0) && next == last_import + 1 {
				lines.insert(next, ("", false));
			}
		}
	}

	let mut output: Vec<(&str, bool)> = Vec::with_capacity(lines.len());
	for (line, verbatim) in lines {
		if !verbatim && line.is_empty() && output.last().is_none_or(|(last, _)| last.is_empty()) {
			continue;
		}
		output.push((line, verbatim));
	}

	while output
		.last()
		.is_some_and(|(line, verbatim)| !verbatim && line.is_empty())
	{
		output.pop();
	}

	output
		.into_iter()
		.map(|(line, _)| line)
		.collect::<Vec<_>>()
		.join("\n")
}

/// Zero-based numbers of the lines that lie inside a text block, after its
/// opening line and before its closing line.
fn text_block_lines(code: &str) -> BTreeSet<usize> {
	let mut lines = BTreeSet::new();

	for lexeme in lex(code) {
		if lexeme.token != JavaToken::StringLiteral || !lexeme.text.contains('\n') {
			continue;
		}

		let first = code[..lexeme.span.start].matches('\n').count();
		let last = first + lexeme.text.matches('\n').count();
		lines.extend(first + 1..last);
	}

	lines
}

fn starts_type_declaration(line: &str) -> bool {
	let line = line.trim_start();
	TYPE_START_KEYWORDS.iter().any(|keyword| {
		if *keyword == "@" {
			return line.starts_with('@');
		}

		line.strip_prefix(keyword)
			.is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
	})
}
