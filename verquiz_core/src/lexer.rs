use std::ops::Range;

use logos::Lexer;
use logos::Logos;

/// Raw tokens of a Java-like source file.
///
/// Only the distinctions the sanitizer needs are made: comments, literals
/// that may contain comment-like text, identifiers, braces for nesting depth
/// and layout. Everything else is a single-character `Punct`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JavaToken {
	#[token("/*", block_comment)]
	BlockComment,
	#[regex(r"//[^\n]*", allow_greedy = true)]
	LineComment,
	#[token("\"", string_literal)]
	StringLiteral,
	#[token("'", char_literal)]
	CharLiteral,
	#[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
	Ident,
	#[regex(r"[0-9][A-Za-z0-9_.]*")]
	Number,
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[token(";")]
	Semicolon,
	#[token("@")]
	At,
	#[token("/")]
	Slash,
	#[token("\n")]
	Newline,
	#[regex(r"[ \t\r\x0C]+")]
	Whitespace,
	#[regex(r#"[^ \t\r\n\x0C/"'{};@A-Za-z0-9_$]"#)]
	Punct,
}

impl JavaToken {
	/// Whether the token carries meaning for declaration scanning.
	pub(crate) fn is_significant(self) -> bool {
		!matches!(
			self,
			Self::Whitespace | Self::Newline | Self::LineComment | Self::BlockComment
		)
	}
}

/// A token together with its source text and byte span.
#[derive(Debug, Clone)]
pub(crate) struct Lexeme<'a> {
	pub token: JavaToken,
	pub text: &'a str,
	pub span: Range<usize>,
}

/// Tokenize `source` into lexemes whose texts concatenate back to `source`.
pub(crate) fn lex(source: &str) -> Vec<Lexeme<'_>> {
	JavaToken::lexer(source)
		.spanned()
		.map(|(result, span)| {
			Lexeme {
				token: result.unwrap_or(JavaToken::Punct),
				text: &source[span.clone()],
				span,
			}
		})
		.collect()
}

/// Consume everything up to and including the closing `*/`. An unterminated
/// comment runs to the end of the input.
fn block_comment(lex: &mut Lexer<JavaToken>) -> bool {
	let rest = lex.remainder();
	let len = rest.find("*/").map_or(rest.len(), |index| index + 2);
	lex.bump(len);
	true
}

/// Consume a string literal or a `"""` text block after its opening quote.
fn string_literal(lex: &mut Lexer<JavaToken>) -> bool {
	let rest = lex.remainder();

	if let Some(body) = rest.strip_prefix("\"\"") {
		let len = find_text_block_end(body).map_or(body.len(), |index| index + 3);
		lex.bump(2 + len);
		return true;
	}

	lex.bump(quoted_len(rest, '"'));
	true
}

/// Consume a character literal after its opening quote.
fn char_literal(lex: &mut Lexer<JavaToken>) -> bool {
	let rest = lex.remainder();
	lex.bump(quoted_len(rest, '\''));
	true
}

/// Length of a single-line quoted literal body including its closing quote.
/// Unterminated literals stop before the end of the line.
fn quoted_len(rest: &str, quote: char) -> usize {
	let mut escaped = false;

	for (index, ch) in rest.char_indices() {
		if ch == '\n' {
			return index;
		}

		if escaped {
			escaped = false;
		} else if ch == '\\' {
			escaped = true;
		} else if ch == quote {
			return index + ch.len_utf8();
		}
	}

	rest.len()
}

/// Byte offset of the unescaped `"""` closing a text block body.
fn find_text_block_end(body: &str) -> Option<usize> {
	let mut escaped = false;

	for (index, ch) in body.char_indices() {
		if escaped {
			escaped = false;
			continue;
		}

		if ch == '\\' {
			escaped = true;
		} else if body[index..].starts_with("\"\"\"") {
			return Some(index);
		}
	}

	None
}
