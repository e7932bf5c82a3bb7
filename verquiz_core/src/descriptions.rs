use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_mdast;
use regex::Regex;
use serde::Serialize;

use crate::DescriptionRule;
use crate::QuizError;
use crate::QuizResult;

/// Required section headers, in document order.
pub const SECTION_HEADERS: [&str; 5] = ["Summary", "Details", "Example", "Historical", "Links"];

/// At least one of these must appear in the Example code block.
pub const COMMENT_MARKERS: [&str; 5] = ["//", "/*", "#", "--", "<!--"];

/// `[label](target)` with a non-blank label and target.
static LABELED_LINK: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\[\s*[^\]\s][^\]]*\]\(\s*[^)\s]+[^)]*\)")
		.unwrap_or_else(|e| panic!("invalid link pattern: {e}"))
});

/// A validated markdown description of one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureDescription {
	pub id: String,
	pub markdown: String,
}

/// A section header located in the document.
struct Section {
	name: &'static str,
	/// Index of the heading among the root's children.
	child: usize,
	depth: u8,
	/// Byte offset just after the heading.
	end_offset: usize,
	/// 1-indexed line of the heading's last line.
	end_line: usize,
}

/// Validate the structure of the description for `feature`.
///
/// The document needs the `Summary`, `Details`, `Example`, `Historical` and
/// `Links` headers in that order at one heading level. The Example section
/// holds exactly one tagged code block containing a comment, and every
/// non-blank Links line is a `- ` bullet with a `[label](url)` link.
pub fn validate_description(feature: &str, markdown: &str) -> QuizResult<()> {
	let tree =
		to_mdast(markdown, &ParseOptions::gfm()).map_err(|e| QuizError::Markdown(e.to_string()))?;

	check_structure(&tree, markdown).map_err(|rule| {
		QuizError::InvalidDescription {
			feature: feature.to_string(),
			rule,
		}
	})
}

fn check_structure(tree: &Node, markdown: &str) -> Result<(), DescriptionRule> {
	let children = tree.children().map(Vec::as_slice).unwrap_or_default();
	let sections = collect_sections(children)?;

	let example = &sections[2];
	let example_end = section_end(children, example);
	check_example(&children[example.child + 1..example_end])?;

	let links = &sections[4];
	let links_end = children
		.get(section_end(children, links))
		.and_then(Node::position)
		.map_or(markdown.len(), |position| position.start.offset);
	check_links(&markdown[links.end_offset..links_end], links.end_line)
}

/// Index of the first heading after `section` at its level or shallower, or
/// the number of children when the section runs to the end.
fn section_end(children: &[Node], section: &Section) -> usize {
	children[section.child + 1..]
		.iter()
		.position(|node| matches!(node, Node::Heading(heading) if heading.depth <= section.depth))
		.map_or(children.len(), |offset| section.child + 1 + offset)
}

/// Locate the five section headers and verify their order and level. Other
/// headings are allowed anywhere and end the section before them.
fn collect_sections(children: &[Node]) -> Result<Vec<Section>, DescriptionRule> {
	let headings: Vec<(usize, u8, String, Option<&markdown::unist::Position>)> = children
		.iter()
		.enumerate()
		.filter_map(|(index, node)| {
			match node {
				Node::Heading(heading) => {
					Some((index, heading.depth, plain_text(node), node.position()))
				}
				_ => None,
			}
		})
		.collect();

	let Some(level) = headings
		.iter()
		.find(|(_, _, text, _)| section_name(text).is_some())
		.map(|(_, depth, ..)| *depth)
	else {
		return Err(DescriptionRule::MissingHeader(SECTION_HEADERS[0]));
	};

	let mut sections: Vec<Section> = Vec::new();

	for (child, depth, text, position) in headings {
		let Some(name) = section_name(&text) else {
			continue;
		};

		if sections.iter().any(|section| section.name == name) {
			return Err(DescriptionRule::DuplicateHeader(name));
		}

		if depth != level {
			return Err(DescriptionRule::MixedHeadingLevels {
				section: name,
				expected: level,
				got: depth,
			});
		}

		let (end_offset, end_line) = position.map_or((0, 1), |position| {
			(position.end.offset, position.end.line)
		});

		sections.push(Section {
			name,
			child,
			depth,
			end_offset,
			end_line,
		});
	}

	for (index, expected) in SECTION_HEADERS.into_iter().enumerate() {
		let Some(found) = sections.get(index) else {
			return Err(DescriptionRule::MissingHeader(expected));
		};

		if found.name != expected {
			if sections.iter().any(|section| section.name == expected) {
				return Err(DescriptionRule::HeaderOutOfOrder {
					found: found.name,
					expected,
				});
			}
			return Err(DescriptionRule::MissingHeader(expected));
		}
	}

	debug_assert!(sections.iter().all(|section| section.depth == level));
	Ok(sections)
}

fn section_name(text: &str) -> Option<&'static str> {
	let text = text.trim();
	SECTION_HEADERS.iter().copied().find(|name| *name == text)
}

/// The Example section holds exactly one tagged code block with a comment.
fn check_example(nodes: &[Node]) -> Result<(), DescriptionRule> {
	let mut blocks = Vec::new();
	for node in nodes {
		collect_code_blocks(node, &mut blocks);
	}

	let [block] = blocks.as_slice() else {
		return Err(DescriptionRule::ExampleBlockCount(blocks.len()));
	};

	let &(lang, value) = block;
	if lang.is_none_or(|lang| lang.trim().is_empty()) {
		return Err(DescriptionRule::ExampleMissingLanguage);
	}

	if !COMMENT_MARKERS.iter().any(|marker| value.contains(marker)) {
		return Err(DescriptionRule::ExampleMissingComment);
	}

	Ok(())
}

fn collect_code_blocks<'a>(node: &'a Node, blocks: &mut Vec<(Option<&'a str>, &'a str)>) {
	if let Node::Code(code) = node {
		blocks.push((code.lang.as_deref(), code.value.as_str()));
		return;
	}

	if let Some(children) = node.children() {
		for child in children {
			collect_code_blocks(child, blocks);
		}
	}
}

/// Every non-blank line after the Links header is a bullet with a labeled
/// link. `first_line` is the line number of the header itself.
fn check_links(section: &str, first_line: usize) -> Result<(), DescriptionRule> {
	let mut entries = 0;

	// The first piece is the remainder of the header line.
	for (offset, line) in section.split('\n').enumerate().skip(1) {
		let trimmed = line.trim();
		if trimmed.is_empty() {
			continue;
		}

		let line = first_line + offset;
		if !trimmed.starts_with("- ") {
			return Err(DescriptionRule::LinkNotBullet { line });
		}

		if !LABELED_LINK.is_match(trimmed) {
			return Err(DescriptionRule::LinkMissingLabel { line });
		}

		entries += 1;
	}

	if entries == 0 {
		return Err(DescriptionRule::LinksEmpty);
	}

	Ok(())
}

/// Concatenated text content of a node.
fn plain_text(node: &Node) -> String {
	match node {
		Node::Text(text) => text.value.clone(),
		Node::InlineCode(code) => code.value.clone(),
		_ => {
			node.children()
				.map(|children| children.iter().map(plain_text).collect())
				.unwrap_or_default()
		}
	}
}

/// Description files found in `dir`, keyed by feature identifier (the file
/// stem). A missing directory yields no files.
pub fn collect_description_files(
	dir: &Path,
	extension: &str,
) -> QuizResult<BTreeMap<String, PathBuf>> {
	let mut files = BTreeMap::new();

	if !dir.is_dir() {
		tracing::warn!(dir = %dir.display(), "feature description directory not found");
		return Ok(files);
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();
		if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
			continue;
		}

		if let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) {
			files.insert(id.to_string(), path.clone());
		}
	}

	Ok(files)
}

fn read_description(id: &str, path: &Path) -> QuizResult<FeatureDescription> {
	let markdown = std::fs::read_to_string(path).map_err(|e| {
		QuizError::Read {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})?;
	validate_description(id, &markdown)?;

	Ok(FeatureDescription {
		id: id.to_string(),
		markdown,
	})
}

/// Load and validate every description in `dir`. The first invalid document
/// aborts the load.
pub fn load_descriptions(
	dir: &Path,
	extension: &str,
) -> QuizResult<BTreeMap<String, FeatureDescription>> {
	let files = collect_description_files(dir, extension)?;
	let mut descriptions = BTreeMap::new();

	for (id, path) in &files {
		descriptions.insert(id.clone(), read_description(id, path)?);
	}

	tracing::info!(
		dir = %dir.display(),
		count = descriptions.len(),
		"loaded feature descriptions"
	);
	Ok(descriptions)
}

/// Like [`load_descriptions`] but every identifier in `required` must have a
/// description file. Extra files are loaded too.
pub fn load_descriptions_strict<'a>(
	dir: &Path,
	extension: &str,
	required: impl IntoIterator<Item = &'a str>,
) -> QuizResult<BTreeMap<String, FeatureDescription>> {
	let files = collect_description_files(dir, extension)?;
	let required: BTreeSet<&str> = required.into_iter().collect();

	if let Some(missing) = required.iter().find(|id| !files.contains_key(**id)) {
		return Err(QuizError::MissingDescription {
			feature: (*missing).to_string(),
			path: dir
				.join(format!("{missing}.{extension}"))
				.display()
				.to_string(),
		});
	}

	load_descriptions(dir, extension)
}

/// Validate every description in `dir`, collecting all failures instead of
/// stopping at the first.
pub fn validate_descriptions(dir: &Path, extension: &str) -> QuizResult<Vec<QuizError>> {
	let files = collect_description_files(dir, extension)?;

	Ok(files
		.iter()
		.filter_map(|(id, path)| read_description(id, path).err())
		.collect())
}
