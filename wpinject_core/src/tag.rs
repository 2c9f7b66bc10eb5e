use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::InjectError;

const TAG_PREFIX: &[u8] = b"<webpack-";
const SRC_ATTRIBUTE: &[u8] = b"src";

/// The action a tag asks for. Parsed from the part of the tag name after
/// `webpack-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
	/// `<webpack-inject src="...">`: embed the trimmed contents of a file.
	Inject,
	/// `<webpack-import src="...">`: emit one import statement per file
	/// matching a pattern.
	Import,
}

impl Verb {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Inject => "inject",
			Self::Import => "import",
		}
	}
}

impl fmt::Display for Verb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Verb {
	type Err = InjectError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"inject" => Ok(Self::Inject),
			"import" => Ok(Self::Import),
			other => Err(InjectError::UnknownVerb(other.to_string())),
		}
	}
}

/// Location of a tag inside the text it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
	/// Byte offset of the opening `<`.
	pub offset: usize,
	/// 1-indexed line.
	pub line: usize,
	/// 1-indexed column, counted in bytes.
	pub column: usize,
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.line, self.column)
	}
}

/// A `<webpack-VERB src="PATH">` occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagMatch {
	/// Whitespace between the start of the line and the tag. Only set when
	/// nothing else precedes the tag on its line.
	pub indent: Option<String>,
	/// The verb exactly as written, e.g. `inject`.
	pub verb: String,
	/// Quote character used around the `src` value.
	pub quote: char,
	/// The `src` argument without quotes.
	pub src: String,
	/// The full matched text, including the indent.
	pub text: String,
	pub position: Position,
}

impl TagMatch {
	/// The tag itself, without the leading indent.
	pub fn tag(&self) -> &str {
		let indent_len = self.indent.as_ref().map_or(0, String::len);
		&self.text[indent_len..]
	}

	pub fn verb(&self) -> Result<Verb, InjectError> {
		self.verb.parse()
	}
}

/// Pre-computed line starts so offsets can be converted to line/column with
/// a binary search.
struct LineTable {
	line_starts: Vec<usize>,
}

impl LineTable {
	fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	fn position(&self, offset: usize) -> Position {
		let line_idx = match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact,
			Err(insert) => insert.saturating_sub(1),
		};

		Position {
			offset,
			line: line_idx + 1,
			column: offset - self.line_starts[line_idx] + 1,
		}
	}
}

pub(crate) fn memstr(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	haystack
		.windows(needle.len())
		.position(|window| window == needle)
}

/// Find every non-overlapping tag in `content`, in order of appearance.
///
/// Anything that starts with `<webpack-` but doesn't complete the
/// `<webpack-VERB src="PATH">` shape is left alone.
pub fn find_tags(content: &str) -> Vec<TagMatch> {
	let bytes = content.as_bytes();
	let line_table = LineTable::new(content);
	let mut tags = Vec::new();
	let mut search_from = 0;

	while search_from < bytes.len() {
		let Some(found) = memstr(&bytes[search_from..], TAG_PREFIX) else {
			break;
		};
		let start = search_from + found;

		let Some(parsed) = parse_tag_at(bytes, start) else {
			search_from = start + 1;
			continue;
		};

		let indent_start = leading_indent_start(bytes, start);
		let indent = (indent_start < start).then(|| content[indent_start..start].to_string());
		let text_start = if indent.is_some() { indent_start } else { start };

		tags.push(TagMatch {
			indent,
			verb: content[parsed.verb.0..parsed.verb.1].to_string(),
			quote: char::from(parsed.quote),
			src: content[parsed.src.0..parsed.src.1].to_string(),
			text: content[text_start..parsed.end].to_string(),
			position: line_table.position(start),
		});

		search_from = parsed.end;
	}

	tags
}

/// Byte ranges of a tag recognised at a given offset.
struct ParsedTag {
	verb: (usize, usize),
	quote: u8,
	src: (usize, usize),
	end: usize,
}

fn parse_tag_at(bytes: &[u8], start: usize) -> Option<ParsedTag> {
	let verb_start = start + TAG_PREFIX.len();
	let verb_end = skip_while(bytes, verb_start, is_verb_byte);
	if verb_end == verb_start {
		return None;
	}

	let attr_start = skip_while(bytes, verb_end, is_space);
	if attr_start == verb_end || !bytes[attr_start..].starts_with(SRC_ATTRIBUTE) {
		return None;
	}

	let equals = skip_while(bytes, attr_start + SRC_ATTRIBUTE.len(), is_space);
	if bytes.get(equals) != Some(&b'=') {
		return None;
	}

	let quote_at = skip_while(bytes, equals + 1, is_space);
	let quote = *bytes.get(quote_at)?;
	if quote != b'"' && quote != b'\'' {
		return None;
	}

	let src_start = quote_at + 1;
	let src_len = bytes[src_start..]
		.iter()
		.position(|&b| b == quote || b == b'\n')?;
	let src_end = src_start + src_len;
	if src_len == 0 || bytes[src_end] != quote {
		return None;
	}

	let mut close = skip_while(bytes, src_end + 1, is_space);
	if bytes.get(close) == Some(&b'/') {
		close += 1;
	}
	if bytes.get(close) != Some(&b'>') {
		return None;
	}

	Some(ParsedTag {
		verb: (verb_start, verb_end),
		quote,
		src: (src_start, src_end),
		end: close + 1,
	})
}

/// Start of the run of spaces and tabs directly before `offset`, provided
/// that run reaches back to the start of the line. Returns `offset` itself
/// when something else precedes the tag.
fn leading_indent_start(bytes: &[u8], offset: usize) -> usize {
	let mut cursor = offset;
	while cursor > 0 && matches!(bytes[cursor - 1], b' ' | b'\t') {
		cursor -= 1;
	}

	if cursor == 0 || bytes[cursor - 1] == b'\n' {
		cursor
	} else {
		offset
	}
}

fn skip_while(bytes: &[u8], from: usize, predicate: fn(u8) -> bool) -> usize {
	let mut cursor = from;
	while cursor < bytes.len() && predicate(bytes[cursor]) {
		cursor += 1;
	}
	cursor
}

fn is_verb_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

fn is_space(byte: u8) -> bool {
	byte.is_ascii_whitespace()
}
