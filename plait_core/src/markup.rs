use std::ops::Range;

use logos::Logos;

/// Raw tokens of a start tag's attribute list (`name="value" flag other='x'`).
#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum AttributeToken {
	#[regex(r"[A-Za-z_:][A-Za-z0-9_:.\-]*", priority = 4)]
	Name,
	#[token("=")]
	Equals,
	#[regex(r#""[^"]*""#)]
	DoubleQuoted,
	#[regex(r"'[^']*'")]
	SingleQuoted,
	#[regex(r#"[^\s"'=<>`]+"#, priority = 2)]
	Unquoted,
}

/// Parse the attribute list of a start tag into ordered `(name, value)` pairs.
///
/// `source` is everything between the element name and the closing `>`.
/// Attributes without a value get an empty string. Stray characters such as
/// the `/` of a self-closing tag are skipped. A repeated name keeps the
/// first value's position and the last value.
pub(crate) fn parse_attributes(source: &str) -> Vec<(String, String)> {
	let tokens: Vec<_> = AttributeToken::lexer(source).spanned().collect();
	let mut attributes: Vec<(String, String)> = Vec::new();
	let mut cursor = 0;

	while cursor < tokens.len() {
		let (token, span) = &tokens[cursor];
		cursor += 1;

		let Ok(AttributeToken::Name) = token else {
			continue;
		};

		let name = source[span.clone()].to_string();
		let mut value = String::new();

		if matches!(tokens.get(cursor), Some((Ok(AttributeToken::Equals), _))) {
			if let Some((Ok(kind), value_span)) = tokens.get(cursor + 1) {
				let raw = &source[value_span.clone()];
				value = match kind {
					AttributeToken::DoubleQuoted | AttributeToken::SingleQuoted => {
						raw[1..raw.len() - 1].to_string()
					}
					_ => raw.to_string(),
				};
				cursor += 2;
			} else {
				cursor += 1;
			}
		}

		if let Some(existing) = attributes.iter_mut().find(|(key, _)| *key == name) {
			existing.1 = value;
		} else {
			attributes.push((name, value));
		}
	}

	attributes
}

/// Look up an attribute by name in a parsed attribute list.
pub(crate) fn attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
	attributes
		.iter()
		.find(|(key, _)| key.eq_ignore_ascii_case(name))
		.map(|(_, value)| value.as_str())
}

/// ASCII case-insensitive substring search starting at byte offset `from`.
pub(crate) fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
	let haystack = haystack.as_bytes();
	let needle = needle.as_bytes();

	if needle.is_empty() || from > haystack.len() {
		return None;
	}

	haystack[from..]
		.windows(needle.len())
		.position(|window| window.eq_ignore_ascii_case(needle))
		.map(|index| index + from)
}

/// A start tag located in raw document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StartTag<'a> {
	/// Byte range of the whole start tag, `<` through `>`.
	pub range: Range<usize>,
	/// The attribute list between the element name and the closing `>`.
	pub attributes_source: &'a str,
	/// Whether the tag ends with `/>`.
	pub self_closing: bool,
}

impl StartTag<'_> {
	pub fn attributes(&self) -> Vec<(String, String)> {
		parse_attributes(self.attributes_source)
	}
}

/// Find the next `<name` start tag at or after `from`. The element name is
/// matched case-insensitively and must be followed by whitespace, `/` or
/// `>`. Returns `None` when no complete start tag remains.
pub(crate) fn find_start_tag<'a>(text: &'a str, name: &str, from: usize) -> Option<StartTag<'a>> {
	let needle = format!("<{name}");
	let mut search = from;

	loop {
		let start = find_ci(text, &needle, search)?;
		let after_name = start + needle.len();
		let boundary = text[after_name..].chars().next()?;

		if !(boundary.is_whitespace() || boundary == '/' || boundary == '>') {
			search = after_name;
			continue;
		}

		let close = text[after_name..].find('>')? + after_name;
		let inner = &text[after_name..close];
		let self_closing = inner.trim_end().ends_with('/');
		let attributes_source = if self_closing {
			&inner[..inner.trim_end().len() - 1]
		} else {
			inner
		};

		return Some(StartTag {
			range: start..close + 1,
			attributes_source,
			self_closing,
		});
	}
}

/// Every `<name` start tag in `text`, in document order.
pub(crate) fn start_tags<'a>(text: &'a str, name: &str) -> Vec<StartTag<'a>> {
	let mut tags = Vec::new();
	let mut from = 0;

	while let Some(tag) = find_start_tag(text, name, from) {
		from = tag.range.end;
		tags.push(tag);
	}

	tags
}

/// An element with a body: `<name ...>inner</name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element<'a> {
	pub start: StartTag<'a>,
	pub inner: &'a str,
}

/// Every non-self-closing `<name>…</name>` element, matching each start tag
/// with the nearest following end tag. Start tags with no end tag are
/// skipped.
pub(crate) fn elements<'a>(text: &'a str, name: &str) -> Vec<Element<'a>> {
	let end_tag = format!("</{name}>");
	let mut found = Vec::new();
	let mut from = 0;

	while let Some(start) = find_start_tag(text, name, from) {
		from = start.range.end;

		if start.self_closing {
			continue;
		}

		let Some(end) = find_ci(text, &end_tag, start.range.end) else {
			continue;
		};

		let inner = &text[start.range.end..end];
		from = end + end_tag.len();
		found.push(Element { start, inner });
	}

	found
}

/// Strip a leading UTF-8 byte order mark.
pub fn strip_bom(content: &str) -> &str {
	content.strip_prefix('\u{feff}').unwrap_or(content)
}
