//! Locates well-nested tag spans in normalized text.
//!
//! After normalization every custom tag shares a single marker element,
//! `<plait-tag _tag="prefix:name" …>…</plait-tag>`. The tag identity lives in
//! the `_tag` attribute, so finding the end tag that closes a given start tag
//! is a matter of balancing a flat stream of identical open and close
//! markers.

use std::ops::Range;

use crate::markup::parse_attributes;

/// Element name shared by every normalized tag.
pub const TAG_MARKER: &str = "plait-tag";
/// Opening form of the marker. The trailing space is significant: normalized
/// start tags always carry at least the `_tag` attribute.
pub const MARKER_OPEN: &str = "<plait-tag ";
/// Closing form of the marker.
pub const MARKER_CLOSE: &str = "</plait-tag>";

/// A matched outer span of normalized tag markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan<'a> {
	start: usize,
	outer: &'a str,
}

impl<'a> TagSpan<'a> {
	/// Byte range of the span within the searched text.
	pub fn range(&self) -> Range<usize> {
		self.start..self.start + self.outer.len()
	}

	/// The full span text, start marker through end marker.
	pub fn outer(&self) -> &'a str {
		self.outer
	}

	/// Length of the start tag, `<plait-tag` through its first `>`.
	fn start_tag_len(&self) -> usize {
		self.outer.find('>').map_or(self.outer.len(), |index| index + 1)
	}

	/// The ordered attributes of the start tag, `_tag` included.
	pub fn attributes(&self) -> Vec<(String, String)> {
		let end = self.start_tag_len().saturating_sub(1);
		parse_attributes(&self.outer[TAG_MARKER.len() + 1..end.max(TAG_MARKER.len() + 1)])
	}

	/// Raw content between the start tag and the matching end marker.
	pub fn inner(&self) -> &'a str {
		let begin = self.start_tag_len();
		let end = self.outer.len() - MARKER_CLOSE.len();
		if begin > end { "" } else { &self.outer[begin..end] }
	}
}

/// Find the first outermost tag span in `text`.
///
/// Starting from the first open marker and the first close marker, every
/// open marker found before the candidate close pushes the candidate one
/// close marker further. The candidate that has no unresolved open marker in
/// front of it is the matching end. Malformed input (unbalanced markers)
/// yields `None` or a wrong span.
pub fn find_span(text: &str) -> Option<TagSpan<'_>> {
	let start = text.find(MARKER_OPEN)?;
	let mut end = text.find(MARKER_CLOSE)?;

	if end <= start {
		return None;
	}

	let mut cursor = start;
	loop {
		let next_open = text[cursor + 1..]
			.find(MARKER_OPEN)
			.map(|index| index + cursor + 1);

		match next_open {
			Some(next) if next < end => {
				cursor = next;
				end = text[end + 1..]
					.find(MARKER_CLOSE)
					.map(|index| index + end + 1)?;
			}
			_ => break,
		}
	}

	Some(TagSpan {
		start,
		outer: &text[start..end + MARKER_CLOSE.len()],
	})
}

/// Byte ranges of every top-level span in `text`, left to right, without
/// expanding anything.
pub fn top_level_spans(text: &str) -> Vec<Range<usize>> {
	let mut ranges = Vec::new();
	let mut offset = 0;

	while let Some(span) = find_span(&text[offset..]) {
		let range = span.range();
		ranges.push(offset + range.start..offset + range.end);
		offset += range.end;
	}

	ranges
}
