use crate::Fingerprint;
use crate::TagLibraryMap;
use crate::locator::MARKER_CLOSE;
use crate::locator::MARKER_OPEN;
use crate::placeholder::namespace_variables;

/// Rewrite a composed document into the internal placeholder notation.
///
/// Every tag of a declared prefix becomes the shared marker element with its
/// original `prefix:name` kept in the `_tag` attribute, self-closing tags
/// gain an explicit end marker, and bare `${expr}` variables move into the
/// document's fingerprint namespace.
pub fn normalize(text: &str, taglibs: &TagLibraryMap, fingerprint: &Fingerprint) -> String {
	let mut normalized = text.to_string();

	for prefix in taglibs.prefixes() {
		normalized = normalize_prefix(&normalized, prefix);
	}

	namespace_variables(&normalized, fingerprint)
}

fn normalize_prefix(text: &str, prefix: &str) -> String {
	let open = format!("<{prefix}:");
	let close = format!("</{prefix}:");
	let mut result = String::with_capacity(text.len() + 64);
	let mut rest = text;

	while let Some(index) = rest.find('<') {
		result.push_str(&rest[..index]);
		rest = &rest[index..];

		if let Some(after) = rest.strip_prefix(&close) {
			if let Some(consumed) = end_tag(after) {
				result.push_str(MARKER_CLOSE);
				rest = &after[consumed..];
				continue;
			}
		} else if let Some(after) = rest.strip_prefix(&open) {
			if let Some((rewritten, consumed)) = start_tag(prefix, after) {
				result.push_str(&rewritten);
				rest = &after[consumed..];
				continue;
			}
		}

		result.push('<');
		rest = &rest[1..];
	}

	result.push_str(rest);
	result
}

fn tag_name_len(source: &str) -> usize {
	source
		.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
		.unwrap_or(source.len())
}

/// Match `name\s*>` after `</prefix:`.
fn end_tag(after: &str) -> Option<usize> {
	let name_len = tag_name_len(after);
	if name_len == 0 {
		return None;
	}

	let tail = &after[name_len..];
	let trimmed = tail.trim_start();
	trimmed
		.starts_with('>')
		.then(|| name_len + (tail.len() - trimmed.len()) + 1)
}

/// Rewrite the start tag following `<prefix:`, returning the marker form and
/// the number of bytes consumed.
fn start_tag(prefix: &str, after: &str) -> Option<(String, usize)> {
	let name_len = tag_name_len(after);
	if name_len == 0 {
		return None;
	}

	let name = &after[..name_len];
	let tail = &after[name_len..];
	let boundary = tail.chars().next()?;
	if !(boundary.is_whitespace() || boundary == '/' || boundary == '>') {
		return None;
	}

	let close = tail.find('>')?;
	let attributes = &tail[..close];
	let trimmed = attributes.trim_end();
	let self_closing = trimmed.ends_with('/');

	let mut rewritten = format!("{MARKER_OPEN}_tag=\"{prefix}:{name}\"");
	if self_closing {
		rewritten.push_str(trimmed[..trimmed.len() - 1].trim_end());
		rewritten.push('>');
		rewritten.push_str(MARKER_CLOSE);
	} else {
		rewritten.push_str(attributes);
		rewritten.push('>');
	}

	Some((rewritten, name_len + close + 1))
}
