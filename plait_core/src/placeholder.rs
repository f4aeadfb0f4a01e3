use std::ops::Range;

use crate::Fingerprint;

/// A namespaced variable placeholder, `${<fingerprint>:<key>}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Placeholder<'a> {
	pub range: Range<usize>,
	/// The full placeholder text, used for literal replacement.
	pub holder: &'a str,
	/// The dotted expression between the namespace and `}`.
	pub key: &'a str,
}

/// Every well-formed placeholder of the `fingerprint` namespace, left to
/// right. The key runs up to the first `}` and must be non-empty without
/// whitespace; anything else is not a placeholder.
pub(crate) fn placeholders<'a>(text: &'a str, fingerprint: &Fingerprint) -> Vec<Placeholder<'a>> {
	let open = fingerprint.placeholder_open();
	let mut found = Vec::new();
	let mut from = 0;

	while let Some(index) = text[from..].find(&open) {
		let start = from + index;
		let key_start = start + open.len();
		from = start + 1;

		let Some(length) = text[key_start..].find('}') else {
			break;
		};

		let key = &text[key_start..key_start + length];
		if key.is_empty() || key.chars().any(char::is_whitespace) {
			continue;
		}

		let end = key_start + length + 1;
		found.push(Placeholder {
			range: start..end,
			holder: &text[start..end],
			key,
		});
		from = end;
	}

	found
}

/// Remove every placeholder of the `fingerprint` namespace, whatever its
/// key looks like.
pub(crate) fn strip_placeholders(text: &str, fingerprint: &Fingerprint) -> String {
	let open = fingerprint.placeholder_open();
	let mut result = String::with_capacity(text.len());
	let mut rest = text;

	while let Some(start) = rest.find(&open) {
		let Some(length) = rest[start + open.len()..].find('}') else {
			break;
		};

		result.push_str(&rest[..start]);
		rest = &rest[start + open.len() + length + 1..];
	}

	result.push_str(rest);
	result
}

/// Rewrite bare `${ expr }` placeholders into the `${<fingerprint>:expr}`
/// namespace. `\${` escapes a literal `${`, which survives as `${`.
pub(crate) fn namespace_variables(text: &str, fingerprint: &Fingerprint) -> String {
	let sentinel = format!("\u{1a}plait-escape-{fingerprint}\u{1a}");
	let escaped = text.replace("\\${", &sentinel);
	let mut result = String::with_capacity(escaped.len() + 64);
	let mut rest = escaped.as_str();

	while let Some(start) = rest.find("${") {
		result.push_str(&rest[..start]);
		let after_open = &rest[start + 2..];

		match bare_expression(after_open) {
			Some((expression, consumed)) => {
				result.push_str("${");
				result.push_str(fingerprint.as_str());
				result.push(':');
				result.push_str(expression);
				result.push('}');
				rest = &after_open[consumed..];
			}
			None => {
				result.push_str("${");
				rest = after_open;
			}
		}
	}

	result.push_str(rest);
	result.replace(&sentinel, "${")
}

/// Match `\s* expr \s* }` at the start of `source`, returning the
/// expression and the number of bytes consumed including the `}`.
fn bare_expression(source: &str) -> Option<(&str, usize)> {
	let leading = source.len() - source.trim_start().len();
	let body = &source[leading..];
	let length = body
		.find(|c: char| c == '}' || c.is_whitespace())
		.unwrap_or(body.len());

	if length == 0 {
		return None;
	}

	let expression = &body[..length];
	let tail = &body[length..];
	let trailing = tail.len() - tail.trim_start().len();

	if !tail[trailing..].starts_with('}') {
		return None;
	}

	Some((expression, leading + length + trailing + 1))
}
