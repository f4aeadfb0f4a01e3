use serde_json::Map;
use serde_json::Value;

use crate::Attributes;
use crate::Fingerprint;
use crate::OutputParams;
use crate::PlaitError;
use crate::PlaitResult;
use crate::TagBody;
use crate::TagLibraryMap;
use crate::TagRegistry;
use crate::context::lookup_param;
use crate::context::scalar_text;
use crate::locator::TagSpan;
use crate::locator::find_span;
use crate::placeholder::placeholders;

/// Attributes the engine reserves for itself; they are never bound to tags.
const RESERVED_ATTRIBUTES: [&str; 2] = ["_tag", "_id"];

/// Expands normalized tag spans into rendered text.
///
/// Expansion is outside-in: a tag renders from its raw inner content first,
/// and only the tags that survive in its output are expanded afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Expander<'a> {
	taglibs: &'a TagLibraryMap,
	registry: &'a TagRegistry,
	globals: &'a Map<String, Value>,
	fingerprint: &'a Fingerprint,
}

impl<'a> Expander<'a> {
	pub fn new(
		taglibs: &'a TagLibraryMap,
		registry: &'a TagRegistry,
		globals: &'a Map<String, Value>,
		fingerprint: &'a Fingerprint,
	) -> Self {
		Self {
			taglibs,
			registry,
			globals,
			fingerprint,
		}
	}

	/// Expand every tag span in `text`. Each top-level span gets its own
	/// output parameters, shared by everything expanded beneath it.
	pub fn expand(&self, text: &str) -> PlaitResult<String> {
		let mut buffer = text.to_string();

		while let Some(span) = find_span(&buffer) {
			let range = span.range();
			let mut output = OutputParams::new();
			let expanded = self.expand_span(span, &mut output)?;
			buffer.replace_range(range, &expanded);
		}

		Ok(buffer)
	}

	/// Render one span, then expand the spans found in the rendered text.
	fn expand_span(&self, span: TagSpan<'_>, output: &mut OutputParams) -> PlaitResult<String> {
		let mut rendered = self.render_span(span, output)?;

		while let Some(child) = find_span(&rendered) {
			let range = child.range();
			let expanded = self.expand_span(child, output)?;
			rendered.replace_range(range, &expanded);
		}

		Ok(rendered)
	}

	fn render_span(&self, span: TagSpan<'_>, output: &mut OutputParams) -> PlaitResult<String> {
		let attributes = span.attributes();
		let name = attributes
			.iter()
			.find(|(key, _)| key == "_tag")
			.map(|(_, value)| value.as_str())
			.ok_or(PlaitError::MissingTagName)?;

		tracing::trace!(tag = name, "expanding tag span");
		let mut tag = self.registry.instantiate(self.taglibs, name)?;
		let mut bag = Attributes::new();

		for (key, raw) in &attributes {
			if RESERVED_ATTRIBUTES.contains(&key.as_str()) {
				continue;
			}

			let value = self.attribute_value(raw, output);
			if let Some(unclaimed) = tag.set_attribute(key, value) {
				bag.insert(key.as_str(), unclaimed);
			}
		}

		let body = TagBody {
			name,
			inner: span.inner(),
			attributes: bag,
			fingerprint: self.fingerprint,
			globals: self.globals,
		};

		tag.render(&body, output)
	}

	/// Resolve an attribute's raw text into the value bound to the tag.
	///
	/// `true` and `false` become booleans. Placeholders are looked up in the
	/// output parameters, then the global tag parameters, and substituted left
	/// to right. A composite value replaces the whole attribute and ends the
	/// substitution; an unresolved placeholder becomes empty text.
	fn attribute_value(&self, raw: &str, output: &OutputParams) -> Value {
		if raw.eq_ignore_ascii_case("true") {
			return Value::Bool(true);
		}

		if raw.eq_ignore_ascii_case("false") {
			return Value::Bool(false);
		}

		let mut value = raw.to_string();
		for placeholder in placeholders(raw, self.fingerprint) {
			let found = output
				.lookup(placeholder.key)
				.or_else(|| lookup_param(self.globals, placeholder.key));

			match found {
				Some(found) => {
					match scalar_text(found) {
						Some(text) => value = value.replace(placeholder.holder, &text),
						None => return found.clone(),
					}
				}
				None => value = value.replace(placeholder.holder, ""),
			}
		}

		Value::String(value)
	}
}
