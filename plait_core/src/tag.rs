use serde_json::Map;
use serde_json::Value;

use crate::Fingerprint;
use crate::OutputParams;
use crate::PlaitResult;
use crate::context::lookup_param;

/// The contract every tag implementation satisfies.
///
/// A fresh instance is created for every tag span. The expander first offers
/// each attribute to [`Tag::set_attribute`]; attributes the tag does not claim
/// are collected into the [`TagBody`] attribute bag. [`Tag::render`] then runs
/// once, before any tag nested in the raw inner content is expanded, and its
/// output is what the expander scans for further tags. Content a tag leaves
/// out of its output is never expanded.
pub trait Tag {
	/// Bind `value` to a typed setter for `name`. Returns the value back when
	/// this tag has no setter for the attribute.
	fn set_attribute(&mut self, _name: &str, value: Value) -> Option<Value> {
		Some(value)
	}

	/// Produce the rendered text for this span. `output` is shared with every
	/// sibling and descendant expanded under the same top-level span.
	fn render(&mut self, body: &TagBody<'_>, output: &mut OutputParams) -> PlaitResult<String>;
}

/// Everything a tag receives about its span besides typed attributes.
#[derive(Debug)]
pub struct TagBody<'a> {
	/// The `prefix:name` the tag was addressed by.
	pub name: &'a str,
	/// Raw inner content, nested tag markup still unexpanded.
	pub inner: &'a str,
	/// Attributes no typed setter claimed, in declaration order.
	pub attributes: Attributes,
	/// Namespace of the variable placeholders in this document.
	pub fingerprint: &'a Fingerprint,
	/// Global tag parameters supplied by the caller.
	pub globals: &'a Map<String, Value>,
}

impl TagBody<'_> {
	/// Look up a parameter the way attribute placeholders are resolved: the
	/// recursive output parameters first, then the global tag parameters.
	pub fn lookup<'s>(&'s self, output: &'s OutputParams, key: &str) -> Option<&'s Value> {
		output
			.lookup(key)
			.or_else(|| lookup_param(self.globals, key))
	}
}

/// Ordered bag of attributes that no typed setter claimed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(String, Value)>);

impl Attributes {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert or replace an attribute, keeping the original position of a
	/// replaced name.
	pub fn insert(&mut self, name: impl Into<String>, value: Value) {
		let name = name.into();
		if let Some(existing) = self.0.iter_mut().find(|(key, _)| *key == name) {
			existing.1 = value;
		} else {
			self.0.push((name, value));
		}
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value)
	}

	pub fn remove(&mut self, name: &str) -> Option<Value> {
		let index = self.0.iter().position(|(key, _)| key == name)?;
		Some(self.0.remove(index).1)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(key, value)| (key.as_str(), value))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
