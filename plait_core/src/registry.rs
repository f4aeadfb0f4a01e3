use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use derive_more::Deref;
use serde::Deserialize;
use serde::Serialize;

use crate::PlaitError;
use crate::PlaitResult;
use crate::Tag;
use crate::tags;

/// Namespace of the tags that ship with the engine.
pub const BUILTIN_NAMESPACE: &str = "plait.core";
/// Prefix the built-in namespace is pre-registered under.
pub const BUILTIN_PREFIX: &str = "core";

/// Mapping from a document's tag prefix to a tag library namespace.
///
/// Declarations are first-come: once a prefix is mapped, later declarations
/// for the same prefix are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref)]
#[serde(transparent)]
pub struct TagLibraryMap(BTreeMap<String, String>);

impl TagLibraryMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// A map with the built-in library under [`BUILTIN_PREFIX`].
	pub fn with_builtins() -> Self {
		let mut map = Self::new();
		map.declare(BUILTIN_PREFIX, BUILTIN_NAMESPACE);
		map
	}

	/// Map `prefix` to `namespace` unless the prefix is already declared.
	/// Returns whether the declaration was recorded.
	pub fn declare(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> bool {
		let prefix = prefix.into();
		if self.0.contains_key(&prefix) {
			return false;
		}
		self.0.insert(prefix, namespace.into());
		true
	}

	pub fn namespace(&self, prefix: &str) -> Option<&str> {
		self.0.get(prefix).map(String::as_str)
	}

	pub fn prefixes(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagLibraryMap {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		let mut map = Self::new();
		for (prefix, namespace) in iter {
			map.declare(prefix, namespace);
		}
		map
	}
}

/// Constructs a fresh tag instance for one span.
pub type TagFactory = Arc<dyn Fn() -> Box<dyn Tag> + Send + Sync>;

/// A named set of tag factories.
#[derive(Clone)]
pub struct TagLibrary {
	namespace: String,
	factories: BTreeMap<String, TagFactory>,
}

impl TagLibrary {
	pub fn new(namespace: impl Into<String>) -> Self {
		Self {
			namespace: namespace.into(),
			factories: BTreeMap::new(),
		}
	}

	/// The library of built-in tags: `if` (also `ifElse`) and `link`.
	pub fn builtins() -> Self {
		Self::new(BUILTIN_NAMESPACE)
			.with_tag("if", || Box::new(tags::IfElse::default()))
			.with_tag("ifElse", || Box::new(tags::IfElse::default()))
			.with_tag("link", || Box::new(tags::Link))
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	#[must_use]
	pub fn with_tag(
		mut self,
		name: impl Into<String>,
		factory: impl Fn() -> Box<dyn Tag> + Send + Sync + 'static,
	) -> Self {
		self.register(name, factory);
		self
	}

	pub fn register(
		&mut self,
		name: impl Into<String>,
		factory: impl Fn() -> Box<dyn Tag> + Send + Sync + 'static,
	) {
		self.factories.insert(name.into(), Arc::new(factory));
	}

	/// Find the factory for `name`. An exact match wins; otherwise the first
	/// letter is compared case-insensitively (`Link` finds `link`).
	fn factory(&self, name: &str) -> Option<&TagFactory> {
		if let Some(factory) = self.factories.get(name) {
			return Some(factory);
		}

		let mut chars = name.chars();
		let first = chars.next()?;
		let rest = chars.as_str();
		self.factories.iter().find_map(|(candidate, factory)| {
			let mut candidate_chars = candidate.chars();
			let candidate_first = candidate_chars.next()?;
			(candidate_first.eq_ignore_ascii_case(&first) && candidate_chars.as_str() == rest)
				.then_some(factory)
		})
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.factories.keys().map(String::as_str)
	}
}

impl fmt::Debug for TagLibrary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TagLibrary")
			.field("namespace", &self.namespace)
			.field("tags", &self.factories.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Resolves `prefix:name` tag addresses to tag instances.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
	libraries: HashMap<String, TagLibrary>,
}

impl TagRegistry {
	/// An empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// A registry holding the built-in library.
	pub fn with_builtins() -> Self {
		let mut registry = Self::new();
		registry.register_library(TagLibrary::builtins());
		registry
	}

	/// Add a library. A library with the same namespace is merged: its tags
	/// replace existing tags of the same name.
	pub fn register_library(&mut self, library: TagLibrary) {
		match self.libraries.get_mut(library.namespace()) {
			Some(existing) => existing.factories.extend(library.factories),
			None => {
				self.libraries.insert(library.namespace.clone(), library);
			}
		}
	}

	pub fn library(&self, namespace: &str) -> Option<&TagLibrary> {
		self.libraries.get(namespace)
	}

	/// Create a tag instance for a `prefix:name` address.
	pub fn instantiate(&self, taglibs: &TagLibraryMap, tag: &str) -> PlaitResult<Box<dyn Tag>> {
		let Some((prefix, name)) = tag.split_once(':') else {
			return Err(PlaitError::InvalidTagName(tag.to_string()));
		};

		if prefix.is_empty() || name.is_empty() {
			return Err(PlaitError::InvalidTagName(tag.to_string()));
		}

		let namespace = taglibs
			.namespace(prefix)
			.ok_or_else(|| PlaitError::UnknownTagLibrary {
				prefix: prefix.to_string(),
				tag: tag.to_string(),
			})?;

		let factory = self
			.libraries
			.get(namespace)
			.and_then(|library| library.factory(name))
			.ok_or_else(|| PlaitError::UnknownTag {
				tag: tag.to_string(),
				namespace: namespace.to_string(),
			})?;

		Ok(factory())
	}
}
