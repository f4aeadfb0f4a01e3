use derive_more::Deref;
use derive_more::DerefMut;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// The nested value graph variables are resolved against.
///
/// A data context is read-only from the engine's perspective. Any
/// `Serialize` type can be turned into one: its serialized view is the set
/// of fields and computed accessors that templates may reach with dotted
/// paths.
#[derive(Debug, Clone, Default, PartialEq, Deref, DerefMut)]
pub struct DataContext(Map<String, Value>);

impl DataContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a context from a serializable value. Values that do not
	/// serialize to an object produce an empty context.
	pub fn from_serialize(value: &impl Serialize) -> serde_json::Result<Self> {
		Ok(Self::from(serde_json::to_value(value)?))
	}

	/// Insert a top-level entry, returning `self` for chaining.
	#[must_use]
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.0.insert(key.into(), value.into());
		self
	}

	/// Merge another context into this one. Entries from `other` replace
	/// existing top-level entries with the same key.
	pub fn merge(&mut self, other: DataContext) {
		self.0.extend(other.0);
	}

	/// Resolve a dotted path (`user.address.city`) against the context.
	pub fn resolve_path(&self, path: &str) -> Option<&Value> {
		let mut segments = path.split('.');
		let first = segments.next()?;
		let value = self.0.get(first)?;
		descend(value, segments)
	}

	pub fn into_inner(self) -> Map<String, Value> {
		self.0
	}
}

impl From<Map<String, Value>> for DataContext {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

impl From<Value> for DataContext {
	fn from(value: Value) -> Self {
		match value {
			Value::Object(map) => Self(map),
			_ => Self::default(),
		}
	}
}

/// Values produced by tags while rendering, visible to the attributes of
/// later siblings and descendants within the same top-level tag span.
#[derive(Debug, Clone, Default, PartialEq, Deref, DerefMut)]
pub struct OutputParams(Map<String, Value>);

impl OutputParams {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn lookup(&self, key: &str) -> Option<&Value> {
		lookup_param(&self.0, key)
	}
}

/// Look up a tag parameter. An exact key match wins, so flat keys that
/// contain dots (`"page.title"`) are reachable; otherwise the key is treated
/// as a dotted path.
pub fn lookup_param<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
	if let Some(value) = params.get(key) {
		return Some(value);
	}

	if !key.contains('.') {
		return None;
	}

	let mut segments = key.split('.');
	let first = segments.next()?;
	descend(params.get(first)?, segments)
}

/// Walk the remaining path segments. Objects are indexed by key and arrays
/// by numeric position; anything else ends the walk with no value.
fn descend<'a, 'b>(
	mut value: &'a Value,
	segments: impl Iterator<Item = &'b str>,
) -> Option<&'a Value> {
	for segment in segments {
		value = match value {
			Value::Object(map) => map.get(segment)?,
			Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
			_ => return None,
		};
	}

	Some(value)
}

/// Whether a value is object- or collection-like.
pub fn is_composite(value: &Value) -> bool {
	matches!(value, Value::Object(_) | Value::Array(_))
}

/// Render a scalar value as text. Composite values have no inline form and
/// return `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
	match value {
		Value::Null => Some(String::new()),
		Value::Bool(flag) => Some(flag.to_string()),
		Value::Number(number) => Some(number.to_string()),
		Value::String(text) => Some(text.clone()),
		Value::Array(_) | Value::Object(_) => None,
	}
}
