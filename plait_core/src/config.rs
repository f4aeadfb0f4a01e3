use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

use crate::DataContext;
use crate::PlaitError;
use crate::PlaitResult;
use crate::TagLibraryMap;
use crate::data::load_data_file;
use crate::data::load_data_file_as;
use crate::data::toml_to_json;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["plait.toml", ".plait.toml", ".config/plait.toml"];

/// Default directory, relative to the project root, for compiled templates.
pub const DEFAULT_RUNTIME_DIR: &str = "_runtime";

/// Data source entry for a `[data]` namespace.
///
/// ```toml
/// [data]
/// site = "site.json"
/// release = { path = "release-info", format = "yaml" }
/// ```
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum DataSource {
	Path(PathBuf),
	Typed(TypedDataSource),
}

impl DataSource {
	pub fn path(&self) -> &Path {
		match self {
			Self::Path(path) => path.as_path(),
			Self::Typed(typed) => typed.path.as_path(),
		}
	}

	/// The explicit format override, if any.
	pub fn format(&self) -> Option<&str> {
		match self {
			Self::Path(_) => None,
			Self::Typed(typed) => Some(typed.format.as_str()),
		}
	}
}

/// Typed data source configuration for `[data]` entries.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct TypedDataSource {
	pub path: PathBuf,
	pub format: String,
}

/// Configuration loaded from a `plait.toml` file.
///
/// ```toml
/// runtime_dir = "_runtime"
/// debug = false
///
/// [taglibs]
/// ui = "acme.ui"
///
/// [data]
/// site = "site.json"
///
/// [params]
/// brand = "Acme"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct PlaitConfig {
	/// Directory for compiled templates, relative to the project root.
	#[serde(default)]
	pub runtime_dir: Option<PathBuf>,
	/// Recompose every document instead of reading the compiled-template
	/// cache.
	#[serde(default)]
	pub debug: bool,
	/// Pre-registered tag library prefixes, merged over the built-in `core`
	/// prefix.
	#[serde(default)]
	pub taglibs: BTreeMap<String, String>,
	/// Map of namespace name to data source, merged into the data context.
	#[serde(default)]
	pub data: HashMap<String, DataSource>,
	/// Global tag parameters visible to every attribute placeholder.
	#[serde(default)]
	pub params: toml::Table,
}

impl PlaitConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> PlaitResult<Option<PlaitConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		tracing::debug!(path = %config_path.display(), "loading config");
		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;

		Ok(Some(config))
	}

	pub fn parse(content: &str) -> PlaitResult<PlaitConfig> {
		toml::from_str(content).map_err(|e| PlaitError::ConfigParse(e.to_string()))
	}

	/// The compiled-template directory, resolved against `root`.
	pub fn runtime_dir(&self, root: &Path) -> PathBuf {
		root.join(
			self.runtime_dir
				.as_deref()
				.unwrap_or_else(|| Path::new(DEFAULT_RUNTIME_DIR)),
		)
	}

	/// The built-in prefix plus every configured prefix.
	pub fn tag_library_map(&self) -> TagLibraryMap {
		let mut taglibs = TagLibraryMap::with_builtins();
		for (prefix, namespace) in &self.taglibs {
			taglibs.declare(prefix.trim(), namespace.trim());
		}
		taglibs
	}

	/// The `[params]` table as JSON.
	pub fn params(&self) -> PlaitResult<Map<String, Value>> {
		match toml_to_json(toml::Value::Table(self.params.clone()), "plait.toml")? {
			Value::Object(map) => Ok(map),
			_ => Ok(Map::new()),
		}
	}

	/// Read each data file and key its parsed value by namespace.
	pub fn load_data(&self, root: &Path) -> PlaitResult<DataContext> {
		let mut namespaces: Vec<_> = self.data.iter().collect();
		namespaces.sort_by(|(a, _), (b, _)| a.cmp(b));

		let mut context = DataContext::new();
		for (namespace, source) in namespaces {
			let path = root.join(source.path());
			let value = match source.format() {
				Some(format) => load_data_file_as(&path, format)?,
				None => load_data_file(&path)?,
			};
			context.insert(namespace.clone(), value);
		}

		Ok(context)
	}
}
