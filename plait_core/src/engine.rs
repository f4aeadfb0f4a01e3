use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;

use crate::CacheStore;
use crate::CompiledTemplate;
use crate::CompiledTemplateCache;
use crate::DataContext;
use crate::Expander;
use crate::FileCacheStore;
use crate::MemoryCacheStore;
use crate::PlaitConfig;
use crate::PlaitError;
use crate::PlaitResult;
use crate::TagLibrary;
use crate::TagLibraryMap;
use crate::TagRegistry;
use crate::composer::compose;
use crate::resolver::resolve;

/// Renders documents end to end: composition through the compiled-template
/// cache, tag expansion, then variable resolution.
#[derive(Debug, Clone)]
pub struct Engine {
	registry: TagRegistry,
	taglibs: TagLibraryMap,
	cache: CompiledTemplateCache,
	params: Map<String, Value>,
}

impl Default for Engine {
	fn default() -> Self {
		Self::new()
	}
}

impl Engine {
	/// An engine with the built-in tags and an in-memory cache.
	pub fn new() -> Self {
		Self {
			registry: TagRegistry::with_builtins(),
			taglibs: TagLibraryMap::with_builtins(),
			cache: CompiledTemplateCache::new(Arc::new(MemoryCacheStore::new())),
			params: Map::new(),
		}
	}

	/// An engine configured from `plait.toml`, caching compiled templates in
	/// the configured runtime directory under `root`.
	pub fn from_config(root: &Path, config: &PlaitConfig) -> PlaitResult<Self> {
		let store = FileCacheStore::new(config.runtime_dir(root));
		Ok(Self {
			registry: TagRegistry::with_builtins(),
			taglibs: config.tag_library_map(),
			cache: CompiledTemplateCache::new(Arc::new(store)).with_debug(config.debug),
			params: config.params()?,
		})
	}

	#[must_use]
	pub fn with_store(mut self, store: Arc<dyn CacheStore>) -> Self {
		let debug = self.cache.is_debug();
		self.cache = CompiledTemplateCache::new(store).with_debug(debug);
		self
	}

	#[must_use]
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.cache = self.cache.with_debug(debug);
		self
	}

	/// Pre-register a tag library prefix. Prefixes already declared keep their
	/// namespace.
	#[must_use]
	pub fn with_taglib(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
		self.taglibs.declare(prefix, namespace);
		self
	}

	#[must_use]
	pub fn with_library(mut self, library: TagLibrary) -> Self {
		self.registry.register_library(library);
		self
	}

	/// Global tag parameters shared by every render.
	#[must_use]
	pub fn with_params(mut self, params: Map<String, Value>) -> Self {
		self.params = params;
		self
	}

	pub fn registry(&self) -> &TagRegistry {
		&self.registry
	}

	pub fn taglibs(&self) -> &TagLibraryMap {
		&self.taglibs
	}

	pub fn cache(&self) -> &CompiledTemplateCache {
		&self.cache
	}

	/// Render a document file. The data context doubles as the global tag
	/// parameters, on top of the engine's own parameters.
	pub fn render_file(&self, path: &Path, context: &DataContext) -> PlaitResult<String> {
		self.render_file_with_params(path, context, context)
	}

	/// Render a document file with explicit global tag parameters, merged over
	/// the engine's own parameters.
	pub fn render_file_with_params(
		&self,
		path: &Path,
		context: &DataContext,
		params: &Map<String, Value>,
	) -> PlaitResult<String> {
		let (raw, base_dir) = read_source(path)?;
		let compiled = self.cache.load_or_compose(&raw, &base_dir, &self.taglibs)?;
		self.render_compiled(&compiled, context, params)
	}

	/// Render document text. Master and part references resolve relative to
	/// `base_dir`.
	pub fn render_str(
		&self,
		raw: &str,
		base_dir: &Path,
		context: &DataContext,
	) -> PlaitResult<String> {
		let compiled = self.cache.load_or_compose(raw, base_dir, &self.taglibs)?;
		self.render_compiled(&compiled, context, context)
	}

	/// Compose a document file without touching the cache.
	pub fn compose_file(&self, path: &Path) -> PlaitResult<CompiledTemplate> {
		let (raw, base_dir) = read_source(path)?;
		compose(&raw, &base_dir, &self.taglibs)
	}

	/// Expand tags and resolve variables of an already compiled document.
	pub fn render_compiled(
		&self,
		compiled: &CompiledTemplate,
		context: &DataContext,
		params: &Map<String, Value>,
	) -> PlaitResult<String> {
		let mut globals = self.params.clone();
		globals.extend(params.iter().map(|(key, value)| (key.clone(), value.clone())));

		let expander = Expander::new(
			&compiled.taglibs,
			&self.registry,
			&globals,
			&compiled.fingerprint,
		);
		let expanded = expander.expand(&compiled.text)?;

		Ok(resolve(&expanded, context, &compiled.fingerprint))
	}
}

fn read_source(path: &Path) -> PlaitResult<(String, PathBuf)> {
	if !path.is_file() {
		return Err(PlaitError::SourceMissing {
			path: path.display().to_string(),
		});
	}

	let raw = std::fs::read_to_string(path)?;
	let base_dir = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
	Ok((raw, base_dir))
}
