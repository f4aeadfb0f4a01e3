//! Compiled-template cache.
//!
//! A composed document is stored under its raw-content fingerprint as two
//! entries: `<fingerprint>` holds the normalized text and
//! `<fingerprint>.taglibs.json` the tag library map. Entries are never
//! invalidated by changes to a master template or part; only a change to the
//! document itself produces a new fingerprint.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

use crate::Composed;
use crate::Fingerprint;
use crate::PlaitError;
use crate::PlaitResult;
use crate::TagLibraryMap;
use crate::composer::compose;
use crate::markup::strip_bom;

pub(crate) const CACHE_SCHEMA_VERSION: u32 = 1;
const TAGLIBS_SUFFIX: &str = ".taglibs.json";

/// A composed document as held by the cache.
pub type CompiledTemplate = Composed;

/// Byte storage for compiled templates. Writes of the same key are
/// last-write-wins.
pub trait CacheStore: Send + Sync + fmt::Debug {
	fn read(&self, key: &str) -> PlaitResult<Option<Vec<u8>>>;
	fn write(&self, key: &str, bytes: &[u8]) -> PlaitResult<()>;
	/// Remove every entry, returning how many were removed.
	fn clear(&self) -> PlaitResult<usize>;
}

/// One file per key inside a runtime directory.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
	dir: PathBuf,
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl FileCacheStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	fn path(&self, key: &str) -> PathBuf {
		self.dir.join(key)
	}
}

impl CacheStore for FileCacheStore {
	fn read(&self, key: &str) -> PlaitResult<Option<Vec<u8>>> {
		match std::fs::read(self.path(key)) {
			Ok(bytes) => Ok(Some(bytes)),
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(error) => Err(error.into()),
		}
	}

	fn write(&self, key: &str, bytes: &[u8]) -> PlaitResult<()> {
		std::fs::create_dir_all(&self.dir)?;

		let path = self.path(key);
		let temp_path = self.dir.join(format!(
			".{key}.tmp-{}-{}-{}",
			std::process::id(),
			TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
			SystemTime::now()
				.duration_since(UNIX_EPOCH)
				.map_or(0, |duration| duration.as_nanos())
		));

		std::fs::write(&temp_path, bytes)?;
		if let Err(error) = std::fs::rename(&temp_path, &path) {
			std::fs::remove_file(&temp_path).ok();
			return Err(error.into());
		}

		Ok(())
	}

	fn clear(&self) -> PlaitResult<usize> {
		let entries = match std::fs::read_dir(&self.dir) {
			Ok(entries) => entries,
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(0),
			Err(error) => return Err(error.into()),
		};

		let mut removed = 0;
		for entry in entries {
			let entry = entry?;
			if entry.file_type()?.is_file() {
				std::fs::remove_file(entry.path())?;
				removed += 1;
			}
		}

		Ok(removed)
	}
}

/// In-process store for tests and embedders that do not want files.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
	entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCacheStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.read().map_or(0, |entries| entries.len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl CacheStore for MemoryCacheStore {
	fn read(&self, key: &str) -> PlaitResult<Option<Vec<u8>>> {
		let entries = self.entries.read().map_err(|_| poisoned())?;
		Ok(entries.get(key).cloned())
	}

	fn write(&self, key: &str, bytes: &[u8]) -> PlaitResult<()> {
		let mut entries = self.entries.write().map_err(|_| poisoned())?;
		entries.insert(key.to_string(), bytes.to_vec());
		Ok(())
	}

	fn clear(&self) -> PlaitResult<usize> {
		let mut entries = self.entries.write().map_err(|_| poisoned())?;
		let removed = entries.len();
		entries.clear();
		Ok(removed)
	}
}

fn poisoned() -> PlaitError {
	PlaitError::Io(std::io::Error::other("cache store lock poisoned"))
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedTagLibraries {
	schema_version: u32,
	taglibs: TagLibraryMap,
}

/// Looks up compiled templates by fingerprint and composes them on a miss.
#[derive(Debug, Clone)]
pub struct CompiledTemplateCache {
	store: Arc<dyn CacheStore>,
	debug: bool,
}

impl CompiledTemplateCache {
	pub fn new(store: Arc<dyn CacheStore>) -> Self {
		Self {
			store,
			debug: false,
		}
	}

	/// In debug mode every lookup recomposes and rewrites its entries.
	#[must_use]
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	pub fn is_debug(&self) -> bool {
		self.debug
	}

	pub fn store(&self) -> &Arc<dyn CacheStore> {
		&self.store
	}

	/// Return the compiled form of `raw`, composing it relative to `base_dir`
	/// with `defaults` as the pre-registered tag libraries when no usable
	/// entry exists.
	pub fn load_or_compose(
		&self,
		raw: &str,
		base_dir: &Path,
		defaults: &TagLibraryMap,
	) -> PlaitResult<CompiledTemplate> {
		let raw = strip_bom(raw);
		let fingerprint = Fingerprint::of(raw);

		if !self.debug {
			if let Some(cached) = self.load(&fingerprint, defaults) {
				tracing::debug!(%fingerprint, "compiled template cache hit");
				return Ok(cached);
			}
		}

		let composed = compose(raw, base_dir, defaults)?;
		if let Err(error) = self.save(&composed) {
			tracing::warn!(%fingerprint, %error, "failed to write compiled template cache");
		}

		Ok(composed)
	}

	fn load(&self, fingerprint: &Fingerprint, defaults: &TagLibraryMap) -> Option<CompiledTemplate> {
		let key = fingerprint.as_str();
		let bytes = self.store.read(key).ok().flatten()?;
		let text = String::from_utf8(bytes).ok()?;

		let taglibs = match self.store.read(&taglibs_key(key)).ok()? {
			Some(bytes) => {
				let cached: CachedTagLibraries = serde_json::from_slice(&bytes).ok()?;
				if cached.schema_version != CACHE_SCHEMA_VERSION {
					return None;
				}
				cached.taglibs
			}
			None => defaults.clone(),
		};

		Some(CompiledTemplate {
			fingerprint: fingerprint.clone(),
			text,
			taglibs,
		})
	}

	fn save(&self, compiled: &CompiledTemplate) -> PlaitResult<()> {
		let key = compiled.fingerprint.as_str();
		let entry = CachedTagLibraries {
			schema_version: CACHE_SCHEMA_VERSION,
			taglibs: compiled.taglibs.clone(),
		};
		let payload = serde_json::to_vec_pretty(&entry).map_err(|error| {
			PlaitError::CacheEncode {
				key: taglibs_key(key),
				reason: error.to_string(),
			}
		})?;

		// The text entry gates a hit, so it lands only once its taglibs exist.
		self.store.write(&taglibs_key(key), &payload)?;
		self.store.write(key, compiled.text.as_bytes())
	}
}

fn taglibs_key(key: &str) -> String {
	format!("{key}{TAGLIBS_SUFFIX}")
}
