//! Template composition: tag library declarations, the master template merge
//! and part inclusion, followed by normalization.
//!
//! ```text
//! <taglib prefix="ui" namespace="acme.ui" />
//! <page:template file="layout.html" />
//! <page:content id="body"><ui:card>…</ui:card></page:content>
//! ```
//!
//! The child document above is merged into `layout.html`: every
//! `<page:contentHolder id="body" />` in the master receives the trimmed body
//! of the matching content block. Anything in the child outside a content
//! block is discarded.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::Fingerprint;
use crate::PlaitError;
use crate::PlaitResult;
use crate::TagLibraryMap;
use crate::markup::attribute;
use crate::markup::elements;
use crate::markup::find_ci;
use crate::markup::find_start_tag;
use crate::markup::start_tags;
use crate::markup::strip_bom;
use crate::normalizer::normalize;

const TAGLIB: &str = "taglib";
const TEMPLATE: &str = "page:template";
const PART: &str = "page:part";
const CONTENT_HOLDER: &str = "page:contentHolder";
const CONTENT: &str = "page:content";

/// A composed and normalized document, ready for tag expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Composed {
	/// Fingerprint of the raw document text.
	pub fingerprint: Fingerprint,
	/// Normalized text with tag markers and namespaced placeholders.
	pub text: String,
	/// Every tag library prefix visible to the document.
	pub taglibs: TagLibraryMap,
}

/// Compose a raw document. `base_dir` is the directory the document lives
/// in; master and part references resolve relative to it. `taglibs` holds
/// the pre-registered prefixes and is extended with inline declarations.
pub fn compose(raw: &str, base_dir: &Path, taglibs: &TagLibraryMap) -> PlaitResult<Composed> {
	let raw = strip_bom(raw);
	let fingerprint = Fingerprint::of(raw);
	let mut taglibs = taglibs.clone();

	let document = extract_taglibs(raw, &mut taglibs)?;
	let document = merge_master(&document, base_dir, &mut taglibs)?;
	let document = include_parts(&document, base_dir)?;
	let text = normalize(&document, &taglibs, &fingerprint);

	tracing::debug!(
		%fingerprint,
		taglibs = taglibs.len(),
		"composed document"
	);

	Ok(Composed {
		fingerprint,
		text,
		taglibs,
	})
}

/// Remove every `<taglib ... />` declaration, recording its prefix. The first
/// declaration of a prefix wins.
pub(crate) fn extract_taglibs(text: &str, taglibs: &mut TagLibraryMap) -> PlaitResult<String> {
	let mut result = String::with_capacity(text.len());
	let mut cursor = 0;

	for tag in start_tags(text, TAGLIB) {
		if !tag.self_closing {
			continue;
		}

		let attributes = tag.attributes();
		let prefix = required_attribute(&attributes, TAGLIB, "prefix")?;
		let namespace = required_attribute(&attributes, TAGLIB, "namespace")?;

		if !taglibs.declare(prefix.trim(), namespace.trim()) {
			tracing::debug!(prefix, "tag library prefix already declared");
		}

		result.push_str(&text[cursor..tag.range.start]);
		cursor = tag.range.end;
	}

	result.push_str(&text[cursor..]);
	Ok(result)
}

/// Replace the document with its master template when it references one.
///
/// Only the first `<page:template>` reference is honored.
fn merge_master(text: &str, base_dir: &Path, taglibs: &mut TagLibraryMap) -> PlaitResult<String> {
	let Some(reference) = find_start_tag(text, TEMPLATE, 0) else {
		return Ok(text.to_string());
	};

	let attributes = reference.attributes();
	let file = required_attribute(&attributes, TEMPLATE, "file")?;
	let path = base_dir.join(file);

	if !path.is_file() {
		return Err(PlaitError::MasterTemplateMissing {
			path: path.display().to_string(),
		});
	}

	tracing::debug!(master = %path.display(), "merging master template");
	let master = std::fs::read_to_string(&path)?;
	let master_dir = parent_dir(&path);
	let master = include_parts(strip_bom(&master), &master_dir)?;
	let master = extract_taglibs(&master, taglibs)?;

	let blocks = content_blocks(text);
	Ok(fill_holders(&master, &blocks))
}

/// Collect the `<page:content id="...">` blocks of a child document. A
/// repeated id keeps the first block.
fn content_blocks(text: &str) -> HashMap<String, String> {
	let mut blocks = HashMap::new();

	for element in elements(text, CONTENT) {
		let attributes = element.start.attributes();
		let Some(id) = attribute(&attributes, "id") else {
			continue;
		};

		blocks
			.entry(id.to_string())
			.or_insert_with(|| element.inner.trim().to_string());
	}

	blocks
}

/// Replace every content holder with its block, or with nothing.
fn fill_holders(master: &str, blocks: &HashMap<String, String>) -> String {
	let end_tag = format!("</{CONTENT_HOLDER}>");
	let mut result = String::with_capacity(master.len());
	let mut cursor = 0;

	while let Some(holder) = find_start_tag(master, CONTENT_HOLDER, cursor) {
		let end = if holder.self_closing {
			holder.range.end
		} else {
			find_ci(master, &end_tag, holder.range.end)
				.map_or(holder.range.end, |index| index + end_tag.len())
		};

		result.push_str(&master[cursor..holder.range.start]);

		let attributes = holder.attributes();
		match attribute(&attributes, "id").and_then(|id| blocks.get(id)) {
			Some(block) => result.push_str(block),
			None => {
				tracing::debug!(
					id = attribute(&attributes, "id").unwrap_or_default(),
					"content holder has no matching block"
				);
			}
		}

		cursor = end;
	}

	result.push_str(&master[cursor..]);
	result
}

/// Replace every `<page:part file="..." />` with the referenced file's
/// contents. Missing files are replaced with nothing. Included text is not
/// scanned again.
fn include_parts(text: &str, base_dir: &Path) -> PlaitResult<String> {
	let mut result = String::with_capacity(text.len());
	let mut cursor = 0;

	for reference in start_tags(text, PART) {
		let attributes = reference.attributes();
		let file = required_attribute(&attributes, PART, "file")?;
		let path = base_dir.join(file);

		result.push_str(&text[cursor..reference.range.start]);
		cursor = reference.range.end;

		if !path.is_file() {
			tracing::debug!(part = %path.display(), "part file not found, skipping");
			continue;
		}

		let content = std::fs::read_to_string(&path)?;
		result.push_str(strip_bom(&content));
	}

	result.push_str(&text[cursor..]);
	Ok(result)
}

fn required_attribute<'a>(
	attributes: &'a [(String, String)],
	element: &str,
	name: &str,
) -> PlaitResult<&'a str> {
	attribute(attributes, name)
		.filter(|value| !value.trim().is_empty())
		.ok_or_else(|| {
			PlaitError::MalformedDirective {
				element: element.to_string(),
				reason: format!("missing `{name}` attribute"),
			}
		})
}

fn parent_dir(path: &Path) -> PathBuf {
	path.parent().map_or_else(PathBuf::new, Path::to_path_buf)
}
