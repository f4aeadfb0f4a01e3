use std::collections::BTreeSet;

use crate::DataContext;
use crate::Fingerprint;
use crate::context::scalar_text;
use crate::placeholder::placeholders;
use crate::placeholder::strip_placeholders;

/// Substitute the namespaced variable placeholders of `text` with values from
/// `context`.
///
/// Scalars replace every occurrence of their placeholder. Placeholders whose
/// path is missing or points at a composite value are removed, as is anything
/// else left in the document's namespace. Resolving already resolved text
/// changes nothing.
pub fn resolve(text: &str, context: &DataContext, fingerprint: &Fingerprint) -> String {
	let keys: BTreeSet<&str> = placeholders(text, fingerprint)
		.into_iter()
		.map(|placeholder| placeholder.key)
		.collect();

	let mut resolved = text.to_string();
	for key in keys {
		let Some(value) = context.resolve_path(key) else {
			tracing::trace!(key, "unresolved variable");
			continue;
		};

		if let Some(replacement) = scalar_text(value) {
			let holder = format!("{}{key}}}", fingerprint.placeholder_open());
			resolved = resolved.replace(&holder, &replacement);
		}
	}

	strip_placeholders(&resolved, fingerprint)
}
