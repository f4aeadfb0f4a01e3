use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

/// Number of hex characters kept from the SHA-256 digest.
const FINGERPRINT_LEN: usize = 32;

/// Content hash of a raw document.
///
/// The fingerprint names the compiled-template cache entries and namespaces
/// the variable placeholders of the document (`${<fingerprint>:user.name}`),
/// so it must be stable across processes and toolchain versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
	/// Hash the raw document text.
	pub fn of(content: impl AsRef<[u8]>) -> Self {
		let mut hasher = Sha256::new();
		hasher.update(content.as_ref());
		let digest = hex::encode(hasher.finalize());
		Self(digest[..FINGERPRINT_LEN].to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// The opening sequence of every variable placeholder in this namespace.
	pub fn placeholder_open(&self) -> String {
		format!("${{{}:", self.0)
	}
}

impl Display for Fingerprint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for Fingerprint {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
