//! Secret wrappers that redact sensitive material from logs.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Opaque refresh token lifted from the `refreshToken` cookie.
///
/// The dispatcher never stores or interprets the value; it only hands it to the registered
/// refresh-token collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);
impl RefreshToken {
	/// Wraps a new refresh token value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Stable, non-reversible label for log correlation.
	///
	/// Base64 (no padding) encoding of the SHA-256 digest, truncated to 12 characters.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());
		let mut encoded = URL_SAFE_NO_PAD.encode(digest);

		encoded.truncate(12);

		encoded
	}
}
impl Debug for RefreshToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("RefreshToken").field(&"<redacted>").finish()
	}
}
impl Display for RefreshToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// HMAC key used to sign and verify session tokens.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct SigningKey(Arc<[u8]>);
impl SigningKey {
	/// Wraps raw key material.
	pub fn new(material: impl AsRef<[u8]>) -> Self {
		Self(Arc::from(material.as_ref()))
	}

	/// Returns the key bytes. Callers must avoid logging them.
	pub fn expose(&self) -> &[u8] {
		&self.0
	}

	/// Returns `true` when no key material is present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<String> for SigningKey {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl Debug for SigningKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningKey").field(&"<redacted>").finish()
	}
}
