//! Strongly typed identifiers used across the dispatch pipeline.
//!
//! Method names and language tags arrive in request headers and key lookups in the handler
//! registry and the language table, so both are restricted to short, header-safe ASCII.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	(
		$(#[$meta:meta])*
		$name:ident { kind: $kind:literal, max_len: $max:literal, allowed: $allowed:expr $(,)? }
	) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Longest accepted value, in bytes.
			pub const MAX_LEN: usize = $max;

			/// Validates and wraps `value`.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				check_identifier($kind, &value, Self::MAX_LEN, $allowed)?;

				Ok(Self(value))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.debug_tuple($kind).field(&self.0).finish()
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

/// Error returned when an identifier fails validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The value was empty.
	#[error("{kind} cannot be empty.")]
	Empty {
		/// Identifier kind (`Method`, `Language`).
		kind: &'static str,
	},
	/// The value is longer than the kind permits.
	#[error("{kind} exceeds {max} bytes.")]
	TooLong {
		/// Identifier kind (`Method`, `Language`).
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
	/// The value contains a character outside the kind's alphabet.
	#[error("{kind} contains the disallowed character {character:?}.")]
	InvalidCharacter {
		/// Identifier kind (`Method`, `Language`).
		kind: &'static str,
		/// First offending character.
		character: char,
	},
}

def_id! {
	/// Key into the handler registry, carried by the `X-API-Method` header.
	MethodName { kind: "Method", max_len: 64, allowed: is_method_char }
}
def_id! {
	/// UI language tag (for example `en` or `pt-BR`), carried by the `X-UI-Language` header.
	Language { kind: "Language", max_len: 35, allowed: is_language_char }
}

/// Numeric identity of an authenticated user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);
impl UserId {
	/// Wraps a raw user identifier.
	pub const fn new(value: u64) -> Self {
		Self(value)
	}

	/// Returns the raw identifier.
	pub const fn get(self) -> u64 {
		self.0
	}
}
impl From<u64> for UserId {
	fn from(value: u64) -> Self {
		Self(value)
	}
}
impl Display for UserId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0, f)
	}
}

fn is_method_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

fn is_language_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '-'
}

fn check_identifier(
	kind: &'static str,
	value: &str,
	max: usize,
	allowed: fn(char) -> bool,
) -> Result<(), IdentifierError> {
	if value.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if value.len() > max {
		return Err(IdentifierError::TooLong { kind, max });
	}
	if let Some(character) = value.chars().find(|c| !allowed(*c)) {
		return Err(IdentifierError::InvalidCharacter { kind, character });
	}

	Ok(())
}
