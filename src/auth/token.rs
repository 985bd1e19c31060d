//! Signed session tokens: decode, expiry checks, and in-place renewal.

// crates.io
use jsonwebtoken::{
	Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind as JwtErrorKind,
};
// self
use crate::{
	_prelude::*,
	auth::{SigningKey, UserId},
};

/// Errors produced while decoding or signing a [`SessionToken`].
#[derive(Debug, ThisError)]
pub enum TokenError {
	/// The signature does not match the payload under the configured key.
	#[error("Session token signature is invalid.")]
	InvalidSignature,
	/// The payload is not a well-formed token.
	#[error("Session token is malformed.")]
	Malformed {
		/// Underlying codec failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// An expiry instant, decoded or computed, cannot be represented.
	#[error("Session token expiry is out of range.")]
	ExpiryOutOfRange,
	/// Signing the claims failed.
	#[error("Session token could not be signed.")]
	Signing {
		/// Underlying codec failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
	user_id: UserId,
	expires: i64,
}

/// Short-lived credential carrying a user identity and an absolute expiry.
///
/// The wire form is a compact HS256 JWS whose claims are `{"userId": u64, "expires": unix
/// seconds}`. Signature and expiry are independent: [`SessionToken::decode`] only verifies
/// the signature, so an expired but authentic token can still take the refresh path.
#[derive(Clone)]
pub struct SessionToken {
	user_id: UserId,
	expires: OffsetDateTime,
	key: SigningKey,
	encoded: String,
}
impl SessionToken {
	/// Signs a new token for `user_id`, truncating `expires` to whole seconds.
	pub fn issue(
		user_id: UserId,
		expires: OffsetDateTime,
		key: &SigningKey,
	) -> Result<Self, TokenError> {
		let expires = truncate_to_seconds(expires);
		let encoded = sign(user_id, expires, key)?;

		Ok(Self { user_id, expires, key: key.clone(), encoded })
	}

	/// Verifies and decodes a bearer payload.
	pub fn decode(payload: &str, key: &SigningKey) -> Result<Self, TokenError> {
		let mut validation = Validation::new(Algorithm::HS256);

		// Expiry is judged by the caller against its own clock.
		validation.validate_exp = false;
		validation.required_spec_claims.clear();

		let data = jsonwebtoken::decode::<Claims>(
			payload,
			&DecodingKey::from_secret(key.expose()),
			&validation,
		)
		.map_err(|err| match err.kind() {
			JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
			_ => TokenError::Malformed { source: err },
		})?;
		let expires = OffsetDateTime::from_unix_timestamp(data.claims.expires)
			.map_err(|_| TokenError::ExpiryOutOfRange)?;

		Ok(Self {
			user_id: data.claims.user_id,
			expires,
			key: key.clone(),
			encoded: payload.into(),
		})
	}

	/// Identity the token was issued to.
	pub fn user_id(&self) -> UserId {
		self.user_id
	}

	/// Absolute expiry instant.
	pub fn expires(&self) -> OffsetDateTime {
		self.expires
	}

	/// Returns `true` iff `expires <= now`.
	pub fn is_expired(&self, now: OffsetDateTime) -> bool {
		self.expires <= now
	}

	/// Moves the expiry to `now + lifetime` and re-signs the token.
	///
	/// The token is left untouched when the new expiry is out of range or signing fails.
	pub fn refresh(&mut self, now: OffsetDateTime, lifetime: Duration) -> Result<(), TokenError> {
		let expires =
			truncate_to_seconds(now.checked_add(lifetime).ok_or(TokenError::ExpiryOutOfRange)?);

		self.encoded = sign(self.user_id, expires, &self.key)?;
		self.expires = expires;

		Ok(())
	}

	/// Wire form suitable for an `Authorization: Bearer` header.
	pub fn encode(&self) -> &str {
		&self.encoded
	}
}
impl Debug for SessionToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionToken")
			.field("user_id", &self.user_id)
			.field("expires", &self.expires)
			.field("encoded", &"<redacted>")
			.finish()
	}
}

fn sign(user_id: UserId, expires: OffsetDateTime, key: &SigningKey) -> Result<String, TokenError> {
	let claims = Claims { user_id, expires: expires.unix_timestamp() };

	jsonwebtoken::encode(
		&Header::new(Algorithm::HS256),
		&claims,
		&EncodingKey::from_secret(key.expose()),
	)
	.map_err(|source| TokenError::Signing { source })
}

fn truncate_to_seconds(instant: OffsetDateTime) -> OffsetDateTime {
	instant - Duration::nanoseconds(i64::from(instant.nanosecond()))
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::{PrimitiveDateTime, macros};
	// self
	use super::*;

	fn key() -> SigningKey {
		SigningKey::new("token-test-key")
	}

	#[test]
	fn decode_reverses_encode() {
		let expires = macros::datetime!(2025-03-01 12:00:00.750 UTC);
		let token = SessionToken::issue(UserId::new(7), expires, &key())
			.expect("Token fixture should sign successfully.");
		let decoded =
			SessionToken::decode(token.encode(), &key()).expect("Encoded token should decode.");

		assert_eq!(decoded.user_id(), UserId::new(7));
		assert_eq!(decoded.expires(), token.expires());
		assert_eq!(decoded.expires(), macros::datetime!(2025-03-01 12:00 UTC));
	}

	#[test]
	fn signature_is_checked_independently_of_expiry() {
		let long_gone = macros::datetime!(2001-01-01 00:00 UTC);
		let token = SessionToken::issue(UserId::new(1), long_gone, &key())
			.expect("Expired fixture should still sign.");
		let decoded = SessionToken::decode(token.encode(), &key())
			.expect("Expired but authentic tokens must decode.");

		assert!(decoded.is_expired(macros::datetime!(2025-01-01 00:00 UTC)));
		assert!(matches!(
			SessionToken::decode(token.encode(), &SigningKey::new("other-key")),
			Err(TokenError::InvalidSignature)
		));
	}

	#[test]
	fn garbage_payloads_are_malformed() {
		assert!(matches!(
			SessionToken::decode("not-a-token", &key()),
			Err(TokenError::Malformed { .. })
		));
		assert!(matches!(SessionToken::decode("", &key()), Err(TokenError::Malformed { .. })));
	}

	#[test]
	fn tampered_payload_fails_verification() {
		let token =
			SessionToken::issue(UserId::new(5), macros::datetime!(2030-01-01 00:00 UTC), &key())
				.expect("Token fixture should sign successfully.");
		let forged = SessionToken::issue(
			UserId::new(6),
			macros::datetime!(2030-01-01 00:00 UTC),
			&SigningKey::new("attacker"),
		)
		.expect("Forged fixture should sign successfully.");
		let mut parts: Vec<&str> = token.encode().split('.').collect();
		let forged_claims = forged.encode().split('.').nth(1).expect("JWS has a claims segment.");

		parts[1] = forged_claims;

		assert!(SessionToken::decode(&parts.join("."), &key()).is_err());
	}

	#[test]
	fn expiry_boundary_is_inclusive() {
		let expires = macros::datetime!(2025-01-01 01:00 UTC);
		let token = SessionToken::issue(UserId::new(3), expires, &key())
			.expect("Token fixture should sign successfully.");

		assert!(!token.is_expired(macros::datetime!(2025-01-01 00:59:59 UTC)));
		assert!(token.is_expired(expires));
	}

	#[test]
	fn refresh_extends_and_resigns() {
		let issued_expiry = macros::datetime!(2025-01-01 01:00 UTC);
		let mut token = SessionToken::issue(UserId::new(9), issued_expiry, &key())
			.expect("Token fixture should sign successfully.");
		let original_wire = token.encode().to_owned();

		token
			.refresh(macros::datetime!(2025-01-01 00:50 UTC), Duration::minutes(30))
			.expect("Refresh should re-sign successfully.");

		assert_eq!(token.expires(), macros::datetime!(2025-01-01 01:20 UTC));
		assert_ne!(token.encode(), original_wire);

		let decoded =
			SessionToken::decode(token.encode(), &key()).expect("Refreshed token should decode.");

		assert_eq!(decoded.user_id(), UserId::new(9));
		assert_eq!(decoded.expires(), token.expires());
	}

	#[test]
	fn refresh_past_the_calendar_leaves_the_token_untouched() {
		let mut token =
			SessionToken::issue(UserId::new(4), macros::datetime!(2030-01-01 00:00 UTC), &key())
				.expect("Token fixture should sign successfully.");
		let original_wire = token.encode().to_owned();

		assert!(matches!(
			token.refresh(PrimitiveDateTime::MAX.assume_utc(), Duration::minutes(30)),
			Err(TokenError::ExpiryOutOfRange)
		));
		assert_eq!(token.encode(), original_wire);
		assert_eq!(token.expires(), macros::datetime!(2030-01-01 00:00 UTC));
	}

	#[test]
	fn debug_redacts_the_wire_form() {
		let token =
			SessionToken::issue(UserId::new(2), macros::datetime!(2030-01-01 00:00 UTC), &key())
				.expect("Token fixture should sign successfully.");

		assert!(!format!("{token:?}").contains(token.encode()));
	}
}
