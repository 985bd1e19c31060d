//! Bearer credential resolution: decode, freshness check, and collaborator consultation.
//!
//! [`AuthenticationResolver::resolve`] decides between three outcomes for a request that
//! requires authentication:
//!
//! - a fresh, authentic token that the session validator (if any) still accepts;
//! - an expired but authentic token vouched for by the refresh-token collaborator through the
//!   `refreshToken` cookie;
//! - rejection.
//!
//! Every rejection surfaces as [`DispatchError::Unauthorized`]. The precise reason is logged at
//! debug level and never reaches the client.

// crates.io
use http::{HeaderMap, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::{RefreshToken, SessionToken, SigningKey, TokenError},
	dispatch::request,
	error::{CollaboratorError, DispatchError},
	ext::{RefreshTokenHandler, SessionTokenValidator},
	obs,
};

/// Name of the cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

const BEARER_SCHEME: &str = "Bearer";

/// Internal rejection reasons; collapsed to `Unauthorized` before leaving the resolver.
#[derive(Debug, ThisError)]
pub(crate) enum Rejection {
	#[error("Authorization header is missing.")]
	MissingHeader,
	#[error("Authorization header is not `<scheme> <payload>`.")]
	MalformedHeader,
	#[error("Authorization scheme is not Bearer.")]
	UnsupportedScheme,
	#[error(transparent)]
	Token(#[from] TokenError),
	#[error("Session validator rejected the token.")]
	Revoked,
	#[error("Token expired and no refresh-token handler is registered.")]
	NoRefreshHandler,
	#[error("Token expired and no refresh-token cookie was sent.")]
	MissingRefreshCookie,
	#[error("Refresh-token handler rejected the cookie.")]
	RefreshRejected,
	#[error(transparent)]
	Collaborator(#[from] CollaboratorError),
}

/// Derives a trusted identity from request headers.
#[derive(Clone)]
pub struct AuthenticationResolver {
	signing_key: SigningKey,
	session_validator: Option<Arc<dyn SessionTokenValidator>>,
	refresh_handler: Option<Arc<dyn RefreshTokenHandler>>,
}
impl AuthenticationResolver {
	/// Creates a resolver without collaborators.
	pub fn new(signing_key: SigningKey) -> Self {
		Self { signing_key, session_validator: None, refresh_handler: None }
	}

	/// Registers the collaborator consulted for fresh tokens.
	pub fn with_session_validator(mut self, validator: Arc<dyn SessionTokenValidator>) -> Self {
		self.session_validator = Some(validator);

		self
	}

	/// Registers the collaborator consulted for expired tokens and proactive renewal.
	pub fn with_refresh_handler(mut self, handler: Arc<dyn RefreshTokenHandler>) -> Self {
		self.refresh_handler = Some(handler);

		self
	}

	/// Refresh-token collaborator, if registered.
	pub fn refresh_handler(&self) -> Option<&Arc<dyn RefreshTokenHandler>> {
		self.refresh_handler.as_ref()
	}

	/// Resolves the request's session token as of `now`.
	///
	/// An expired token accepted through the refresh cookie is returned unchanged; renewing it
	/// is the dispatcher's job.
	pub async fn resolve(
		&self,
		headers: &HeaderMap,
		now: OffsetDateTime,
	) -> Result<SessionToken, DispatchError> {
		self.resolve_inner(headers, now).await.map_err(|rejection| {
			obs::auth_rejected(&rejection);

			DispatchError::Unauthorized
		})
	}

	async fn resolve_inner(
		&self,
		headers: &HeaderMap,
		now: OffsetDateTime,
	) -> Result<SessionToken, Rejection> {
		let payload = bearer_payload(headers)?;
		let token = SessionToken::decode(payload, &self.signing_key)?;

		if token.is_expired(now) {
			let handler = self.refresh_handler.as_ref().ok_or(Rejection::NoRefreshHandler)?;
			let cookie = request::cookie(headers, REFRESH_TOKEN_COOKIE)
				.map(RefreshToken::new)
				.ok_or(Rejection::MissingRefreshCookie)?;

			obs::refresh_cookie_presented(token.user_id(), &cookie);

			if !handler.validate_refresh_token(&cookie, token.user_id()).await? {
				return Err(Rejection::RefreshRejected);
			}

			return Ok(token);
		}
		if let Some(validator) = &self.session_validator
			&& !validator.validate_session_token(&token).await?
		{
			return Err(Rejection::Revoked);
		}

		Ok(token)
	}
}
impl Debug for AuthenticationResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticationResolver")
			.field("signing_key", &self.signing_key)
			.field("session_validator_set", &self.session_validator.is_some())
			.field("refresh_handler_set", &self.refresh_handler.is_some())
			.finish()
	}
}

/// Splits `Authorization` into exactly `<scheme> <payload>` and requires the Bearer scheme.
fn bearer_payload(headers: &HeaderMap) -> Result<&str, Rejection> {
	let value = headers.get(AUTHORIZATION).ok_or(Rejection::MissingHeader)?;
	let value = value.to_str().map_err(|_| Rejection::MalformedHeader)?;
	let mut parts = value.split(' ');
	let (Some(scheme), Some(payload), None) = (parts.next(), parts.next(), parts.next()) else {
		return Err(Rejection::MalformedHeader);
	};

	if scheme != BEARER_SCHEME {
		return Err(Rejection::UnsupportedScheme);
	}

	Ok(payload)
}
