//! Request-dispatch core for bearer-token APIs: short-lived session tokens with sliding
//! renewal, refresh-cookie fallbacks, per-method rate-limit gates, and a uniform CORS/error
//! contract in one transport-agnostic crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ext;
pub mod handler;
pub mod obs;
#[cfg(feature = "axum")] pub mod transport;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for tests; enabled via `cfg(test)` or the `test`
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::{
		auth::{Language, MethodName, RefreshToken, SessionToken, SigningKey, UserId},
		config::DispatcherConfig,
		error::CollaboratorError,
		ext::{
			CollaboratorFuture, RateLimitContext, RateLimitPolicy, RefreshTokenHandler,
			SessionTokenValidator,
		},
		handler::{ApiHandler, HandlerFuture},
	};

	/// Secret shared by every fixture that signs session tokens.
	pub const TEST_SIGNING_SECRET: &str = "dispatcher-test-signing-secret";
	/// Lifetime configured by [`test_config`].
	pub const TEST_LIFETIME: Duration = Duration::minutes(30);
	/// Proactive refresh interval configured by [`test_config`].
	pub const TEST_REFRESH_INTERVAL: Duration = Duration::minutes(5);

	/// Signing key derived from [`TEST_SIGNING_SECRET`].
	pub fn test_signing_key() -> SigningKey {
		SigningKey::new(TEST_SIGNING_SECRET)
	}

	/// Dispatcher configuration used across tests.
	pub fn test_config() -> DispatcherConfig {
		DispatcherConfig::builder(test_signing_key())
			.languages(["en", "de", "fr"])
			.fallback_language("en")
			.allow_credentials_origin("https://app.example.com")
			.session_token_lifetime(TEST_LIFETIME)
			.session_token_refresh_interval(TEST_REFRESH_INTERVAL)
			.build()
			.expect("Test dispatcher configuration should be valid.")
	}

	/// Issues a token for `user` expiring at `expires`, signed with the test key.
	pub fn issue_token(user: u64, expires: OffsetDateTime) -> SessionToken {
		SessionToken::issue(UserId::new(user), expires, &test_signing_key())
			.expect("Test session token should sign successfully.")
	}

	/// Builds a method name fixture.
	pub fn method(name: &str) -> MethodName {
		MethodName::new(name).expect("Method name fixture should be valid.")
	}

	/// Call counters shared between a handler factory and the test body.
	#[derive(Debug, Default)]
	pub struct HandlerCalls {
		/// Number of handler instances constructed.
		pub constructed: AtomicUsize,
		/// Number of `validate_request` invocations.
		pub validated: AtomicUsize,
		/// Number of `execute` invocations.
		pub executed: AtomicUsize,
	}
	impl HandlerCalls {
		/// Reads the construction counter.
		pub fn constructed(&self) -> usize {
			self.constructed.load(Ordering::SeqCst)
		}

		/// Reads the validation counter.
		pub fn validated(&self) -> usize {
			self.validated.load(Ordering::SeqCst)
		}

		/// Reads the execution counter.
		pub fn executed(&self) -> usize {
			self.executed.load(Ordering::SeqCst)
		}
	}

	/// Handler that echoes the request, language, and caller identity.
	#[derive(Debug)]
	pub struct EchoHandler {
		/// Whether the handler requires authentication.
		pub requires_authentication: bool,
		/// Value returned from `validate_request`.
		pub accept_request: bool,
		/// Shared call counters.
		pub calls: Arc<HandlerCalls>,
	}
	impl EchoHandler {
		/// Creates a handler and bumps the construction counter.
		pub fn new(requires_authentication: bool, calls: Arc<HandlerCalls>) -> Self {
			calls.constructed.fetch_add(1, Ordering::SeqCst);

			Self { requires_authentication, accept_request: true, calls }
		}

		/// Makes `validate_request` reject every payload.
		pub fn rejecting(mut self) -> Self {
			self.accept_request = false;

			self
		}
	}
	impl ApiHandler for EchoHandler {
		fn requires_authentication(&self) -> bool {
			self.requires_authentication
		}

		fn validate_request(&self, _request: &Value) -> bool {
			self.calls.validated.fetch_add(1, Ordering::SeqCst);

			self.accept_request
		}

		fn execute<'a>(
			&'a self,
			request: &'a Value,
			session_token: Option<&'a SessionToken>,
			language: &'a Language,
		) -> HandlerFuture<'a> {
			Box::pin(async move {
				self.calls.executed.fetch_add(1, Ordering::SeqCst);

				Ok(serde_json::json!({
					"request": request,
					"language": language.as_ref(),
					"userId": session_token.map(|token| token.user_id().get()),
				}))
			})
		}
	}

	/// Session validator returning a fixed verdict.
	#[derive(Debug)]
	pub struct StaticSessionValidator(pub bool);
	impl SessionTokenValidator for StaticSessionValidator {
		fn validate_session_token<'a>(
			&'a self,
			_token: &'a SessionToken,
		) -> CollaboratorFuture<'a, bool> {
			let verdict = self.0;

			Box::pin(async move { Ok(verdict) })
		}
	}

	/// Refresh-token handler that accepts exactly one cookie value.
	#[derive(Debug)]
	pub struct StaticRefreshTokenHandler {
		/// Cookie value considered valid.
		pub valid_cookie: String,
		/// Answer returned by `may_refresh_session_token`.
		pub may_refresh: bool,
		/// Number of `validate_refresh_token` invocations.
		pub validations: AtomicUsize,
	}
	impl StaticRefreshTokenHandler {
		/// Creates a handler accepting `valid_cookie`.
		pub fn new(valid_cookie: impl Into<String>, may_refresh: bool) -> Self {
			Self {
				valid_cookie: valid_cookie.into(),
				may_refresh,
				validations: AtomicUsize::new(0),
			}
		}
	}
	impl RefreshTokenHandler for StaticRefreshTokenHandler {
		fn validate_refresh_token<'a>(
			&'a self,
			refresh_token: &'a RefreshToken,
			_user_id: UserId,
		) -> CollaboratorFuture<'a, bool> {
			self.validations.fetch_add(1, Ordering::SeqCst);

			let verdict = refresh_token.expose() == self.valid_cookie;

			Box::pin(async move { Ok(verdict) })
		}

		fn may_refresh_session_token(&self, _user_id: UserId) -> CollaboratorFuture<'_, bool> {
			let verdict = self.may_refresh;

			Box::pin(async move { Ok(verdict) })
		}
	}

	/// Rate limiter returning a fixed verdict while counting calls.
	#[derive(Debug)]
	pub struct CountingRateLimiter {
		/// Verdict returned for every check.
		pub allow: bool,
		/// Number of checks performed.
		pub checks: AtomicUsize,
	}
	impl CountingRateLimiter {
		/// Creates a limiter with the provided verdict.
		pub fn new(allow: bool) -> Self {
			Self { allow, checks: AtomicUsize::new(0) }
		}
	}
	impl RateLimitPolicy for CountingRateLimiter {
		fn check<'a>(&'a self, _context: &'a RateLimitContext<'a>) -> CollaboratorFuture<'a, bool> {
			self.checks.fetch_add(1, Ordering::SeqCst);

			let verdict = self.allow;

			Box::pin(async move { Ok(verdict) })
		}
	}

	/// Collaborator that always fails, for error-normalization tests.
	#[derive(Debug)]
	pub struct FailingCollaborator;
	impl SessionTokenValidator for FailingCollaborator {
		fn validate_session_token<'a>(
			&'a self,
			_token: &'a SessionToken,
		) -> CollaboratorFuture<'a, bool> {
			Box::pin(async move { Err(CollaboratorError::backend("revocation list unreachable")) })
		}
	}
	impl RateLimitPolicy for FailingCollaborator {
		fn check<'a>(&'a self, _context: &'a RateLimitContext<'a>) -> CollaboratorFuture<'a, bool> {
			Box::pin(async move { Err(CollaboratorError::backend("rate limit store unreachable")) })
		}
	}

	/// Starts a `POST` request carrying the method header and a JSON content type.
	pub fn post(method: &str) -> http::request::Builder {
		http::Request::post("/api")
			.header("X-API-Method", method)
			.header(http::header::CONTENT_TYPE, "application/json")
	}

	/// Formats an `Authorization` header value for `token`.
	pub fn bearer(token: &SessionToken) -> String {
		format!("Bearer {}", token.encode())
	}
}

mod _prelude {
	pub use std::{
		collections::{HashMap, HashSet},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

pub use http;
pub use serde_json;
#[cfg(test)] use {api_dispatcher as _, color_eyre as _, tokio as _};
