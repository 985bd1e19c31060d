//! The request pipeline: CORS, method resolution, authentication, rate limiting, validation,
//! sliding token renewal, execution, and uniform failure mapping.
//!
//! [`Dispatcher`] is transport-agnostic. It consumes an [`http::Request`] whose body is any
//! byte buffer and produces an [`http::Response`] with an owned body, so it can sit behind
//! any server that speaks the `http` crate's types.

pub mod cors;
pub mod metrics;
pub mod request;
pub mod response;

mod pipeline;

pub use cors::*;
pub use metrics::*;
pub use request::*;
pub use response::*;

// self
use crate::{
	_prelude::*,
	auth::AuthenticationResolver,
	config::DispatcherConfig,
	ext::{AllowAll, RateLimitPolicy, RefreshTokenHandler, SessionTokenValidator},
	handler::HandlerRegistry,
};

/// Routes API calls to registered handlers.
///
/// The dispatcher holds only immutable configuration and shared collaborators, so one instance
/// can serve any number of concurrent requests from behind an [`Arc`].
#[derive(Clone)]
pub struct Dispatcher {
	/// Validated configuration.
	pub config: Arc<DispatcherConfig>,
	/// Handler factories keyed by method name.
	pub registry: Arc<HandlerRegistry>,
	/// Gate consulted after authentication and before request validation.
	pub rate_limiter: Arc<dyn RateLimitPolicy>,
	/// Shared counters for dispatch outcomes.
	pub metrics: Arc<DispatchMetrics>,
	resolver: AuthenticationResolver,
}
impl Dispatcher {
	/// Creates a dispatcher without collaborators; every call passes the rate-limit gate.
	pub fn new(config: DispatcherConfig, registry: HandlerRegistry) -> Self {
		let resolver = AuthenticationResolver::new(config.signing_key.clone());

		Self {
			config: Arc::new(config),
			registry: Arc::new(registry),
			rate_limiter: Arc::new(AllowAll),
			metrics: Default::default(),
			resolver,
		}
	}

	/// Registers the collaborator that vouches for fresh session tokens.
	pub fn with_session_validator(mut self, validator: Arc<dyn SessionTokenValidator>) -> Self {
		self.resolver = self.resolver.with_session_validator(validator);

		self
	}

	/// Registers the collaborator behind the refresh-cookie fallback and sliding renewal.
	///
	/// Without it, expired tokens are always rejected and tokens are never renewed.
	pub fn with_refresh_token_handler(mut self, handler: Arc<dyn RefreshTokenHandler>) -> Self {
		self.resolver = self.resolver.with_refresh_handler(handler);

		self
	}

	/// Replaces the rate-limit policy.
	pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimitPolicy>) -> Self {
		self.rate_limiter = rate_limiter;

		self
	}

	/// Authentication resolver used for handlers that require a session token.
	pub fn resolver(&self) -> &AuthenticationResolver {
		&self.resolver
	}
}
impl Debug for Dispatcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("config", &self.config)
			.field("registry", &self.registry)
			.field("resolver", &self.resolver)
			.field("metrics", &self.metrics)
			.finish()
	}
}
