//! Handler contract implemented by every API method, plus the lazily-constructing registry.

pub mod registry;

pub use registry::*;

// crates.io
use http::StatusCode;
// self
use crate::{
	_prelude::*,
	auth::{Language, SessionToken},
	error::BoxError,
};

/// Boxed future returned by [`ApiHandler::execute`].
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, HandlerError>> + 'a + Send>>;

/// Business logic behind one API method.
///
/// A fresh instance is built for every dispatch through the factory registered in
/// [`HandlerRegistry`], so implementations need no interior mutability unless they share
/// state on purpose.
pub trait ApiHandler
where
	Self: Send + Sync,
{
	/// Whether callers must present a bearer session token.
	fn requires_authentication(&self) -> bool;

	/// Checks the payload shape; `false` answers `400 Bad Request`.
	fn validate_request(&self, request: &Value) -> bool;

	/// Runs the method. `session_token` is `Some` exactly when authentication was required.
	fn execute<'a>(
		&'a self,
		request: &'a Value,
		session_token: Option<&'a SessionToken>,
		language: &'a Language,
	) -> HandlerFuture<'a>;
}

/// Failure raised from [`ApiHandler::execute`].
#[derive(Debug, ThisError)]
pub enum HandlerError {
	/// Respond with this status and an empty body.
	#[error("Handler requested status {0}.")]
	Status(StatusCode),
	/// Unexpected failure; logged and answered with a bare 500.
	#[error("Handler failed.")]
	Internal(#[source] BoxError),
}
impl HandlerError {
	/// Builds a [`HandlerError::Status`].
	pub fn status(status: StatusCode) -> Self {
		Self::Status(status)
	}

	/// Wraps any error as [`HandlerError::Internal`].
	pub fn internal(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Internal(Box::new(src))
	}
}
