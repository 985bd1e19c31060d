//! Dispatcher-level error types shared by configuration, token codecs, collaborators, and the
//! request pipeline.

// crates.io
use http::StatusCode;
// self
use crate::{_prelude::*, auth::IdentifierError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Session token could not be decoded or signed.
	#[error(transparent)]
	Token(#[from] crate::auth::TokenError),
	/// An external collaborator failed.
	#[error(transparent)]
	Collaborator(#[from] CollaboratorError),
	/// A dispatch terminated in a non-success state.
	#[error(transparent)]
	Dispatch(#[from] DispatchError),
}

/// Configuration and validation failures raised while building a dispatcher.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configuration document could not be parsed.
	#[error("Configuration is invalid at `{path}`.")]
	Parse {
		/// Path to the offending field.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// No supported UI language was configured.
	#[error("At least one supported language must be configured.")]
	NoLanguages,
	/// A language tag failed identifier validation.
	#[error(transparent)]
	InvalidLanguage(#[from] IdentifierError),
	/// The fallback language is not part of the supported set.
	#[error("Fallback language `{language}` is not among the supported languages.")]
	UnsupportedFallbackLanguage {
		/// Configured fallback language.
		language: String,
	},
	/// A duration that must be positive was zero or negative.
	#[error("The {field} must be positive.")]
	NonPositiveDuration {
		/// Configuration field name.
		field: &'static str,
	},
	/// A duration is not expressed in whole seconds.
	#[error("The {field} must be a whole number of seconds.")]
	FractionalDuration {
		/// Configuration field name.
		field: &'static str,
	},
	/// A duration exceeds the longest value the dispatcher can schedule against.
	#[error("The {field} cannot exceed {max}.")]
	DurationTooLong {
		/// Configuration field name.
		field: &'static str,
		/// Longest accepted value.
		max: Duration,
	},
	/// The proactive refresh interval does not leave room inside the token lifetime.
	#[error("Session token refresh interval must be shorter than the session token lifetime.")]
	RefreshIntervalTooLong,
	/// An allow-with-credentials origin cannot be parsed.
	#[error("Origin `{origin}` is not a valid URL.")]
	InvalidOrigin {
		/// Origin as configured.
		origin: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// An allow-with-credentials origin has no scheme/host/port tuple.
	#[error("Origin `{origin}` does not identify a scheme, host, and port.")]
	OpaqueOrigin {
		/// Origin as configured.
		origin: String,
	},
	/// The session token signing key is empty.
	#[error("Session token signing key cannot be empty.")]
	EmptySigningKey,
}
impl ConfigError {
	pub(crate) fn parse(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = err.path().to_string();

		Self::Parse { path, source: err.into_inner() }
	}
}

/// Failures reported by external collaborators (validity stores, rate-limit backends).
#[derive(Debug, ThisError)]
pub enum CollaboratorError {
	/// Backend-level failure described by a message.
	#[error("Collaborator backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// Failure carrying the collaborator's own error type.
	#[error("Collaborator failed.")]
	Other {
		/// Underlying failure.
		#[source]
		source: BoxError,
	},
}
impl CollaboratorError {
	/// Builds a [`CollaboratorError::Backend`] from a message.
	pub fn backend(message: impl Into<String>) -> Self {
		Self::Backend { message: message.into() }
	}

	/// Wraps a collaborator-specific error.
	pub fn other(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Other { source: Box::new(src) }
	}
}

/// Terminal non-success outcome of a dispatch.
///
/// Classified variants carry their HTTP status. [`DispatchError::Internal`] keeps the full
/// failure for server-side logs while the client only ever sees a bare 500.
#[derive(Debug, ThisError)]
pub enum DispatchError {
	/// The request used a verb other than `POST`.
	#[error("Only POST requests are accepted.")]
	MethodNotAllowed,
	/// Missing or unknown method identifier, or a payload the handler rejected.
	#[error("Request was rejected as malformed.")]
	BadRequest {
		/// Short plain-text reason returned to the client, if any.
		reason: Option<&'static str>,
	},
	/// No trustworthy credential accompanied the request.
	#[error("Request is not authenticated.")]
	Unauthorized,
	/// The rate-limit policy denied the call.
	#[error("Rate limit exceeded.")]
	TooManyRequests,
	/// A handler raised an explicit HTTP status.
	#[error("Handler responded with status {0}.")]
	Status(StatusCode),
	/// Any unclassified failure.
	#[error("Dispatch failed unexpectedly.")]
	Internal(#[source] BoxError),
}
impl DispatchError {
	/// Body returned when no `X-API-Method` header is present.
	pub const MISSING_METHOD: &'static str = "No API method set.";
	/// Body returned when `X-API-Method` names no registered handler.
	pub const UNSUPPORTED_METHOD: &'static str = "Unsupported API method.";

	/// Wraps any error as [`DispatchError::Internal`].
	pub fn internal(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Internal(Box::new(src))
	}

	/// HTTP status the failure maps to.
	pub fn status(&self) -> StatusCode {
		match self {
			Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
			Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
			Self::Unauthorized => StatusCode::UNAUTHORIZED,
			Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
			Self::Status(status) => *status,
			Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Plain-text body safe to return to the client.
	pub fn public_body(&self) -> Option<&'static str> {
		match self {
			Self::BadRequest { reason } => *reason,
			_ => None,
		}
	}
}
impl From<CollaboratorError> for DispatchError {
	fn from(e: CollaboratorError) -> Self {
		Self::internal(e)
	}
}
impl From<crate::handler::HandlerError> for DispatchError {
	fn from(e: crate::handler::HandlerError) -> Self {
		match e {
			crate::handler::HandlerError::Status(status) => Self::Status(status),
			crate::handler::HandlerError::Internal(source) => Self::Internal(source),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn classified_failures_map_to_their_status() {
		assert_eq!(DispatchError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
		assert_eq!(DispatchError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(DispatchError::TooManyRequests.status(), StatusCode::TOO_MANY_REQUESTS);
		assert_eq!(
			DispatchError::Status(StatusCode::CONFLICT).status(),
			StatusCode::CONFLICT
		);
		assert_eq!(
			DispatchError::BadRequest { reason: None }.status(),
			StatusCode::BAD_REQUEST
		);
	}

	#[test]
	fn only_method_resolution_failures_expose_a_body() {
		let missing = DispatchError::BadRequest { reason: Some(DispatchError::MISSING_METHOD) };

		assert_eq!(missing.public_body(), Some("No API method set."));
		assert_eq!(DispatchError::BadRequest { reason: None }.public_body(), None);
		assert_eq!(DispatchError::Unauthorized.public_body(), None);

		let internal = DispatchError::from(CollaboratorError::backend("store offline"));

		assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(internal.public_body(), None);
	}

	#[test]
	fn collaborator_failure_keeps_its_source() {
		let err = DispatchError::from(CollaboratorError::backend("store offline"));
		let source = StdError::source(&err).expect("Internal failures should expose a source.");

		assert!(source.to_string().contains("store offline"));
	}
}
