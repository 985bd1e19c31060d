//! Cross-origin response headers.

// crates.io
use http::{
	HeaderMap, HeaderValue, Response, StatusCode,
	header::{
		ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
		ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS,
		ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
	},
};
// self
use crate::{_prelude::*, config::DispatcherConfig, dispatch::request::REFRESHED_TOKEN_HEADER};

/// Request headers a browser may send on API calls.
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-API-Method, X-UI-Language";
/// Verbs accepted by the API endpoint.
pub const ALLOWED_METHODS: &str = "POST";

/// Origin treatment decided once per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum OriginPolicy {
	/// The origin is allow-listed; echo it and permit credentials.
	Credentialed(HeaderValue),
	/// Any origin may read the response without credentials.
	Any,
}
impl OriginPolicy {
	pub(crate) fn resolve(config: &DispatcherConfig, headers: &HeaderMap) -> Self {
		match headers.get(ORIGIN) {
			Some(origin)
				if origin
					.to_str()
					.is_ok_and(|text| config.allows_credentials(&text.to_ascii_lowercase())) =>
				Self::Credentialed(origin.clone()),
			_ => Self::Any,
		}
	}

	pub(crate) fn apply(&self, headers: &mut HeaderMap) {
		match self {
			Self::Credentialed(origin) => {
				headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
				headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
			},
			Self::Any => {
				headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
			},
		}

		headers.insert(VARY, HeaderValue::from_static("Origin"));
	}
}

/// Builds the bodiless `204` answer to a CORS preflight.
pub(crate) fn preflight(max_age: Duration) -> Response<Vec<u8>> {
	let mut response = Response::new(Vec::new());
	let headers = response.headers_mut();

	headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));
	headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
	headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age.whole_seconds()));

	*response.status_mut() = StatusCode::NO_CONTENT;

	response
}

/// Lets browser code read the renewed token header.
pub(crate) fn expose_refreshed_token(headers: &mut HeaderMap) {
	headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static(REFRESHED_TOKEN_HEADER));
}
