//! Header, cookie, and body extraction for incoming API calls.

// crates.io
use http::{
	HeaderMap,
	header::{CONTENT_TYPE, COOKIE},
};
// self
use crate::{_prelude::*, error::DispatchError};

/// Header naming the API method to invoke.
pub const API_METHOD_HEADER: &str = "x-api-method";
/// Header naming the caller's preferred UI language.
pub const UI_LANGUAGE_HEADER: &str = "x-ui-language";
/// Response header carrying a renewed session token.
pub const REFRESHED_TOKEN_HEADER: &str = "x-refreshed-token";

const JSON_MEDIA_TYPE: &str = "application/json";

/// Returns a header as text; absent and non-visible-ASCII values both yield `None`.
pub(crate) fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|value| value.to_str().ok())
}

/// Looks a cookie up across every `Cookie` header.
///
/// Empty values count as absent.
pub(crate) fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(key, _)| key.trim() == name)
		.map(|(_, value)| value.trim().trim_matches('"'))
		.filter(|value| !value.is_empty())
}

/// Returns `true` when `Content-Type` names JSON, ignoring parameters and case.
pub(crate) fn is_json(headers: &HeaderMap) -> bool {
	header_text(headers, CONTENT_TYPE.as_str())
		.and_then(|value| value.split(';').next())
		.is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

/// Decodes the request payload.
///
/// Non-JSON content types and blank bodies decode to an empty object. Malformed JSON is an
/// internal failure.
pub(crate) fn decode_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, DispatchError> {
	if !is_json(headers) || body.iter().all(u8::is_ascii_whitespace) {
		return Ok(Value::Object(Default::default()));
	}

	serde_json::from_slice(body).map_err(DispatchError::internal)
}
