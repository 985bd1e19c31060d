//! Response encoding for successful calls and normalized failures.

// crates.io
use http::{HeaderValue, Response, header::CONTENT_TYPE};
use serde::Serializer;
// self
use crate::{_prelude::*, error::DispatchError, obs};

/// Decodes bytes as UTF-8, replacing invalid sequences with U+FFFD.
pub fn lossy_text(bytes: &[u8]) -> String {
	String::from_utf8_lossy(bytes).into_owned()
}

/// Serializes raw bytes as a JSON string via [`lossy_text`].
///
/// Handlers returning text from byte-oriented sources wrap it in `Lossy` so that encoding
/// problems never fail the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lossy<'a>(pub &'a [u8]);
impl Serialize for Lossy<'_> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&lossy_text(self.0))
	}
}

/// Encodes a handler result as a `200 application/json` response.
pub(crate) fn json(result: &Value) -> Result<Response<Vec<u8>>, DispatchError> {
	let body = serde_json::to_vec(result).map_err(DispatchError::internal)?;
	let mut response = Response::new(body);

	response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

	Ok(response)
}

/// Maps a failure to its status; only method-resolution failures carry a body.
pub(crate) fn from_error(error: &DispatchError) -> Response<Vec<u8>> {
	if matches!(error, DispatchError::Internal(_)) {
		obs::internal_failure(error);
	}

	let mut response = match error.public_body() {
		Some(reason) => {
			let mut response = Response::new(reason.as_bytes().to_vec());

			response
				.headers_mut()
				.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));

			response
		},
		None => Response::new(Vec::new()),
	};

	*response.status_mut() = error.status();

	response
}
