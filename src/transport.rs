//! Axum adapter exposing a [`Dispatcher`] as a single-endpoint router.
//!
//! The dispatcher routes on the `X-API-Method` header rather than the path, so the router
//! answers every path through its fallback.

// crates.io
use axum::{
	Router,
	body::{self, Body},
	extract::{Request, State},
	http::StatusCode,
	response::Response,
};
// self
use crate::{_prelude::*, dispatch::Dispatcher};

/// Largest request body read into memory.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Builds a router that hands every request to `dispatcher`.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
	Router::new().fallback(serve).with_state(dispatcher)
}

/// Buffers the body and dispatches the call.
///
/// Bodies over [`MAX_BODY_BYTES`] are answered with `413` before reaching the pipeline.
pub async fn serve(State(dispatcher): State<Arc<Dispatcher>>, request: Request) -> Response {
	let (parts, body) = request.into_parts();
	let Ok(bytes) = body::to_bytes(body, MAX_BODY_BYTES).await else {
		let mut response = Response::new(Body::empty());

		*response.status_mut() = StatusCode::PAYLOAD_TOO_LARGE;

		return response;
	};
	let request = http::Request::from_parts(parts, bytes);

	dispatcher.dispatch(&request).await.map(Body::from)
}
