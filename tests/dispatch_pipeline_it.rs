// crates.io
use http::{
	Request, Response, StatusCode,
	header::{
		ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
		ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS,
		ACCESS_CONTROL_MAX_AGE, AUTHORIZATION, CONTENT_TYPE, ORIGIN,
	},
};
use time::macros;
// self
use api_dispatcher::{
	_preludet::*,
	auth::{Language, SessionToken},
	dispatch::{Dispatcher, Lossy},
	handler::{ApiHandler, HandlerError, HandlerFuture, HandlerRegistry},
};

const NOW: OffsetDateTime = macros::datetime!(2025-06-01 12:00 UTC);

/// Handler that always answers with a fixed status.
struct ConflictHandler;
impl ApiHandler for ConflictHandler {
	fn requires_authentication(&self) -> bool {
		false
	}

	fn validate_request(&self, _request: &Value) -> bool {
		true
	}

	fn execute<'a>(
		&'a self,
		_request: &'a Value,
		_session_token: Option<&'a SessionToken>,
		_language: &'a Language,
	) -> HandlerFuture<'a> {
		Box::pin(async { Err(HandlerError::status(StatusCode::CONFLICT)) })
	}
}

/// Handler returning text decoded from raw, partially invalid bytes.
struct LegacyTextHandler;
impl ApiHandler for LegacyTextHandler {
	fn requires_authentication(&self) -> bool {
		false
	}

	fn validate_request(&self, _request: &Value) -> bool {
		true
	}

	fn execute<'a>(
		&'a self,
		_request: &'a Value,
		_session_token: Option<&'a SessionToken>,
		_language: &'a Language,
	) -> HandlerFuture<'a> {
		Box::pin(async { Ok(serde_json::json!({ "name": Lossy(b"Caf\xE9 M\xC3\xBCller") })) })
	}
}

fn dispatcher(requires_authentication: bool) -> (Dispatcher, Arc<HandlerCalls>) {
	let calls = Arc::new(HandlerCalls::default());
	let handler_calls = calls.clone();
	let registry = HandlerRegistry::new()
		.with_handler(method("Echo"), move || {
			EchoHandler::new(requires_authentication, handler_calls.clone())
		})
		.with_handler(method("Conflict"), || ConflictHandler)
		.with_handler(method("LegacyText"), || LegacyTextHandler);

	(Dispatcher::new(test_config(), registry), calls)
}

fn body_json(response: &Response<Vec<u8>>) -> Value {
	serde_json::from_slice(response.body()).expect("Response body should be JSON.")
}

#[tokio::test]
async fn preflight_short_circuits_and_is_idempotent() {
	let (dispatcher, calls) = dispatcher(true);
	let preflight = || {
		Request::options("/api")
			.header(ORIGIN, "https://app.example.com")
			.header("X-API-Method", "Echo")
			.body(Vec::new())
			.expect("Preflight fixture should build.")
	};
	let first = dispatcher.dispatch_at(&preflight(), NOW).await;
	let second = dispatcher.dispatch_at(&preflight(), NOW).await;

	assert_eq!(first.status(), StatusCode::NO_CONTENT);
	assert!(first.body().is_empty());
	assert_eq!(
		first.headers()[ACCESS_CONTROL_ALLOW_HEADERS],
		"Content-Type, Authorization, X-API-Method, X-UI-Language"
	);
	assert_eq!(first.headers()[ACCESS_CONTROL_ALLOW_METHODS], "POST");
	assert_eq!(first.headers()[ACCESS_CONTROL_MAX_AGE], "1800");
	assert_eq!(first.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
	assert_eq!(first.headers()[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
	assert!(!first.headers().contains_key(ACCESS_CONTROL_EXPOSE_HEADERS));
	assert_eq!(first.headers(), second.headers());
	assert_eq!(calls.constructed(), 0, "Preflight must not construct handlers.");
	assert_eq!(dispatcher.metrics.preflights(), 2);
	assert_eq!(dispatcher.metrics.attempts(), 0);
}

#[tokio::test]
async fn only_post_is_accepted() {
	let (dispatcher, calls) = dispatcher(false);
	let request = Request::get("/api")
		.header("X-API-Method", "Echo")
		.body(Vec::new())
		.expect("Request fixture should build.");
	let response = dispatcher.dispatch_at(&request, NOW).await;

	assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
	assert!(response.body().is_empty());
	assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
	assert_eq!(calls.constructed(), 0);
}

#[tokio::test]
async fn method_resolution_failures_explain_themselves() {
	let (dispatcher, calls) = dispatcher(false);
	let missing = Request::post("/api").body(Vec::new()).expect("Request fixture should build.");
	let response = dispatcher.dispatch_at(&missing, NOW).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(response.body().as_slice(), b"No API method set.");

	let unknown = post("DropTables").body(Vec::new()).expect("Request fixture should build.");
	let response = dispatcher.dispatch_at(&unknown, NOW).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(response.body().as_slice(), b"Unsupported API method.");
	assert_eq!(calls.constructed(), 0, "Unresolved methods must not construct handlers.");
	assert_eq!(dispatcher.metrics.rejections(), 2);
}

#[tokio::test]
async fn anonymous_call_reaches_the_handler() {
	let (dispatcher, calls) = dispatcher(false);
	let token = issue_token(3, NOW + Duration::minutes(10));
	let request = post("Echo")
		.header("X-UI-Language", "de")
		.header(ORIGIN, "https://elsewhere.example")
		.header(AUTHORIZATION, bearer(&token))
		.body(br#"{"page":2}"#.to_vec())
		.expect("Request fixture should build.");
	let response = dispatcher.dispatch_at(&request, NOW).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
	assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
	assert_eq!(response.headers()[ACCESS_CONTROL_EXPOSE_HEADERS], "x-refreshed-token");
	assert_eq!(
		body_json(&response),
		serde_json::json!({ "request": { "page": 2 }, "language": "de", "userId": null }),
		"Handlers without an auth requirement never see a token."
	);
	assert_eq!((calls.constructed(), calls.validated(), calls.executed()), (1, 1, 1));
	assert_eq!(dispatcher.metrics.successes(), 1);
}

#[tokio::test]
async fn unsupported_languages_fall_back() {
	let (dispatcher, _) = dispatcher(false);

	for (header, expected) in [(Some("fr"), "fr"), (Some("tlh"), "en"), (None, "en")] {
		let mut builder = post("Echo");

		if let Some(language) = header {
			builder = builder.header("X-UI-Language", language);
		}

		let request = builder.body(Vec::new()).expect("Request fixture should build.");
		let response = dispatcher.dispatch_at(&request, NOW).await;

		assert_eq!(body_json(&response)["language"], expected);
	}
}

#[tokio::test]
async fn body_decoding_rules() {
	let (dispatcher, calls) = dispatcher(false);
	let empty = post("Echo").body(Vec::new()).expect("Request fixture should build.");

	assert_eq!(
		body_json(&dispatcher.dispatch_at(&empty, NOW).await)["request"],
		serde_json::json!({})
	);

	let form = Request::post("/api")
		.header("X-API-Method", "Echo")
		.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(b"page=2".to_vec())
		.expect("Request fixture should build.");

	assert_eq!(
		body_json(&dispatcher.dispatch_at(&form, NOW).await)["request"],
		serde_json::json!({})
	);

	let charset = Request::post("/api")
		.header("X-API-Method", "Echo")
		.header(CONTENT_TYPE, "application/json; charset=utf-8")
		.body(br#"{"page":3}"#.to_vec())
		.expect("Request fixture should build.");

	assert_eq!(body_json(&dispatcher.dispatch_at(&charset, NOW).await)["request"]["page"], 3);

	let executed = calls.executed();
	let malformed =
		post("Echo").body(b"{\"page\":".to_vec()).expect("Request fixture should build.");
	let response = dispatcher.dispatch_at(&malformed, NOW).await;

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert!(response.body().is_empty(), "Parser details must not leak.");
	assert_eq!(calls.executed(), executed);
	assert_eq!(dispatcher.metrics.failures(), 1);
}

#[tokio::test]
async fn handler_status_errors_have_empty_bodies() {
	let (dispatcher, _) = dispatcher(false);
	let request = post("Conflict").body(Vec::new()).expect("Request fixture should build.");
	let response = dispatcher.dispatch_at(&request, NOW).await;

	assert_eq!(response.status(), StatusCode::CONFLICT);
	assert!(response.body().is_empty());
}

#[tokio::test]
async fn invalid_text_is_substituted_not_fatal() {
	let (dispatcher, _) = dispatcher(false);
	let request = post("LegacyText").body(Vec::new()).expect("Request fixture should build.");
	let response = dispatcher.dispatch_at(&request, NOW).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(&response)["name"], "Caf\u{FFFD} Müller");
}

#[tokio::test]
async fn failed_validation_is_a_bare_bad_request() {
	let calls = Arc::new(HandlerCalls::default());
	let handler_calls = calls.clone();
	let registry = HandlerRegistry::new().with_handler(method("Strict"), move || {
		EchoHandler::new(false, handler_calls.clone()).rejecting()
	});
	let dispatcher = Dispatcher::new(test_config(), registry);
	let request = post("Strict").body(b"{}".to_vec()).expect("Request fixture should build.");
	let response = dispatcher.dispatch_at(&request, NOW).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert!(response.body().is_empty());
	assert_eq!((calls.validated(), calls.executed()), (1, 0));
}

#[tokio::test]
async fn wall_clock_dispatch_accepts_fresh_tokens() {
	let (dispatcher, calls) = dispatcher(true);
	let token = issue_token(8, OffsetDateTime::now_utc() + Duration::minutes(10));
	let request = post("Echo")
		.header(AUTHORIZATION, bearer(&token))
		.body(Vec::new())
		.expect("Request fixture should build.");
	let response = dispatcher.dispatch(&request).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_json(&response)["userId"], 8);
	assert_eq!(calls.executed(), 1);
}
