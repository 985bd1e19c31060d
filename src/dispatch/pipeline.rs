// crates.io
use http::{HeaderName, HeaderValue, Method, Request, Response};
// self
use crate::{
	_prelude::*,
	auth::{Language, MethodName, SessionToken},
	dispatch::{Dispatcher, cors, cors::OriginPolicy, request, response},
	error::DispatchError,
	ext::RateLimitContext,
	obs::{self, DispatchOutcome, DispatchSpan},
};

/// Per-request scratch state; never shared between dispatches.
#[derive(Debug)]
struct DispatchContext<'a> {
	method: &'a MethodName,
	language: Language,
	session_token: Option<SessionToken>,
	observed_at: OffsetDateTime,
}

impl Dispatcher {
	/// Dispatches one API call using the current wall clock.
	///
	/// Never fails: every outcome, including internal failures, is encoded as a response.
	pub async fn dispatch<B>(&self, request: &Request<B>) -> Response<Vec<u8>>
	where
		B: AsRef<[u8]>,
	{
		self.dispatch_at(request, OffsetDateTime::now_utc()).await
	}

	/// Dispatches one API call as of `now`.
	///
	/// `now` is the single instant used for expiry checks, refresh decisions, and rate-limit
	/// windows within this call.
	pub async fn dispatch_at<B>(
		&self,
		request: &Request<B>,
		now: OffsetDateTime,
	) -> Response<Vec<u8>>
	where
		B: AsRef<[u8]>,
	{
		let origin = OriginPolicy::resolve(&self.config, request.headers());

		if request.method() == Method::OPTIONS {
			let mut response = cors::preflight(self.config.preflight_max_age);

			origin.apply(response.headers_mut());
			self.record(DispatchOutcome::Preflight);

			return response;
		}

		self.metrics.record_attempt();

		let method =
			request::header_text(request.headers(), request::API_METHOD_HEADER).unwrap_or_default();
		let span = DispatchSpan::new(method, "dispatch");
		let mut refreshed = None;
		let mut response = match span.instrument(self.run(request, now, &mut refreshed)).await {
			Ok(response) => response,
			Err(e) => response::from_error(&e),
		};

		// A renewal issued before the handler failed still reaches the client.
		if let Some(value) = refreshed {
			response
				.headers_mut()
				.insert(HeaderName::from_static(request::REFRESHED_TOKEN_HEADER), value);
		}

		origin.apply(response.headers_mut());
		cors::expose_refreshed_token(response.headers_mut());
		self.record(DispatchOutcome::from_status(response.status()));

		response
	}

	async fn run<B>(
		&self,
		request: &Request<B>,
		now: OffsetDateTime,
		refreshed: &mut Option<HeaderValue>,
	) -> Result<Response<Vec<u8>>, DispatchError>
	where
		B: AsRef<[u8]>,
	{
		if request.method() != Method::POST {
			return Err(DispatchError::MethodNotAllowed);
		}

		let headers = request.headers();
		let requested = request::header_text(headers, request::API_METHOD_HEADER)
			.ok_or(DispatchError::BadRequest { reason: Some(DispatchError::MISSING_METHOD) })?;
		let (method, factory) = self
			.registry
			.resolve(requested)
			.ok_or(DispatchError::BadRequest { reason: Some(DispatchError::UNSUPPORTED_METHOD) })?;
		let requested_language = request::header_text(headers, request::UI_LANGUAGE_HEADER);
		let language = self.config.resolve_language(requested_language);
		let payload = request::decode_body(headers, request.body().as_ref())?;
		let handler = factory();
		let mut context =
			DispatchContext { method, language, session_token: None, observed_at: now };

		if handler.requires_authentication() {
			context.session_token = Some(self.resolver.resolve(headers, now).await?);
		}

		let limit = RateLimitContext {
			method: context.method,
			handler: handler.as_ref(),
			request: &payload,
			identity: context.session_token.as_ref().map(SessionToken::user_id),
			observed_at: context.observed_at,
		};

		if !self.rate_limiter.check(&limit).await? {
			return Err(DispatchError::TooManyRequests);
		}
		if !handler.validate_request(&payload) {
			return Err(DispatchError::BadRequest { reason: None });
		}

		if self.refresh_if_due(&mut context).await?
			&& let Some(token) = &context.session_token
		{
			*refreshed =
				Some(HeaderValue::from_str(token.encode()).map_err(DispatchError::internal)?);
		}

		let result = handler
			.execute(&payload, context.session_token.as_ref(), &context.language)
			.await?;

		response::json(&result)
	}

	/// Renews the session token in place once it is older than the refresh interval and the
	/// refresh-token collaborator allows it.
	async fn refresh_if_due(
		&self,
		context: &mut DispatchContext<'_>,
	) -> Result<bool, DispatchError> {
		let (Some(token), Some(handler)) =
			(context.session_token.as_mut(), self.resolver.refresh_handler())
		else {
			return Ok(false);
		};

		let due = self
			.config
			.is_refresh_due(token.expires(), context.observed_at)
			.map_err(DispatchError::internal)?;

		if !due
			|| !handler.may_refresh_session_token(token.user_id()).await?
		{
			return Ok(false);
		}

		token
			.refresh(context.observed_at, self.config.session_token_lifetime)
			.map_err(DispatchError::internal)?;
		obs::session_token_refreshed(token.user_id(), token.expires());

		Ok(true)
	}

	fn record(&self, outcome: DispatchOutcome) {
		self.metrics.record(outcome);
		obs::record_dispatch_outcome(outcome);
	}
}
