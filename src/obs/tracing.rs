// self
use crate::{
	_prelude::*,
	auth::{RefreshToken, UserId},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedDispatch<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedDispatch<F> = F;

/// A span builder used by the dispatcher.
#[derive(Clone, Debug)]
pub struct DispatchSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl DispatchSpan {
	/// Creates a new span tagged with the requested method + stage.
	pub fn new(method: &str, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("api_dispatcher.dispatch", method, stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, stage);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> DispatchSpanGuard {
		#[cfg(feature = "tracing")]
		{
			DispatchSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			DispatchSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedDispatch<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`DispatchSpan::entered`].
pub struct DispatchSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for DispatchSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("DispatchSpanGuard(..)")
	}
}

/// Logs why a credential was refused; the client only ever sees `401`.
pub(crate) fn auth_rejected(reason: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(%reason, "authentication rejected");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}

/// Logs a refresh-cookie fallback attempt by fingerprint.
pub(crate) fn refresh_cookie_presented(user_id: UserId, cookie: &RefreshToken) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			%user_id,
			fingerprint = %cookie.fingerprint(),
			"expired session token presented with refresh cookie"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (user_id, cookie);
	}
}

/// Logs a proactive session token renewal.
pub(crate) fn session_token_refreshed(user_id: UserId, expires: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(%user_id, %expires, "session token refreshed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (user_id, expires);
	}
}

/// Logs a failure that is answered with a bare `500`.
pub(crate) fn internal_failure(error: &(dyn StdError + 'static)) {
	#[cfg(feature = "tracing")]
	{
		let mut chain = error.to_string();
		let mut source = error.source();

		while let Some(cause) = source {
			chain.push_str(": ");
			chain.push_str(&cause.to_string());

			source = cause.source();
		}

		tracing::error!(error = %chain, "dispatch failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}
