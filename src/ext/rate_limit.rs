//! Rate-limit policy contracts consulted after authentication and before request validation.

pub mod memory;

pub use memory::*;

// self
use crate::{
	_prelude::*,
	auth::{MethodName, UserId},
	ext::CollaboratorFuture,
	handler::ApiHandler,
};

/// Strategy deciding whether a call may proceed right now.
///
/// Denials short-circuit the pipeline with `429 Too Many Requests` before any handler-specific
/// validation or execution runs.
pub trait RateLimitPolicy
where
	Self: Send + Sync,
{
	/// Returns `Ok(true)` when the call is within budget.
	fn check<'a>(&'a self, context: &'a RateLimitContext<'a>) -> CollaboratorFuture<'a, bool>;
}

/// Everything a [`RateLimitPolicy`] may scope its decision by.
#[derive(Clone, Copy)]
pub struct RateLimitContext<'a> {
	/// Registry key of the handler being called.
	pub method: &'a MethodName,
	/// Handler instance constructed for this request.
	pub handler: &'a dyn ApiHandler,
	/// Decoded request payload.
	pub request: &'a Value,
	/// Authenticated identity; `None` for anonymous calls.
	pub identity: Option<UserId>,
	/// Instant the dispatcher observed before invoking the policy.
	pub observed_at: OffsetDateTime,
}
impl Debug for RateLimitContext<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimitContext")
			.field("method", self.method)
			.field("requires_authentication", &self.handler.requires_authentication())
			.field("identity", &self.identity)
			.field("observed_at", &self.observed_at)
			.finish()
	}
}

/// Policy that never limits; used when no policy is registered.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;
impl RateLimitPolicy for AllowAll {
	fn check<'a>(&'a self, _context: &'a RateLimitContext<'a>) -> CollaboratorFuture<'a, bool> {
		Box::pin(async { Ok(true) })
	}
}
