//! Session validity contract consulted for fresh bearer tokens.

// self
use crate::{auth::SessionToken, ext::CollaboratorFuture};

/// Decides whether an authentic, unexpired session token may still be used (e.g. the user has
/// not been revoked or logged out everywhere).
///
/// When no validator is registered every authentic, unexpired token is accepted.
pub trait SessionTokenValidator
where
	Self: Send + Sync,
{
	/// Returns `Ok(false)` to reject the token.
	fn validate_session_token<'a>(
		&'a self,
		token: &'a SessionToken,
	) -> CollaboratorFuture<'a, bool>;
}
