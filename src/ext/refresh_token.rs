//! Refresh-token contract backing both reactive and proactive session renewal.

// self
use crate::{
	auth::{RefreshToken, UserId},
	ext::CollaboratorFuture,
};

/// Owner of refresh-token storage.
///
/// The dispatcher consults it in two places:
///
/// - when a request carries an expired session token, to check the `refreshToken` cookie;
/// - when a still-valid token is old enough for sliding renewal, to confirm the user may
///   receive a fresh one.
///
/// Without a registered handler expired tokens are always rejected and no proactive renewal
/// takes place.
pub trait RefreshTokenHandler
where
	Self: Send + Sync,
{
	/// Checks `refresh_token` against the user the expired session token names.
	fn validate_refresh_token<'a>(
		&'a self,
		refresh_token: &'a RefreshToken,
		user_id: UserId,
	) -> CollaboratorFuture<'a, bool>;

	/// Confirms that `user_id` is still eligible for a renewed session token.
	fn may_refresh_session_token(&self, user_id: UserId) -> CollaboratorFuture<'_, bool>;
}
