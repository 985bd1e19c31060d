//! Collaborator contracts consulted by the dispatcher (session validity, refresh tokens, rate
//! limiting).
//!
//! The dispatcher owns no user database and no rate-limit storage. Each concern is a trait
//! whose implementation the embedding service provides; the crate ships only
//! [`AllowAll`] and the in-process [`MemoryRateLimiter`].

pub mod rate_limit;
pub mod refresh_token;
pub mod session;

pub use rate_limit::*;
pub use refresh_token::*;
pub use session::*;

// self
use crate::{_prelude::*, error::CollaboratorError};

/// Boxed future returned by every collaborator call.
pub type CollaboratorFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, CollaboratorError>> + 'a + Send>>;
