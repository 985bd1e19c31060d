//! Auth-domain identifiers, redacted secrets, session tokens, and the bearer resolver.

pub mod id;
pub mod resolver;
pub mod secret;
pub mod token;

pub use id::*;
pub use resolver::*;
pub use secret::*;
pub use token::*;
