//! Request extractors.
//!
//! - [`session::CurrentSession`] -- The caller's session, decoded from a JWT
//!   Bearer token. Never rejects; a missing or bad token is an
//!   unauthenticated session.

pub mod session;
