//! Session/role gate.
//!
//! Runs before any wizard logic and consults only the session, never wizard
//! data.

use crate::error::CoreError;
use crate::roles::{Role, ROLE_ADMIN, ROLE_EMPLOYER, ROLE_JOB_SEEKER};
use crate::types::DbId;

use super::steps::{HOME_ROUTE, SIGN_IN_ROUTE};

/// The authenticated user behind a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: DbId,
}

/// Who is calling, by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    JobSeeker(SessionUser),
    Employer(SessionUser),
    Admin(SessionUser),
    Unauthenticated,
}

impl Session {
    /// Build a session from verified token claims.
    ///
    /// A role name this service does not know yields `Unauthenticated`.
    pub fn from_claims(user_id: DbId, role: &str) -> Self {
        let user = SessionUser { user_id };
        match role {
            ROLE_JOB_SEEKER => Self::JobSeeker(user),
            ROLE_EMPLOYER => Self::Employer(user),
            ROLE_ADMIN => Self::Admin(user),
            other => {
                tracing::warn!(user_id, role = other, "Session carries an unknown role");
                Self::Unauthenticated
            }
        }
    }

    pub fn user_id(&self) -> Option<DbId> {
        match self {
            Self::JobSeeker(u) | Self::Employer(u) | Self::Admin(u) => Some(u.user_id),
            Self::Unauthenticated => None,
        }
    }
}

/// Outcome of the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Authorized(SessionUser),
    /// Send the user to sign in, returning to the originating page after.
    Unauthenticated { redirect_to: String },
    /// Send the user home.
    WrongRole { redirect_to: String },
}

impl Authorization {
    /// Turn a redirect outcome into the matching error.
    pub fn into_result(self) -> Result<SessionUser, CoreError> {
        match self {
            Self::Authorized(user) => Ok(user),
            Self::Unauthenticated { redirect_to } => Err(CoreError::Unauthorized { redirect_to }),
            Self::WrongRole { redirect_to } => Err(CoreError::Forbidden { redirect_to }),
        }
    }
}

/// Sign-in route with `callback` as the post-login destination.
pub fn sign_in_url(callback: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(callback.as_bytes()).collect();
    format!("{SIGN_IN_ROUTE}?callbackUrl={encoded}")
}

/// Admit `session` to a wizard of role `expected`.
///
/// `origin` is the page route the request came from; unauthenticated callers
/// are sent back there after signing in.
pub fn authorize(session: &Session, expected: Role, origin: &str) -> Authorization {
    let (user, actual) = match *session {
        Session::Unauthenticated => {
            return Authorization::Unauthenticated {
                redirect_to: sign_in_url(origin),
            }
        }
        Session::JobSeeker(user) => (user, Some(Role::JobSeeker)),
        Session::Employer(user) => (user, Some(Role::Employer)),
        Session::Admin(user) => (user, None),
    };

    if actual == Some(expected) {
        Authorization::Authorized(user)
    } else {
        tracing::debug!(
            user_id = user.user_id,
            expected = %expected,
            "Wizard access denied for role"
        );
        Authorization::WrongRole {
            redirect_to: HOME_ROUTE.to_string(),
        }
    }
}
