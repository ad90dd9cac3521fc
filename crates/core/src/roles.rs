//! Well-known role names and the typed [`Role`] they map to.
//!
//! The string constants must match the `role` claim issued by the auth
//! provider and the `role` column of the `profiles` table.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_JOB_SEEKER: &str = "job_seeker";
pub const ROLE_EMPLOYER: &str = "employer";
pub const ROLE_ADMIN: &str = "admin";

/// A role that owns an onboarding wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    JobSeeker,
    Employer,
}

impl Role {
    /// Parse a role string from the database or a token claim.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            ROLE_JOB_SEEKER => Ok(Self::JobSeeker),
            ROLE_EMPLOYER => Ok(Self::Employer),
            _ => Err(CoreError::Validation(format!(
                "Invalid role '{s}'. Must be one of: {ROLE_JOB_SEEKER}, {ROLE_EMPLOYER}"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JobSeeker => ROLE_JOB_SEEKER,
            Self::Employer => ROLE_EMPLOYER,
        }
    }

    /// Parse the kebab-case path segment used in URLs (`job-seeker`, `employer`).
    pub fn from_path_segment(s: &str) -> Option<Self> {
        match s {
            "job-seeker" => Some(Self::JobSeeker),
            "employer" => Some(Self::Employer),
            _ => None,
        }
    }

    /// The kebab-case path segment used in URLs.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::JobSeeker => "job-seeker",
            Self::Employer => "employer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
