use crate::onboarding::validation::FieldErrors;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A wizard step id or route segment the role's registry does not define.
    #[error("Unknown onboarding step '{0}'")]
    UnknownStep(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Field-level validation failure, rendered inline next to each field.
    #[error("Validation failed for {} field(s)", .0.len())]
    ValidationFailed(FieldErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// No usable session. `redirect_to` is the sign-in URL with a callback.
    #[error("Unauthorized: sign in required")]
    Unauthorized { redirect_to: String },

    /// Authenticated, but not with the role the resource requires.
    #[error("Forbidden: wrong role")]
    Forbidden { redirect_to: String },

    /// Final submission attempted while a required step is incomplete.
    #[error("Required step {step} is incomplete")]
    CompletionPreconditionFailed { step: u8, redirect_to: String },

    /// A write to the profile store failed. Safe to retry with the same data.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the caller may resubmit the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}
