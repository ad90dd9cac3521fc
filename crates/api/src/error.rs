use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Map, Value};
use temu_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses of
/// the form `{ "error", "code", ... }`; redirects add `redirectTo`, field
/// validation adds `fieldErrors`, unsaved form input adds `draft`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `temu_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A path that names no known resource (e.g. an unknown role segment).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Another write for the same wizard is still pending.
    #[error("A save for this wizard is already in progress")]
    SaveInProgress,

    /// A step save that failed with form input the wizard still holds.
    #[error("{source}")]
    WithDraft {
        source: Box<AppError>,
        draft: Map<String, Value>,
    },
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Echo `draft` back with this error so the form can be restored.
    pub fn with_draft(self, draft: Map<String, Value>) -> Self {
        AppError::WithDraft {
            source: Box::new(self),
            draft,
        }
    }

    /// Status, code, message and extra body fields.
    fn parts(&self) -> (StatusCode, &'static str, String, Map<String, Value>) {
        let mut extra = Map::new();

        let (status, code, message) = match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::UnknownStep(step) => (
                    StatusCode::NOT_FOUND,
                    "UNKNOWN_STEP",
                    format!("Unknown onboarding step '{step}'"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::ValidationFailed(field_errors) => {
                    extra.insert("fieldErrors".into(), json!(field_errors));
                    (
                        StatusCode::BAD_REQUEST,
                        "VALIDATION_FAILED",
                        "Please correct the highlighted fields".to_string(),
                    )
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized { redirect_to } => {
                    extra.insert("redirectTo".into(), json!(redirect_to));
                    (
                        StatusCode::UNAUTHORIZED,
                        "UNAUTHORIZED",
                        "Sign in to continue".to_string(),
                    )
                }
                CoreError::Forbidden { redirect_to } => {
                    extra.insert("redirectTo".into(), json!(redirect_to));
                    (
                        StatusCode::FORBIDDEN,
                        "FORBIDDEN",
                        "This onboarding is not available for your account".to_string(),
                    )
                }
                CoreError::CompletionPreconditionFailed { step, redirect_to } => {
                    extra.insert("redirectTo".into(), json!(redirect_to));
                    extra.insert("step".into(), json!(step));
                    (
                        StatusCode::CONFLICT,
                        "ONBOARDING_INCOMPLETE",
                        format!("Step {step} must be completed first"),
                    )
                }
                CoreError::Persistence(msg) => {
                    tracing::error!(error = %msg, "Profile store failure");
                    extra.insert("retryable".into(), Value::Bool(true));
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "PERSISTENCE_ERROR",
                        "Could not save your progress. Please try again".to_string(),
                    )
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::SaveInProgress => (
                StatusCode::CONFLICT,
                "SAVE_IN_PROGRESS",
                self.to_string(),
            ),
            AppError::WithDraft { source, draft } => {
                let (status, code, message, mut extra) = source.parts();
                extra.insert("draft".into(), Value::Object(draft.clone()));
                return (status, code, message, extra);
            }
        };

        (status, code, message, extra)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, extra) = self.parts();

        let mut body = Map::new();
        body.insert("error".into(), Value::String(message));
        body.insert("code".into(), Value::String(code.to_string()));
        body.extend(extra);

        (status, axum::Json(Value::Object(body))).into_response()
    }
}
