//! Session extractor for Axum handlers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use temu_core::onboarding::Session;

use crate::auth::jwt::validate_token;
use crate::state::AppState;

/// The caller's [`Session`].
///
/// Wizard endpoints decide what an unauthenticated caller sees (a sign-in
/// redirect back to the page they came from), so extraction never fails:
///
/// ```ignore
/// async fn my_handler(CurrentSession(session): CurrentSession) -> AppResult<Json<()>> {
///     let user = authorize(&session, Role::Employer, "/employer/onboarding").into_result()?;
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CurrentSession(pub Session);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
        else {
            return Ok(Self(Session::Unauthenticated));
        };

        match validate_token(token, &state.config.jwt) {
            Ok(claims) => Ok(Self(claims.session())),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                Ok(Self(Session::Unauthenticated))
            }
        }
    }
}
