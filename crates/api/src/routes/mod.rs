pub mod health;
pub mod onboarding;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy (`{role}` is `job-seeker` or `employer`):
///
/// ```text
/// /{role}/check-onboarding                         onboarding status
/// /{role}/onboarding/progress                      saved data and position
/// /{role}/onboarding/steps                         step registry
/// /{role}/onboarding/entry                         page-entry decision (?page=)
/// /{role}/onboarding/steps/{segment}               submit a step (POST)
/// /{role}/onboarding/back/{segment}                previous page (POST)
/// /{role}/onboarding/submit                        finish onboarding (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(onboarding::router())
}
