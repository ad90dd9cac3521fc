//! Route definitions for the job seeker and employer onboarding wizards.
//!
//! Merged into `/api` by `api_routes()`.
//!
//! ```text
//! GET    /{role}/check-onboarding                  check_onboarding
//! GET    /{role}/onboarding/progress               get_progress
//! GET    /{role}/onboarding/steps                  list_steps
//! GET    /{role}/onboarding/entry                  resolve_entry (?page)
//! POST   /{role}/onboarding/steps/{segment}        submit_step
//! POST   /{role}/onboarding/back/{segment}         go_back
//! POST   /{role}/onboarding/submit                 submit_onboarding
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::onboarding;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{role}/check-onboarding", get(onboarding::check_onboarding))
        .route("/{role}/onboarding/progress", get(onboarding::get_progress))
        .route("/{role}/onboarding/steps", get(onboarding::list_steps))
        .route("/{role}/onboarding/entry", get(onboarding::resolve_entry))
        .route(
            "/{role}/onboarding/steps/{segment}",
            post(onboarding::submit_step),
        )
        .route(
            "/{role}/onboarding/back/{segment}",
            post(onboarding::go_back),
        )
        .route("/{role}/onboarding/submit", post(onboarding::submit_onboarding))
}
