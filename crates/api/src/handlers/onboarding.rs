//! Handlers for the job seeker and employer onboarding wizards.
//!
//! Every handler resolves the `{role}` path segment, runs the session/role
//! gate and only then touches wizard state. Progress is loaded fresh per
//! request into a [`WizardSession`]; nothing is cached between requests.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use temu_core::onboarding::entry::{self, EntryOutcome, RedirectReason};
use temu_core::onboarding::guard::{GuardDecision, RequestedPage, WizardPosition};
use temu_core::onboarding::{
    authorize, ProgressOrigin, Session, SessionUser, StepDefinition, StepOutcome, StepRegistry,
    WizardSession,
};
use temu_core::roles::Role;

use crate::error::{AppError, AppResult};
use crate::middleware::session::CurrentSession;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EntryParams {
    /// Step route segment or the summary segment.
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub data: Map<String, Value>,
    pub completed_steps: Vec<u8>,
    /// Step id to resume at; `N + 1` means the summary.
    pub current_step: u8,
    pub current_route: String,
    pub position: WizardPosition,
    pub origin: ProgressOrigin,
    pub steps: &'static [StepDefinition],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsResponse {
    pub role: Role,
    pub steps: &'static [StepDefinition],
    pub summary_route: String,
    pub dashboard_route: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub allowed: bool,
    pub redirect_to: Option<String>,
    pub position: Option<WizardPosition>,
    pub reason: Option<RedirectReason>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSavedResponse {
    pub success: bool,
    pub next_route: String,
    pub position: WizardPosition,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackResponse {
    pub previous_route: String,
    pub position: WizardPosition,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub redirect_url: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve the `{role}` path segment.
fn wizard_role(segment: &str) -> AppResult<Role> {
    Role::from_path_segment(segment)
        .ok_or_else(|| AppError::NotFound(format!("No onboarding wizard for '{segment}'")))
}

/// Run the gate for a request that originated on `origin`.
fn admit(session: &Session, role: Role, origin: &str) -> AppResult<SessionUser> {
    Ok(authorize(session, role, origin).into_result()?)
}

async fn open_session(state: &AppState, user: SessionUser, role: Role) -> WizardSession {
    WizardSession::open(state.sync.clone(), state.write_gate.clone(), user, role).await
}

/// Open a wizard that is about to write. A store read failure is returned
/// rather than treated as an empty wizard.
async fn open_session_for_write(
    state: &AppState,
    user: SessionUser,
    role: Role,
) -> AppResult<WizardSession> {
    Ok(WizardSession::open_strict(state.sync.clone(), state.write_gate.clone(), user, role).await?)
}

fn step_number(registry: &StepRegistry, position: WizardPosition) -> u8 {
    match position {
        WizardPosition::Step(id) => id,
        WizardPosition::Summary | WizardPosition::Success => registry.len() + 1,
    }
}

// ---------------------------------------------------------------------------
// GET /api/{role}/check-onboarding
// ---------------------------------------------------------------------------

/// Whether the caller has finished onboarding, and where to send them.
///
/// Computed fresh from the profile store on every call. A store read failure
/// is an error here, not a silent "start over".
pub async fn check_onboarding(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(role): Path<String>,
) -> AppResult<impl IntoResponse> {
    let role = wizard_role(&role)?;
    let registry = StepRegistry::for_role(role);
    let user = admit(&session, role, &registry.base_route())?;

    let status = state.sync.onboarding_status(user.user_id, role).await?;
    tracing::debug!(
        user_id = user.user_id,
        role = %role,
        completed = status.completed,
        current_step = status.current_step,
        "Onboarding status checked"
    );
    Ok(Json(status))
}

// ---------------------------------------------------------------------------
// GET /api/{role}/onboarding/progress
// ---------------------------------------------------------------------------

/// Saved wizard data, derived completion and the resume position.
pub async fn get_progress(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(role): Path<String>,
) -> AppResult<impl IntoResponse> {
    let role = wizard_role(&role)?;
    let registry = StepRegistry::for_role(role);
    let user = admit(&session, role, &registry.base_route())?;

    let wizard = open_session(&state, user, role).await;
    let position = wizard.position();

    Ok(Json(ProgressResponse {
        data: wizard.state().all_data().clone(),
        completed_steps: wizard.state().completed_steps().iter().copied().collect(),
        current_step: step_number(registry, position),
        current_route: wizard.route(),
        position,
        origin: wizard.origin(),
        steps: registry.steps(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/{role}/onboarding/steps
// ---------------------------------------------------------------------------

/// The role's step sequence. Static; no session required.
pub async fn list_steps(Path(role): Path<String>) -> AppResult<impl IntoResponse> {
    let registry = StepRegistry::for_role(wizard_role(&role)?);
    Ok(Json(StepsResponse {
        role: registry.role(),
        steps: registry.steps(),
        summary_route: registry.summary_route(),
        dashboard_route: registry.dashboard_route(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/{role}/onboarding/entry?page=<segment>
// ---------------------------------------------------------------------------

/// Decide whether a page may render or where to redirect instead.
///
/// Sign-in and wrong-role outcomes are reported in the body so the page can
/// navigate; they are not HTTP errors here.
pub async fn resolve_entry(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(role): Path<String>,
    Query(params): Query<EntryParams>,
) -> AppResult<impl IntoResponse> {
    let role = wizard_role(&role)?;
    let registry = StepRegistry::for_role(role);
    let segment = params
        .page
        .ok_or_else(|| AppError::BadRequest("Missing 'page' query parameter".to_string()))?;
    let page = RequestedPage::from_segment(registry, &segment)?;

    let outcome = entry::resolve_entry(&state.sync, &session, role, page).await?;
    let position = outcome.position();
    let response = match outcome {
        EntryOutcome::Render { .. } => EntryResponse {
            allowed: true,
            redirect_to: None,
            position,
            reason: None,
        },
        EntryOutcome::Redirect { to, reason } => EntryResponse {
            allowed: false,
            redirect_to: Some(to),
            position,
            reason: Some(reason),
        },
    };
    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// POST /api/{role}/onboarding/steps/{segment}
// ---------------------------------------------------------------------------

/// Validate and save one step, then advance.
///
/// Returns 400 with `fieldErrors` when the step does not validate (nothing
/// is written), 409 `SAVE_IN_PROGRESS` while another save for the same
/// wizard is pending and 500 `PERSISTENCE_ERROR` when the store fails. Each
/// of these echoes the unsaved input back as `draft`.
pub async fn submit_step(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path((role, segment)): Path<(String, String)>,
    Json(values): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let role = wizard_role(&role)?;
    let registry = StepRegistry::for_role(role);
    let step = registry.step_for_route(&segment)?;
    let user = admit(&session, role, &registry.step_route(step))?;

    let mut wizard = match open_session_for_write(&state, user, role).await {
        Ok(wizard) => wizard,
        Err(e) => return Err(e.with_draft(values)),
    };
    let outcome = match wizard.submit_step(step.id, values).await {
        Ok(outcome) => outcome,
        Err(e) => return Err(attach_draft(&wizard, step.id, e.into())),
    };
    match outcome {
        StepOutcome::Saved {
            position,
            next_route,
        } => {
            tracing::info!(
                user_id = user.user_id,
                role = %role,
                step = step.id,
                next = %next_route,
                "Onboarding step submitted"
            );
            Ok(Json(StepSavedResponse {
                success: true,
                next_route,
                position,
            }))
        }
        StepOutcome::Ignored => Err(attach_draft(&wizard, step.id, AppError::SaveInProgress)),
    }
}

fn attach_draft(wizard: &WizardSession, step_id: u8, error: AppError) -> AppError {
    match wizard.state().draft(step_id) {
        Some(draft) => error.with_draft(draft.clone()),
        None => error,
    }
}

// ---------------------------------------------------------------------------
// POST /api/{role}/onboarding/back/{segment}
// ---------------------------------------------------------------------------

/// Route of the page before `segment`. Never validates or writes.
pub async fn go_back(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path((role, segment)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let role = wizard_role(&role)?;
    let registry = StepRegistry::for_role(role);
    let page = RequestedPage::from_segment(registry, &segment)?;
    let user = admit(&session, role, &page.route(registry)?)?;

    let mut wizard = open_session(&state, user, role).await;
    if let GuardDecision::Redirect { step, .. } = wizard.enter(page) {
        tracing::debug!(user_id = user.user_id, role = %role, step, "Back requested past first gap");
    }
    let position = wizard.go_back()?;

    Ok(Json(BackResponse {
        previous_route: wizard.route(),
        position,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/{role}/onboarding/submit
// ---------------------------------------------------------------------------

/// Finish onboarding from the summary page.
///
/// Every required step is re-validated against the stored record; the
/// first incomplete one is returned as a 409 `redirectTo`.
pub async fn submit_onboarding(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(role): Path<String>,
) -> AppResult<impl IntoResponse> {
    let role = wizard_role(&role)?;
    let registry = StepRegistry::for_role(role);
    let user = admit(&session, role, &registry.summary_route())?;

    let mut wizard = open_session_for_write(&state, user, role).await?;
    let redirect_url = wizard.submit_completion().await?;

    Ok(Json(SubmitResponse {
        success: true,
        redirect_url,
    }))
}
