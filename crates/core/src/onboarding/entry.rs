//! Wizard entry state machine.
//!
//! ```text
//! Loading -> Authorized   -> Positioned
//!         |               -> Redirected
//!         -> Unauthorized
//! ```
//!
//! Every page entry starts in `Loading` and ends in exactly one terminal
//! state. Nothing is rendered until both the session and the position are
//! resolved.

use serde::Serialize;

use crate::error::CoreError;
use crate::roles::Role;

use super::gate::{authorize, Authorization, Session, SessionUser};
use super::guard::{guard_entry, GuardDecision, RequestedPage, WizardPosition};
use super::steps::StepRegistry;
use super::sync::{PersistenceSynchronizer, Progress};

/// Why an entry ended in a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedirectReason {
    SignIn,
    WrongRole,
    /// A required step before the requested page is incomplete.
    StepIncomplete { step: u8 },
    /// Onboarding is already finished; go to the dashboard.
    AlreadyCompleted,
}

/// Result of resolving a page entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Render {
        position: WizardPosition,
        progress: Progress,
    },
    Redirect {
        to: String,
        reason: RedirectReason,
    },
}

impl EntryOutcome {
    /// Position the user ends up at, if they stay inside the wizard.
    pub fn position(&self) -> Option<WizardPosition> {
        match self {
            Self::Render { position, .. } => Some(*position),
            Self::Redirect {
                reason: RedirectReason::StepIncomplete { step },
                ..
            } => Some(WizardPosition::Step(*step)),
            Self::Redirect { .. } => None,
        }
    }
}

#[derive(Debug)]
enum EntryState {
    Loading,
    Authorized(SessionUser),
    Unauthorized { to: String, reason: RedirectReason },
    Positioned { position: WizardPosition, progress: Progress },
    Redirected { to: String, reason: RedirectReason },
}

/// Resolve entry to `page` of the `role` wizard for `session`.
///
/// Progress that cannot be read is treated as fresh, so the only failure is
/// a `page` the registry does not define.
pub async fn resolve_entry(
    sync: &PersistenceSynchronizer,
    session: &Session,
    role: Role,
    page: RequestedPage,
) -> Result<EntryOutcome, CoreError> {
    let registry = StepRegistry::for_role(role);
    let origin = page.route(registry)?;

    let mut state = EntryState::Loading;
    loop {
        state = match state {
            EntryState::Loading => match authorize(session, role, &origin) {
                Authorization::Authorized(user) => EntryState::Authorized(user),
                Authorization::Unauthenticated { redirect_to } => EntryState::Unauthorized {
                    to: redirect_to,
                    reason: RedirectReason::SignIn,
                },
                Authorization::WrongRole { redirect_to } => EntryState::Unauthorized {
                    to: redirect_to,
                    reason: RedirectReason::WrongRole,
                },
            },
            EntryState::Authorized(user) => {
                let progress = sync.load_progress_or_fresh(user.user_id, role).await;
                position(registry, page, progress)
            }
            EntryState::Unauthorized { to, reason } | EntryState::Redirected { to, reason } => {
                tracing::debug!(role = %role, to = %to, ?reason, "Wizard entry redirected");
                return Ok(EntryOutcome::Redirect { to, reason });
            }
            EntryState::Positioned { position, progress } => {
                return Ok(EntryOutcome::Render { position, progress });
            }
        };
    }
}

fn position(registry: &StepRegistry, page: RequestedPage, progress: Progress) -> EntryState {
    if progress.onboarding_completed {
        return EntryState::Redirected {
            to: registry.dashboard_route().to_string(),
            reason: RedirectReason::AlreadyCompleted,
        };
    }
    match guard_entry(registry, &progress.completed_steps, page) {
        GuardDecision::Redirect { step, route } => EntryState::Redirected {
            to: route,
            reason: RedirectReason::StepIncomplete { step },
        },
        GuardDecision::Proceed => EntryState::Positioned {
            position: match page {
                RequestedPage::Step(id) => WizardPosition::Step(id),
                RequestedPage::Summary => WizardPosition::Summary,
            },
            progress,
        },
    }
}
