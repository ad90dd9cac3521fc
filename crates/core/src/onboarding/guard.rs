//! Navigation guard and the wizard position state machine.
//!
//! Positions are `Step(1..=N)`, `Summary` and the terminal `Success`.
//! Forward moves require the current step to be complete, backward moves
//! never validate, and any direct entry is clamped to the first incomplete
//! required step.

use serde::Serialize;

use crate::error::CoreError;

use super::steps::{StepDefinition, StepRegistry, SUMMARY_SEGMENT};
use super::store::CompletionState;

/// Where a user currently is in a wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "step", rename_all = "snake_case")]
pub enum WizardPosition {
    Step(u8),
    Summary,
    Success,
}

/// A page the browser asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedPage {
    Step(u8),
    Summary,
}

impl RequestedPage {
    /// Resolve a route segment (a step segment or the summary segment).
    pub fn from_segment(registry: &StepRegistry, segment: &str) -> Result<Self, CoreError> {
        if segment == SUMMARY_SEGMENT {
            return Ok(Self::Summary);
        }
        registry.step_for_route(segment).map(|s| Self::Step(s.id))
    }

    /// Page route of this request.
    pub fn route(self, registry: &StepRegistry) -> Result<String, CoreError> {
        match self {
            Self::Step(id) => registry.step(id).map(|s| registry.step_route(s)),
            Self::Summary => Ok(registry.summary_route()),
        }
    }
}

/// Outcome of guarding a page entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect { step: u8, route: String },
}

/// The first required step, in declared order, that is not complete.
pub fn first_incomplete_required(
    registry: &StepRegistry,
    completed: &CompletionState,
) -> Option<&'static StepDefinition> {
    registry.required_steps().find(|s| !completed.contains(&s.id))
}

fn redirect_to(registry: &StepRegistry, step: &StepDefinition) -> GuardDecision {
    GuardDecision::Redirect {
        step: step.id,
        route: registry.step_route(step),
    }
}

/// Guard entry to a step page: redirect when the user is ahead of the first
/// incomplete required step.
pub fn guard_step_entry(
    registry: &StepRegistry,
    completed: &CompletionState,
    requested: u8,
) -> GuardDecision {
    match first_incomplete_required(registry, completed) {
        Some(target) if requested > target.id => redirect_to(registry, target),
        _ => GuardDecision::Proceed,
    }
}

/// Guard entry to the summary page: every required step must be complete,
/// otherwise redirect to the first one that is not.
pub fn guard_summary_entry(registry: &StepRegistry, completed: &CompletionState) -> GuardDecision {
    for step in registry.required_steps() {
        if !completed.contains(&step.id) {
            return redirect_to(registry, step);
        }
    }
    GuardDecision::Proceed
}

pub fn guard_entry(
    registry: &StepRegistry,
    completed: &CompletionState,
    page: RequestedPage,
) -> GuardDecision {
    match page {
        RequestedPage::Step(id) => guard_step_entry(registry, completed, id),
        RequestedPage::Summary => guard_summary_entry(registry, completed),
    }
}

/// Where a wizard opens: the first incomplete required step, or the summary
/// once every required step is complete.
pub fn initial_position(registry: &StepRegistry, completed: &CompletionState) -> WizardPosition {
    match first_incomplete_required(registry, completed) {
        Some(step) => WizardPosition::Step(step.id),
        None => WizardPosition::Summary,
    }
}

/// The position state machine of one wizard session.
#[derive(Debug, Clone)]
pub struct WizardMachine {
    registry: &'static StepRegistry,
    position: WizardPosition,
}

impl WizardMachine {
    /// Start at the initial position derived from `completed`.
    pub fn new(registry: &'static StepRegistry, completed: &CompletionState) -> Self {
        Self {
            registry,
            position: initial_position(registry, completed),
        }
    }

    pub fn position(&self) -> WizardPosition {
        self.position
    }

    /// Page route of the current position.
    pub fn route(&self) -> String {
        match self.position {
            WizardPosition::Step(id) => match self.registry.step(id) {
                Ok(step) => self.registry.step_route(step),
                Err(_) => self.registry.base_route(),
            },
            WizardPosition::Summary => self.registry.summary_route(),
            WizardPosition::Success => self.registry.dashboard_route().to_string(),
        }
    }

    /// Direct entry to `page`, clamped by the guard.
    pub fn enter(&mut self, page: RequestedPage, completed: &CompletionState) -> GuardDecision {
        let decision = guard_entry(self.registry, completed, page);
        self.position = match (&decision, page) {
            (GuardDecision::Redirect { step, .. }, _) => WizardPosition::Step(*step),
            (GuardDecision::Proceed, RequestedPage::Step(id)) => WizardPosition::Step(id),
            (GuardDecision::Proceed, RequestedPage::Summary) => WizardPosition::Summary,
        };
        decision
    }

    /// Move forward from a complete step to the next step or the summary.
    pub fn advance(&mut self, completed: &CompletionState) -> Result<WizardPosition, CoreError> {
        let WizardPosition::Step(current) = self.position else {
            return Err(CoreError::Conflict(
                "Only a step page can advance".to_string(),
            ));
        };
        if !completed.contains(&current) {
            return Err(CoreError::Validation(format!(
                "Step {current} must be completed before advancing"
            )));
        }
        self.position = match self.registry.next(current) {
            Some(next) => WizardPosition::Step(next.id),
            None => WizardPosition::Summary,
        };
        tracing::debug!(from_step = current, to = ?self.position, "Wizard advanced");
        Ok(self.position)
    }

    /// Move back one page. Never validates.
    pub fn back(&mut self) -> Result<WizardPosition, CoreError> {
        self.position = match self.position {
            WizardPosition::Step(current) => match self.registry.previous(current) {
                Some(prev) => WizardPosition::Step(prev.id),
                None => {
                    return Err(CoreError::Validation(
                        "Already on the first step; cannot go back".to_string(),
                    ))
                }
            },
            WizardPosition::Summary => WizardPosition::Step(self.registry.len()),
            WizardPosition::Success => {
                return Err(CoreError::Conflict(
                    "Onboarding is already complete".to_string(),
                ))
            }
        };
        Ok(self.position)
    }

    /// Summary to success. Re-checks every required step first.
    pub fn finish(&mut self, completed: &CompletionState) -> Result<WizardPosition, CoreError> {
        if self.position != WizardPosition::Summary {
            return Err(CoreError::Conflict(
                "Onboarding can only be submitted from the summary page".to_string(),
            ));
        }
        if let GuardDecision::Redirect { step, route } = guard_summary_entry(self.registry, completed)
        {
            self.position = WizardPosition::Step(step);
            return Err(CoreError::CompletionPreconditionFailed {
                step,
                redirect_to: route,
            });
        }
        self.position = WizardPosition::Success;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::roles::Role;

    fn registry() -> &'static StepRegistry {
        StepRegistry::for_role(Role::JobSeeker)
    }

    fn done(ids: &[u8]) -> CompletionState {
        ids.iter().copied().collect()
    }

    #[test]
    fn fresh_user_starts_at_step_one() {
        let completed = done(&[5, 7]);
        assert_eq!(initial_position(registry(), &completed), WizardPosition::Step(1));
        assert_eq!(
            guard_step_entry(registry(), &completed, 1),
            GuardDecision::Proceed
        );
    }

    #[test]
    fn returning_user_is_sent_to_first_gap() {
        let completed = done(&[1, 2, 3, 5, 7]);
        assert_eq!(initial_position(registry(), &completed), WizardPosition::Step(4));
        assert_eq!(
            guard_step_entry(registry(), &completed, 6),
            GuardDecision::Redirect {
                step: 4,
                route: "/job-seeker/onboarding/level-pengalaman".to_string()
            }
        );
    }

    #[test]
    fn earlier_and_current_steps_are_always_reachable() {
        let completed = done(&[1, 2, 5, 7]);
        for id in 1..=3 {
            assert_eq!(guard_step_entry(registry(), &completed, id), GuardDecision::Proceed);
        }
    }

    #[test]
    fn summary_redirects_to_first_incomplete_required_step() {
        let completed = done(&[1, 2, 3, 5, 6, 7]);
        assert_matches!(
            guard_summary_entry(registry(), &completed),
            GuardDecision::Redirect { step: 4, .. }
        );
        let all = done(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(guard_summary_entry(registry(), &all), GuardDecision::Proceed);
    }

    #[test]
    fn summary_ignores_optional_steps() {
        let required_only = done(&[1, 2, 3, 4, 6]);
        assert_eq!(guard_summary_entry(registry(), &required_only), GuardDecision::Proceed);
        assert_eq!(initial_position(registry(), &required_only), WizardPosition::Summary);
    }

    #[test]
    fn requested_page_from_segment() {
        assert_eq!(
            RequestedPage::from_segment(registry(), "ringkasan").unwrap(),
            RequestedPage::Summary
        );
        assert_eq!(
            RequestedPage::from_segment(registry(), "keahlian").unwrap(),
            RequestedPage::Step(6)
        );
        assert_matches!(
            RequestedPage::from_segment(registry(), "nope"),
            Err(CoreError::UnknownStep(_))
        );
    }

    #[test]
    fn machine_walks_forward_and_back() {
        let mut completed = done(&[5, 7]);
        let mut machine = WizardMachine::new(registry(), &completed);
        assert_eq!(machine.position(), WizardPosition::Step(1));

        assert_matches!(machine.advance(&completed), Err(CoreError::Validation(_)));
        assert_eq!(machine.position(), WizardPosition::Step(1));

        completed.insert(1);
        assert_eq!(machine.advance(&completed).unwrap(), WizardPosition::Step(2));
        assert_eq!(machine.back().unwrap(), WizardPosition::Step(1));
        assert_matches!(machine.back(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn last_step_advances_to_summary_then_success() {
        let completed = done(&[1, 2, 3, 4, 5, 6, 7]);
        let mut machine = WizardMachine::new(registry(), &completed);
        assert_eq!(machine.position(), WizardPosition::Summary);
        assert_eq!(machine.route(), "/job-seeker/onboarding/ringkasan");

        assert_eq!(machine.back().unwrap(), WizardPosition::Step(7));
        assert_eq!(machine.advance(&completed).unwrap(), WizardPosition::Summary);
        assert_eq!(machine.finish(&completed).unwrap(), WizardPosition::Success);
        assert_eq!(machine.route(), "/job-seeker/dashboard");
        assert_matches!(machine.back(), Err(CoreError::Conflict(_)));
        assert_matches!(machine.advance(&completed), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn finish_rechecks_required_steps() {
        let all = done(&[1, 2, 3, 4, 5, 6, 7]);
        let mut machine = WizardMachine::new(registry(), &all);

        let stale = done(&[1, 2, 4, 5, 6, 7]);
        assert_matches!(
            machine.finish(&stale),
            Err(CoreError::CompletionPreconditionFailed { step: 3, .. })
        );
        assert_eq!(machine.position(), WizardPosition::Step(3));
    }

    #[test]
    fn enter_clamps_out_of_order_navigation() {
        let completed = done(&[1, 5, 7]);
        let mut machine = WizardMachine::new(registry(), &completed);

        assert_matches!(
            machine.enter(RequestedPage::Summary, &completed),
            GuardDecision::Redirect { step: 2, .. }
        );
        assert_eq!(machine.position(), WizardPosition::Step(2));

        assert_eq!(machine.enter(RequestedPage::Step(1), &completed), GuardDecision::Proceed);
        assert_eq!(machine.position(), WizardPosition::Step(1));
    }

    #[test]
    fn position_serializes_with_kind_tag() {
        assert_eq!(
            serde_json::to_value(WizardPosition::Step(3)).unwrap(),
            serde_json::json!({ "kind": "step", "step": 3 })
        );
        assert_eq!(
            serde_json::to_value(WizardPosition::Summary).unwrap(),
            serde_json::json!({ "kind": "summary" })
        );
    }
}
