//! One user's interaction with one wizard.
//!
//! A [`WizardSession`] is built explicitly for a `(user, role)` pair on
//! entry and dropped (or [`reset`](WizardSession::reset)) on logout. It ties
//! the state store, the position machine and the synchronizer together.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

use super::gate::SessionUser;
use super::guard::{GuardDecision, RequestedPage, WizardMachine, WizardPosition};
use super::steps::StepRegistry;
use super::store::{reject_foreign_keys, WizardStateStore};
use super::sync::{PersistenceSynchronizer, Progress, ProgressOrigin};
use super::validation::validate_step;
use super::write_gate::WriteGate;

/// Result of submitting a step form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Written, committed and advanced.
    Saved {
        position: WizardPosition,
        next_route: String,
    },
    /// Another write for this wizard was still pending; nothing happened.
    Ignored,
}

pub struct WizardSession {
    user_id: DbId,
    role: Role,
    sync: PersistenceSynchronizer,
    write_gate: Arc<WriteGate>,
    state: WizardStateStore,
    machine: WizardMachine,
    origin: ProgressOrigin,
}

impl WizardSession {
    /// Load prior progress and position the wizard at its first gap.
    ///
    /// An unreadable store opens a fresh wizard (origin `Degraded`).
    pub async fn open(
        sync: PersistenceSynchronizer,
        write_gate: Arc<WriteGate>,
        user: SessionUser,
        role: Role,
    ) -> Self {
        let progress = sync.load_progress_or_fresh(user.user_id, role).await;
        Self::from_progress(sync, write_gate, user, role, progress)
    }

    /// Like [`WizardSession::open`], but a store read failure is returned
    /// instead of opening an empty wizard. Used before writing.
    pub async fn open_strict(
        sync: PersistenceSynchronizer,
        write_gate: Arc<WriteGate>,
        user: SessionUser,
        role: Role,
    ) -> Result<Self, CoreError> {
        let progress = sync.load_progress_strict(user.user_id, role).await?;
        Ok(Self::from_progress(sync, write_gate, user, role, progress))
    }

    fn from_progress(
        sync: PersistenceSynchronizer,
        write_gate: Arc<WriteGate>,
        user: SessionUser,
        role: Role,
        progress: Progress,
    ) -> Self {
        let mut state = WizardStateStore::new(StepRegistry::for_role(role));
        state.replace_all(progress.data);
        let machine = WizardMachine::new(state.registry(), state.completed_steps());

        Self {
            user_id: user.user_id,
            role,
            sync,
            write_gate,
            state,
            machine,
            origin: progress.origin,
        }
    }

    pub fn user_id(&self) -> DbId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn registry(&self) -> &'static StepRegistry {
        self.state.registry()
    }

    pub fn state(&self) -> &WizardStateStore {
        &self.state
    }

    /// How the prior progress was obtained when the session opened.
    pub fn origin(&self) -> ProgressOrigin {
        self.origin
    }

    pub fn position(&self) -> WizardPosition {
        self.machine.position()
    }

    /// Route of the current position.
    pub fn route(&self) -> String {
        self.machine.route()
    }

    /// Enter `page` directly; the guard clamps it to the first gap.
    pub fn enter(&mut self, page: RequestedPage) -> GuardDecision {
        self.machine.enter(page, self.state.completed_steps())
    }

    /// Validate, save and commit one step's form, then advance.
    ///
    /// `values` is merged over the step's committed fields; a `null` clears a
    /// field. The input is kept as a draft until the save succeeds, so a
    /// failure at any point leaves committed data and completion untouched.
    pub async fn submit_step(
        &mut self,
        step_id: u8,
        values: Map<String, Value>,
    ) -> Result<StepOutcome, CoreError> {
        let step = self.registry().step(step_id)?;
        reject_foreign_keys(step, &values)?;

        if let GuardDecision::Redirect { step: target, route } =
            self.enter(RequestedPage::Step(step_id))
        {
            return Err(CoreError::CompletionPreconditionFailed {
                step: target,
                redirect_to: route,
            });
        }

        self.state.stash_draft(step_id, values.clone());

        let mut merged = self.state.data(step_id)?;
        for (key, value) in values {
            if value.is_null() {
                merged.remove(&key);
            } else {
                merged.insert(key, value);
            }
        }
        let result = validate_step(step, &merged);
        if !result.valid {
            return Err(CoreError::ValidationFailed(result.field_errors));
        }

        let Some(permit) = self.write_gate.try_acquire(self.user_id, self.role) else {
            tracing::debug!(
                user_id = self.user_id,
                role = %self.role,
                step = step_id,
                "Step save ignored: another write is pending"
            );
            return Ok(StepOutcome::Ignored);
        };

        self.sync.save_step(permit, step_id, merged.clone()).await?;

        // Owned keys missing from the saved set are cleared locally too.
        let committed: Map<String, Value> = step
            .data_keys
            .iter()
            .map(|key| (key.to_string(), merged.get(*key).cloned().unwrap_or(Value::Null)))
            .collect();
        self.state.update_data(step_id, committed)?;
        self.state.mark_complete(step_id)?;
        self.state.clear_draft(step_id);

        let position = self.machine.advance(self.state.completed_steps())?;
        Ok(StepOutcome::Saved {
            position,
            next_route: self.machine.route(),
        })
    }

    /// Go back one page without validating or writing.
    pub fn go_back(&mut self) -> Result<WizardPosition, CoreError> {
        self.machine.back()
    }

    /// Finalize onboarding from the summary and return the dashboard route.
    pub async fn submit_completion(&mut self) -> Result<String, CoreError> {
        if let GuardDecision::Redirect { step, route } = self.enter(RequestedPage::Summary) {
            return Err(CoreError::CompletionPreconditionFailed {
                step,
                redirect_to: route,
            });
        }

        let Some(_permit) = self.write_gate.try_acquire(self.user_id, self.role) else {
            return Err(CoreError::Conflict(
                "A save for this wizard is already in progress".to_string(),
            ));
        };

        match self.sync.submit_completion(self.user_id, self.role).await {
            Ok(route) => {
                self.machine.finish(self.state.completed_steps())?;
                Ok(route)
            }
            Err(CoreError::CompletionPreconditionFailed { step, redirect_to }) => {
                // The stored record is behind this session; follow the store.
                let progress = self.sync.load_progress_or_fresh(self.user_id, self.role).await;
                self.state.replace_all(progress.data);
                self.machine
                    .enter(RequestedPage::Step(step), self.state.completed_steps());
                Err(CoreError::CompletionPreconditionFailed { step, redirect_to })
            }
            Err(e) => Err(e),
        }
    }

    /// Drop all local state and start over from step one.
    pub fn reset(&mut self) {
        self.state.reset();
        self.machine = WizardMachine::new(self.registry(), self.state.completed_steps());
    }
}
