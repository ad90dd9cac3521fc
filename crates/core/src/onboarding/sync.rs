//! Persistence synchronizer: the only path between wizard state and the
//! profile store.
//!
//! Reads favour availability (a failed load starts the user fresh), writes
//! favour consistency (a failed save is surfaced and nothing advances).
//! Completion is always derived from field data; the stored flag is only a
//! cache that is reconciled on every read.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

use super::guard::{first_incomplete_required, guard_summary_entry, GuardDecision};
use super::profile::{FieldPatch, ProfileRecord, ProfileStore};
use super::steps::{StepDefinition, StepRegistry};
use super::store::{derive_completion, reject_foreign_keys, CompletionState};
use super::validation::validate_step;
use super::write_gate::WritePermit;

/// Where a [`Progress`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressOrigin {
    /// Reconstructed from a stored profile record.
    Stored,
    /// No record exists yet.
    Fresh,
    /// The store could not be read; treated as fresh.
    Degraded,
}

/// Wizard data and derived completion reconstructed from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub data: Map<String, Value>,
    pub completed_steps: CompletionState,
    /// Stored flag reconciled against the derived completion.
    pub onboarding_completed: bool,
    pub origin: ProgressOrigin,
}

impl Progress {
    fn empty(registry: &StepRegistry, origin: ProgressOrigin) -> Self {
        let data = Map::new();
        Self {
            completed_steps: derive_completion(registry, &data),
            data,
            onboarding_completed: false,
            origin,
        }
    }

    fn from_record(registry: &StepRegistry, record: ProfileRecord) -> Self {
        let completed_steps = derive_completion(registry, &record.fields);
        let all_required = first_incomplete_required(registry, &completed_steps).is_none();
        Self {
            data: record.fields,
            onboarding_completed: record.onboarding_completed && all_required,
            completed_steps,
            origin: ProgressOrigin::Stored,
        }
    }
}

/// Derived onboarding status returned by the check endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStatus {
    pub completed: bool,
    /// Id of the step to resume at; `N + 1` means the summary (or done).
    pub current_step: u8,
    pub redirect_to: String,
}

/// Syncs wizard state with a [`ProfileStore`].
#[derive(Clone)]
pub struct PersistenceSynchronizer {
    store: Arc<dyn ProfileStore>,
}

impl PersistenceSynchronizer {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    /// Load stored progress. Fails with `NotFound` when no record exists.
    pub async fn load_progress(&self, user_id: DbId, role: Role) -> Result<Progress, CoreError> {
        let registry = StepRegistry::for_role(role);
        let record = self
            .store
            .fetch_profile(user_id, role)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ProfileRecord",
                id: user_id,
            })?;
        Ok(Progress::from_record(registry, record))
    }

    /// Load stored progress, starting fresh only when there is no record.
    ///
    /// A store that cannot be read is an error here. Write paths use this so
    /// a failed read is never mistaken for an empty wizard.
    pub async fn load_progress_strict(
        &self,
        user_id: DbId,
        role: Role,
    ) -> Result<Progress, CoreError> {
        match self.load_progress(user_id, role).await {
            Err(CoreError::NotFound { .. }) => Ok(Progress::empty(
                StepRegistry::for_role(role),
                ProgressOrigin::Fresh,
            )),
            other => other,
        }
    }

    /// Load stored progress, starting fresh when there is none or the store
    /// cannot be read.
    pub async fn load_progress_or_fresh(&self, user_id: DbId, role: Role) -> Progress {
        match self.load_progress_strict(user_id, role).await {
            Ok(progress) => progress,
            Err(e) => {
                tracing::warn!(
                    user_id,
                    role = %role,
                    error = %e,
                    "Failed to load onboarding progress, starting fresh"
                );
                Progress::empty(StepRegistry::for_role(role), ProgressOrigin::Degraded)
            }
        }
    }

    /// Validate and write one step's field set.
    ///
    /// Only keys the step owns are written; owned keys missing from `data`
    /// are cleared. Saving the same data twice leaves the same record. The
    /// write runs on its own task that also owns `permit`, so it is still
    /// applied if the caller is dropped mid-flight and no second write for
    /// the wizard can start before it finishes.
    pub async fn save_step(
        &self,
        permit: WritePermit,
        step_id: u8,
        data: Map<String, Value>,
    ) -> Result<ProfileRecord, CoreError> {
        let (user_id, role) = (permit.user_id(), permit.role());
        let step = StepRegistry::for_role(role).step(step_id)?;
        reject_foreign_keys(step, &data)?;

        let set: Map<String, Value> = data.into_iter().filter(|(_, v)| !v.is_null()).collect();
        let result = validate_step(step, &set);
        if !result.valid {
            return Err(CoreError::ValidationFailed(result.field_errors));
        }

        let patch = FieldPatch {
            set,
            clear: step.data_keys.iter().map(|k| k.to_string()).collect(),
        };
        let store = Arc::clone(&self.store);
        let record = tokio::spawn(async move {
            let result = store.upsert_profile_fields(user_id, role, &patch).await;
            drop(permit);
            result
        })
        .await
        .map_err(|e| CoreError::Internal(format!("Profile write task failed: {e}")))?
        .inspect_err(|e| {
            tracing::warn!(user_id, role = %role, step = step_id, error = %e, "Step save failed");
        })?;

        tracing::info!(
            user_id,
            role = %role,
            step = step_id,
            segment = step.route_segment,
            "Onboarding step saved"
        );
        Ok(record)
    }

    /// Finalize onboarding and return the dashboard route.
    ///
    /// Re-reads the record and re-validates every required step regardless
    /// of what the client believes.
    pub async fn submit_completion(&self, user_id: DbId, role: Role) -> Result<String, CoreError> {
        let registry = StepRegistry::for_role(role);
        let fields = self
            .store
            .fetch_profile(user_id, role)
            .await?
            .map(|record| record.fields)
            .unwrap_or_default();
        let completed = derive_completion(registry, &fields);

        if let GuardDecision::Redirect { step, route } = guard_summary_entry(registry, &completed) {
            tracing::warn!(
                user_id,
                role = %role,
                step,
                "Completion rejected: required step incomplete"
            );
            return Err(CoreError::CompletionPreconditionFailed {
                step,
                redirect_to: route,
            });
        }

        self.store.mark_profile_complete(user_id, role).await?;
        tracing::info!(user_id, role = %role, "Onboarding completed");
        Ok(registry.dashboard_route().to_string())
    }

    /// Compute the onboarding status fresh from the store.
    pub async fn onboarding_status(
        &self,
        user_id: DbId,
        role: Role,
    ) -> Result<OnboardingStatus, CoreError> {
        let registry = StepRegistry::for_role(role);
        let record = self.store.fetch_profile(user_id, role).await?;
        let (fields, stored_flag) = match record {
            Some(r) => (r.fields, r.onboarding_completed),
            None => (Map::new(), false),
        };
        let completed = derive_completion(registry, &fields);
        Ok(status_from(registry, &completed, stored_flag, user_id))
    }
}

fn status_from(
    registry: &StepRegistry,
    completed: &CompletionState,
    stored_flag: bool,
    user_id: DbId,
) -> OnboardingStatus {
    let past_last_step = registry.len() + 1;
    match first_incomplete_required(registry, completed) {
        Some(step) => {
            if stored_flag {
                tracing::warn!(
                    user_id,
                    role = %registry.role(),
                    step = step.id,
                    "Stored completion flag disagrees with profile data"
                );
            }
            resume_at(registry, step)
        }
        None if stored_flag => OnboardingStatus {
            completed: true,
            current_step: past_last_step,
            redirect_to: registry.dashboard_route().to_string(),
        },
        None => OnboardingStatus {
            completed: false,
            current_step: past_last_step,
            redirect_to: registry.summary_route(),
        },
    }
}

fn resume_at(registry: &StepRegistry, step: &StepDefinition) -> OnboardingStatus {
    OnboardingStatus {
        completed: false,
        current_step: step.id,
        redirect_to: registry.step_route(step),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::onboarding::memory::InMemoryProfileStore;
    use crate::onboarding::store::step_fields;
    use crate::onboarding::testing::{self, employer_steps, job_seeker_steps};

    const USER: DbId = 42;

    fn setup() -> (Arc<InMemoryProfileStore>, PersistenceSynchronizer) {
        let store = Arc::new(InMemoryProfileStore::new());
        let sync = PersistenceSynchronizer::new(store.clone());
        (store, sync)
    }

    #[tokio::test]
    async fn fresh_user_has_no_record() {
        let (_, sync) = setup();
        assert_matches!(
            sync.load_progress(USER, Role::JobSeeker).await,
            Err(CoreError::NotFound { entity: "ProfileRecord", .. })
        );
        let progress = sync.load_progress_or_fresh(USER, Role::JobSeeker).await;
        assert_eq!(progress.origin, ProgressOrigin::Fresh);
        assert!(progress.data.is_empty());
        assert_eq!(progress.completed_steps.iter().copied().collect::<Vec<_>>(), vec![5, 7]);
    }

    #[tokio::test]
    async fn read_failure_degrades_to_fresh() {
        let (store, sync) = setup();
        store.set_reads_failing(true);
        let progress = sync.load_progress_or_fresh(USER, Role::Employer).await;
        assert_eq!(progress.origin, ProgressOrigin::Degraded);
        assert!(progress.data.is_empty());
    }

    #[tokio::test]
    async fn save_writes_only_owned_fields() {
        let (store, sync) = setup();
        let steps = job_seeker_steps();
        testing::save(&sync, USER, Role::JobSeeker, 2, steps[1].clone()).await.unwrap();
        testing::save(&sync, USER, Role::JobSeeker, 4, steps[3].clone()).await.unwrap();

        let record = store.fetch_profile(USER, Role::JobSeeker).await.unwrap().unwrap();
        assert_eq!(record.fields["city"], "Bandung");
        assert_eq!(record.fields["experienceLevel"], "junior");
        assert_eq!(record.fields.len(), steps[1].len() + steps[3].len());
    }

    #[tokio::test]
    async fn save_is_idempotent() {
        let (store, sync) = setup();
        let data = job_seeker_steps()[0].clone();
        testing::save(&sync, USER, Role::JobSeeker, 1, data.clone()).await.unwrap();
        let once = store.fetch_profile(USER, Role::JobSeeker).await.unwrap().unwrap();
        testing::save(&sync, USER, Role::JobSeeker, 1, data).await.unwrap();
        let twice = store.fetch_profile(USER, Role::JobSeeker).await.unwrap().unwrap();
        assert_eq!(once.fields, twice.fields);
        assert_eq!(once.onboarding_completed, twice.onboarding_completed);
    }

    #[tokio::test]
    async fn resave_clears_dropped_owned_fields() {
        let (store, sync) = setup();
        let mut data = job_seeker_steps()[1].clone();
        testing::save(&sync, USER, Role::JobSeeker, 2, data.clone()).await.unwrap();
        data.remove("postalCode");
        testing::save(&sync, USER, Role::JobSeeker, 2, data.clone()).await.unwrap();
        let record = store.fetch_profile(USER, Role::JobSeeker).await.unwrap().unwrap();
        assert_eq!(record.fields, data);
    }

    #[tokio::test]
    async fn invalid_step_is_not_written() {
        let (store, sync) = setup();
        let mut data = job_seeker_steps()[1].clone();
        data.insert("city".into(), json!(""));
        assert_matches!(
            testing::save(&sync, USER, Role::JobSeeker, 2, data).await,
            Err(CoreError::ValidationFailed(fields)) if fields.contains_key("city")
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn foreign_fields_are_rejected() {
        let (store, sync) = setup();
        let data = json!({ "experienceLevel": "mid", "companyName": "PT X" });
        let data = data.as_object().cloned().unwrap();
        assert_matches!(
            testing::save(&sync, USER, Role::JobSeeker, 4, data).await,
            Err(CoreError::ValidationFailed(fields)) if fields.contains_key("companyName")
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn load_round_trips_saved_steps() {
        let (_, sync) = setup();
        let steps = job_seeker_steps();
        for (idx, data) in steps.iter().enumerate().take(3) {
            testing::save(&sync, USER, Role::JobSeeker, idx as u8 + 1, data.clone())
                .await
                .unwrap();
        }
        let progress = sync.load_progress(USER, Role::JobSeeker).await.unwrap();
        let registry = StepRegistry::for_role(Role::JobSeeker);
        for (idx, data) in steps.iter().enumerate().take(3) {
            let step = registry.step(idx as u8 + 1).unwrap();
            assert_eq!(&step_fields(step, &progress.data), data);
        }
        assert_eq!(
            progress.completed_steps.iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 3, 5, 7]
        );
    }

    #[tokio::test]
    async fn completion_requires_every_required_step() {
        let (store, sync) = setup();
        let steps = employer_steps();
        testing::save(&sync, USER, Role::Employer, 1, steps[0].clone()).await.unwrap();
        testing::save(&sync, USER, Role::Employer, 2, steps[1].clone()).await.unwrap();

        assert_matches!(
            sync.submit_completion(USER, Role::Employer).await,
            Err(CoreError::CompletionPreconditionFailed { step: 4, redirect_to })
                if redirect_to == "/employer/onboarding/penanggung-jawab"
        );
        let record = store.fetch_profile(USER, Role::Employer).await.unwrap().unwrap();
        assert!(!record.onboarding_completed);

        testing::save(&sync, USER, Role::Employer, 4, steps[3].clone()).await.unwrap();
        assert_eq!(
            sync.submit_completion(USER, Role::Employer).await.unwrap(),
            "/employer/dashboard"
        );
        let record = store.fetch_profile(USER, Role::Employer).await.unwrap().unwrap();
        assert!(record.onboarding_completed);
        assert!(record.completed_at.is_some());
    }

    #[tokio::test]
    async fn every_subset_of_missing_required_steps_blocks_completion() {
        let registry = StepRegistry::for_role(Role::JobSeeker);
        let required: Vec<u8> = registry.required_steps().map(|s| s.id).collect();
        let steps = job_seeker_steps();

        // Each bitmask selects which required steps get saved; all but the
        // full mask leave at least one gap.
        for mask in 0u32..(1 << required.len()) - 1 {
            let (_, sync) = setup();
            for (bit, id) in required.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    let data = steps[*id as usize - 1].clone();
                    testing::save(&sync, USER, Role::JobSeeker, *id, data).await.unwrap();
                }
            }
            let first_gap = required
                .iter()
                .enumerate()
                .find(|(bit, _)| mask & (1 << bit) == 0)
                .map(|(_, id)| *id)
                .unwrap();
            assert_matches!(
                sync.submit_completion(USER, Role::JobSeeker).await,
                Err(CoreError::CompletionPreconditionFailed { step, .. }) if step == first_gap,
                "mask {mask:#b}"
            );
        }
    }

    #[tokio::test]
    async fn submit_without_record_points_at_step_one() {
        let (_, sync) = setup();
        assert_matches!(
            sync.submit_completion(USER, Role::JobSeeker).await,
            Err(CoreError::CompletionPreconditionFailed { step: 1, .. })
        );
    }

    #[tokio::test]
    async fn status_walks_through_lifecycle() {
        let (_, sync) = setup();
        let steps = employer_steps();

        let status = sync.onboarding_status(USER, Role::Employer).await.unwrap();
        assert_eq!(
            status,
            OnboardingStatus {
                completed: false,
                current_step: 1,
                redirect_to: "/employer/onboarding/informasi-perusahaan".to_string(),
            }
        );

        testing::save(&sync, USER, Role::Employer, 1, steps[0].clone()).await.unwrap();
        let status = sync.onboarding_status(USER, Role::Employer).await.unwrap();
        assert_eq!(status.current_step, 2);

        testing::save(&sync, USER, Role::Employer, 2, steps[1].clone()).await.unwrap();
        testing::save(&sync, USER, Role::Employer, 4, steps[3].clone()).await.unwrap();
        let status = sync.onboarding_status(USER, Role::Employer).await.unwrap();
        assert!(!status.completed);
        assert_eq!(status.current_step, 6);
        assert_eq!(status.redirect_to, "/employer/onboarding/ringkasan");

        sync.submit_completion(USER, Role::Employer).await.unwrap();
        let status = sync.onboarding_status(USER, Role::Employer).await.unwrap();
        assert!(status.completed);
        assert_eq!(status.redirect_to, "/employer/dashboard");
    }

    #[tokio::test]
    async fn stale_completion_flag_is_not_trusted() {
        let (store, sync) = setup();
        let now = chrono::Utc::now();
        store
            .insert(ProfileRecord {
                user_id: USER,
                role: Role::Employer,
                fields: employer_steps()[0].clone(),
                onboarding_completed: true,
                completed_at: Some(now),
                created_at: now,
                updated_at: now,
            })
            .await;

        let status = sync.onboarding_status(USER, Role::Employer).await.unwrap();
        assert!(!status.completed);
        assert_eq!(status.current_step, 2);

        let progress = sync.load_progress(USER, Role::Employer).await.unwrap();
        assert!(!progress.onboarding_completed);
        assert!(!progress.completed_steps.contains(&2));
    }

    #[tokio::test]
    async fn status_propagates_read_failures() {
        let (store, sync) = setup();
        store.set_reads_failing(true);
        assert_matches!(
            sync.onboarding_status(USER, Role::JobSeeker).await,
            Err(CoreError::Persistence(_))
        );
    }
}
