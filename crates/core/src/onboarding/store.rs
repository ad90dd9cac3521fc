//! Wizard state store: session-scoped form data and derived completion.
//!
//! One store exists per wizard session. It is constructed explicitly on
//! wizard entry and dropped (or [`reset`](WizardStateStore::reset)) on
//! logout. It never performs I/O.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::error::CoreError;

use super::steps::{StepDefinition, StepRegistry};
use super::validation::{validate_step, FieldErrors};

/// Ids of the steps whose fields currently pass validation.
pub type CompletionState = BTreeSet<u8>;

/// The subset of `data` owned by `step`.
pub fn step_fields(step: &StepDefinition, data: &Map<String, Value>) -> Map<String, Value> {
    step.data_keys
        .iter()
        .filter_map(|key| data.get(*key).map(|v| (key.to_string(), v.clone())))
        .collect()
}

/// Derive the completion set of every step from field data alone.
pub fn derive_completion(registry: &StepRegistry, data: &Map<String, Value>) -> CompletionState {
    registry
        .steps()
        .iter()
        .filter(|step| validate_step(step, &step_fields(step, data)).valid)
        .map(|step| step.id)
        .collect()
}

/// In-memory state of one wizard session.
#[derive(Debug, Clone)]
pub struct WizardStateStore {
    registry: &'static StepRegistry,
    data: Map<String, Value>,
    completed: CompletionState,
    drafts: BTreeMap<u8, Map<String, Value>>,
}

impl WizardStateStore {
    /// An empty store. Optional steps count as complete from the start.
    pub fn new(registry: &'static StepRegistry) -> Self {
        let data = Map::new();
        let completed = derive_completion(registry, &data);
        Self {
            registry,
            data,
            completed,
            drafts: BTreeMap::new(),
        }
    }

    pub fn registry(&self) -> &'static StepRegistry {
        self.registry
    }

    /// Committed data owned by one step.
    pub fn data(&self, step_id: u8) -> Result<Map<String, Value>, CoreError> {
        let step = self.registry.step(step_id)?;
        Ok(step_fields(step, &self.data))
    }

    /// All committed data across steps.
    pub fn all_data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Merge `values` into the step's fields and re-derive its completion.
    ///
    /// Keys the step does not own are rejected; a `null` value removes the
    /// field. Either every key is applied or none is.
    pub fn update_data(&mut self, step_id: u8, values: Map<String, Value>) -> Result<(), CoreError> {
        let step = self.registry.step(step_id)?;
        reject_foreign_keys(step, &values)?;

        let mut next = self.data.clone();
        for (key, value) in values {
            if value.is_null() {
                next.remove(&key);
            } else {
                next.insert(key, value);
            }
        }
        self.data = next;
        self.recompute(step);
        Ok(())
    }

    /// Replace all data with a freshly loaded profile and re-derive every step.
    ///
    /// Fields no step owns are dropped. Drafts are kept so unsaved input
    /// survives a reload of the backing record.
    pub fn replace_all(&mut self, fields: Map<String, Value>) {
        let data: Map<String, Value> = fields
            .into_iter()
            .filter(|(key, value)| {
                !value.is_null() && self.registry.steps().iter().any(|s| s.owns(key))
            })
            .collect();
        let completed = derive_completion(self.registry, &data);
        self.data = data;
        self.completed = completed;
    }

    /// Mark a step complete. Fails if its data does not validate.
    pub fn mark_complete(&mut self, step_id: u8) -> Result<(), CoreError> {
        let step = self.registry.step(step_id)?;
        let result = validate_step(step, &step_fields(step, &self.data));
        if !result.valid {
            return Err(CoreError::ValidationFailed(result.field_errors));
        }
        self.completed.insert(step_id);
        Ok(())
    }

    /// Reopen a step for editing. It stays incomplete until its data is next
    /// updated or reloaded.
    pub fn mark_incomplete(&mut self, step_id: u8) -> Result<(), CoreError> {
        self.registry.step(step_id)?;
        self.completed.remove(&step_id);
        Ok(())
    }

    pub fn is_step_complete(&self, step_id: u8) -> bool {
        self.completed.contains(&step_id)
    }

    pub fn completed_steps(&self) -> &CompletionState {
        &self.completed
    }

    /// Keep unsaved form input for a step so a failed save loses nothing.
    pub fn stash_draft(&mut self, step_id: u8, values: Map<String, Value>) {
        self.drafts.insert(step_id, values);
    }

    pub fn draft(&self, step_id: u8) -> Option<&Map<String, Value>> {
        self.drafts.get(&step_id)
    }

    pub fn clear_draft(&mut self, step_id: u8) {
        self.drafts.remove(&step_id);
    }

    /// Clear data, completion and drafts (logout or wizard restart).
    pub fn reset(&mut self) {
        *self = Self::new(self.registry);
    }

    fn recompute(&mut self, step: &StepDefinition) {
        if validate_step(step, &step_fields(step, &self.data)).valid {
            self.completed.insert(step.id);
        } else {
            self.completed.remove(&step.id);
        }
    }
}

/// Fail with a per-field error for every key `step` does not own.
pub(crate) fn reject_foreign_keys(
    step: &StepDefinition,
    values: &Map<String, Value>,
) -> Result<(), CoreError> {
    let foreign: FieldErrors = values
        .keys()
        .filter(|key| !step.owns(key))
        .map(|key| (key.clone(), format!("Not a field of step '{}'", step.route_segment)))
        .collect();
    if foreign.is_empty() {
        Ok(())
    } else {
        Err(CoreError::ValidationFailed(foreign))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::roles::Role;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object literal")
    }

    fn store() -> WizardStateStore {
        WizardStateStore::new(StepRegistry::for_role(Role::JobSeeker))
    }

    fn assert_completion_is_derived(store: &WizardStateStore) {
        for step in store.registry().steps() {
            let expected = validate_step(step, &store.data(step.id).unwrap()).valid;
            assert_eq!(store.is_step_complete(step.id), expected, "step {}", step.id);
        }
    }

    #[test]
    fn fresh_store_only_has_optional_steps_complete() {
        let store = store();
        assert_eq!(store.completed_steps().iter().copied().collect::<Vec<_>>(), vec![5, 7]);
        assert!(store.all_data().is_empty());
    }

    #[test]
    fn update_derives_completion_both_ways() {
        let mut store = store();
        store
            .update_data(4, obj(json!({ "experienceLevel": "junior" })))
            .unwrap();
        assert!(store.is_step_complete(4));
        assert_completion_is_derived(&store);

        store
            .update_data(4, obj(json!({ "experienceLevel": "wizard" })))
            .unwrap();
        assert!(!store.is_step_complete(4));
        assert_completion_is_derived(&store);
    }

    #[test]
    fn partial_updates_merge_and_null_removes() {
        let mut store = store();
        store
            .update_data(2, obj(json!({ "province": "DKI Jakarta", "city": "Jakarta" })))
            .unwrap();
        store
            .update_data(2, obj(json!({ "district": "Menteng", "addressDetail": "Jl. A" })))
            .unwrap();
        assert!(store.is_step_complete(2));

        store.update_data(2, obj(json!({ "city": null }))).unwrap();
        let data = store.data(2).unwrap();
        assert!(!data.contains_key("city"));
        assert_eq!(data["province"], "DKI Jakarta");
        assert!(!store.is_step_complete(2));
        assert_completion_is_derived(&store);
    }

    #[test]
    fn foreign_keys_are_rejected_atomically() {
        let mut store = store();
        let err = store
            .update_data(4, obj(json!({ "experienceLevel": "mid", "city": "Bandung" })))
            .unwrap_err();
        assert_matches!(err, CoreError::ValidationFailed(fields) if fields.contains_key("city"));
        assert!(store.all_data().is_empty());
        assert!(!store.is_step_complete(4));
    }

    #[test]
    fn data_is_restricted_to_owned_keys() {
        let mut store = store();
        store.replace_all(obj(json!({
            "experienceLevel": "senior",
            "skills": ["rust"],
            "legacyField": true
        })));
        assert_eq!(store.data(4).unwrap(), obj(json!({ "experienceLevel": "senior" })));
        assert!(!store.all_data().contains_key("legacyField"));
        assert_completion_is_derived(&store);
    }

    #[test]
    fn mark_complete_requires_valid_data() {
        let mut store = store();
        assert_matches!(store.mark_complete(4), Err(CoreError::ValidationFailed(_)));
        assert!(!store.is_step_complete(4));

        store
            .update_data(4, obj(json!({ "experienceLevel": "lead" })))
            .unwrap();
        store.mark_incomplete(4).unwrap();
        assert!(!store.is_step_complete(4));
        store.mark_complete(4).unwrap();
        assert!(store.is_step_complete(4));
        assert_matches!(store.mark_complete(9), Err(CoreError::UnknownStep(_)));
    }

    #[test]
    fn drafts_survive_until_cleared() {
        let mut store = store();
        store.stash_draft(1, obj(json!({ "firstName": "Andi" })));
        assert_eq!(store.draft(1).unwrap()["firstName"], "Andi");
        assert!(store.all_data().is_empty());

        store.replace_all(Map::new());
        assert!(store.draft(1).is_some());

        store.clear_draft(1);
        assert!(store.draft(1).is_none());
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = store();
        store
            .update_data(6, obj(json!({ "skills": ["sql"] })))
            .unwrap();
        store.stash_draft(1, obj(json!({ "firstName": "Andi" })));
        store.reset();
        assert!(store.all_data().is_empty());
        assert!(store.draft(1).is_none());
        assert!(!store.is_step_complete(6));
        assert_completion_is_derived(&store);
    }
}
