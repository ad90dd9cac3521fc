//! The durable profile record and the store abstraction that owns it.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

/// One user's onboarding submission for one role.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub user_id: DbId,
    pub role: Role,
    pub fields: Map<String, Value>,
    /// Stored completion flag. A cache only: completion is always re-derived
    /// from `fields` before it is trusted.
    pub onboarding_completed: bool,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A partial update of one step's field set.
///
/// `clear` lists every key the step owns; they are removed before `set` is
/// merged, so the stored field set ends up exactly equal to `set`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub set: Map<String, Value>,
    pub clear: Vec<String>,
}

impl FieldPatch {
    /// Apply the patch to an in-memory field map.
    pub fn apply(&self, fields: &mut Map<String, Value>) {
        for key in &self.clear {
            fields.remove(key);
        }
        for (key, value) in &self.set {
            fields.insert(key.clone(), value.clone());
        }
    }
}

/// Database collaborator for profile records.
///
/// Implementations map their native failures to [`CoreError::Persistence`].
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the record for `(user_id, role)`, `None` when none exists yet.
    async fn fetch_profile(
        &self,
        user_id: DbId,
        role: Role,
    ) -> Result<Option<ProfileRecord>, CoreError>;

    /// Apply `patch`, creating the record if it does not exist.
    async fn upsert_profile_fields(
        &self,
        user_id: DbId,
        role: Role,
        patch: &FieldPatch,
    ) -> Result<ProfileRecord, CoreError>;

    /// Set the completion flag. Fails with `NotFound` when there is no record.
    async fn mark_profile_complete(&self, user_id: DbId, role: Role) -> Result<(), CoreError>;

    /// Cheap reachability check for the health endpoint.
    async fn health_check(&self) -> Result<(), CoreError>;
}
