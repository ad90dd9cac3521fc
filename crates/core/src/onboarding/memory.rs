//! In-process [`ProfileStore`] for local development and tests.
//!
//! Supports injecting read and write failures so retry paths can be
//! exercised without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Map;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

use super::profile::{FieldPatch, ProfileRecord, ProfileStore};

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    records: RwLock<HashMap<(DbId, Role), ProfileRecord>>,
    failing_writes: AtomicUsize,
    failing_reads: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` writes fail with a persistence error.
    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Make every read (and the health check) fail until switched off again.
    pub fn set_reads_failing(&self, failing: bool) {
        self.failing_reads.store(failing, Ordering::SeqCst);
    }

    /// Number of write attempts that reached the store, failed or not.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Overwrite a record directly, bypassing the patch semantics.
    pub async fn insert(&self, record: ProfileRecord) {
        self.records
            .write()
            .await
            .insert((record.user_id, record.role), record);
    }

    fn take_write_failure(&self) -> bool {
        self.failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check_write(&self) -> Result<(), CoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.take_write_failure() {
            return Err(CoreError::Persistence(
                "injected write failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch_profile(
        &self,
        user_id: DbId,
        role: Role,
    ) -> Result<Option<ProfileRecord>, CoreError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence("injected read failure".to_string()));
        }
        Ok(self.records.read().await.get(&(user_id, role)).cloned())
    }

    async fn upsert_profile_fields(
        &self,
        user_id: DbId,
        role: Role,
        patch: &FieldPatch,
    ) -> Result<ProfileRecord, CoreError> {
        self.check_write()?;
        let now = chrono::Utc::now();
        let mut records = self.records.write().await;
        let record = records
            .entry((user_id, role))
            .or_insert_with(|| ProfileRecord {
                user_id,
                role,
                fields: Map::new(),
                onboarding_completed: false,
                completed_at: None,
                created_at: now,
                updated_at: now,
            });
        patch.apply(&mut record.fields);
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn mark_profile_complete(&self, user_id: DbId, role: Role) -> Result<(), CoreError> {
        self.check_write()?;
        let now = chrono::Utc::now();
        let mut records = self.records.write().await;
        let record = records.get_mut(&(user_id, role)).ok_or(CoreError::NotFound {
            entity: "ProfileRecord",
            id: user_id,
        })?;
        record.onboarding_completed = true;
        record.completed_at.get_or_insert(now);
        record.updated_at = now;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence("injected read failure".to_string()));
        }
        Ok(())
    }
}
