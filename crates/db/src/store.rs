//! [`ProfileStore`] backed by PostgreSQL.

use async_trait::async_trait;
use temu_core::error::CoreError;
use temu_core::onboarding::{FieldPatch, ProfileRecord, ProfileStore};
use temu_core::roles::Role;
use temu_core::types::DbId;

use crate::repositories::ProfileRepo;
use crate::DbPool;

#[derive(Debug, Clone)]
pub struct PgProfileStore {
    pool: DbPool,
}

impl PgProfileStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn persistence(op: &'static str) -> impl FnOnce(sqlx::Error) -> CoreError {
    move |e| {
        tracing::error!(error = %e, op, "Profile store query failed");
        CoreError::Persistence(format!("{op} failed: {e}"))
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn fetch_profile(
        &self,
        user_id: DbId,
        role: Role,
    ) -> Result<Option<ProfileRecord>, CoreError> {
        ProfileRepo::find_by_user_role(&self.pool, user_id, role.as_str())
            .await
            .map_err(persistence("fetch_profile"))?
            .map(ProfileRecord::try_from)
            .transpose()
    }

    async fn upsert_profile_fields(
        &self,
        user_id: DbId,
        role: Role,
        patch: &FieldPatch,
    ) -> Result<ProfileRecord, CoreError> {
        let set = serde_json::Value::Object(patch.set.clone());
        let row = ProfileRepo::upsert_fields(&self.pool, user_id, role.as_str(), &set, &patch.clear)
            .await
            .map_err(persistence("upsert_profile_fields"))?;
        ProfileRecord::try_from(row)
    }

    async fn mark_profile_complete(&self, user_id: DbId, role: Role) -> Result<(), CoreError> {
        ProfileRepo::mark_complete(&self.pool, user_id, role.as_str())
            .await
            .map_err(persistence("mark_profile_complete"))?
            .ok_or(CoreError::NotFound {
                entity: "ProfileRecord",
                id: user_id,
            })?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(persistence("health_check"))
    }
}
