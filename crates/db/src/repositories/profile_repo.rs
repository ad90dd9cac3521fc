//! Repository for the `profiles` table.

use sqlx::PgPool;
use temu_core::types::DbId;

use crate::models::profile::ProfileRow;

/// Column list for `profiles` queries.
const COLUMNS: &str = "\
    id, user_id, role, fields, onboarding_completed, \
    completed_at, created_at, updated_at";

/// Reads and writes onboarding profiles, one row per `(user_id, role)`.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Find the profile for a user in one role.
    pub async fn find_by_user_role(
        pool: &PgPool,
        user_id: DbId,
        role: &str,
    ) -> Result<Option<ProfileRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE user_id = $1 AND role = $2");
        sqlx::query_as::<_, ProfileRow>(&query)
            .bind(user_id)
            .bind(role)
            .fetch_optional(pool)
            .await
    }

    /// Replace one step's field set, creating the row on first write.
    ///
    /// Keys in `clear` are removed from the stored object before `set` is
    /// merged in with `||`, so fields owned by other steps are untouched.
    pub async fn upsert_fields(
        pool: &PgPool,
        user_id: DbId,
        role: &str,
        set: &serde_json::Value,
        clear: &[String],
    ) -> Result<ProfileRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO profiles (user_id, role, fields) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, role) DO UPDATE \
             SET fields = (profiles.fields - $4::text[]) || EXCLUDED.fields, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProfileRow>(&query)
            .bind(user_id)
            .bind(role)
            .bind(set)
            .bind(clear)
            .fetch_one(pool)
            .await
    }

    /// Set the completion flag. Returns `None` if the row does not exist.
    ///
    /// `completed_at` keeps the first completion time.
    pub async fn mark_complete(
        pool: &PgPool,
        user_id: DbId,
        role: &str,
    ) -> Result<Option<ProfileRow>, sqlx::Error> {
        let query = format!(
            "UPDATE profiles \
             SET onboarding_completed = TRUE, \
                 completed_at = COALESCE(completed_at, NOW()), \
                 updated_at = NOW() \
             WHERE user_id = $1 AND role = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProfileRow>(&query)
            .bind(user_id)
            .bind(role)
            .fetch_optional(pool)
            .await
    }
}
