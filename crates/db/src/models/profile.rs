//! Profile entity model.

use sqlx::FromRow;
use temu_core::error::CoreError;
use temu_core::onboarding::ProfileRecord;
use temu_core::roles::Role;
use temu_core::types::{DbId, Timestamp};

/// A row from the `profiles` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub fields: serde_json::Value,
    pub onboarding_completed: bool,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ProfileRow> for ProfileRecord {
    type Error = CoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = Role::from_str_db(&row.role)?;
        let fields = match row.fields {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                return Err(CoreError::Internal(format!(
                    "Profile {} has non-object fields: {other}",
                    row.id
                )))
            }
        };
        Ok(ProfileRecord {
            user_id: row.user_id,
            role,
            fields,
            onboarding_completed: row.onboarding_completed,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
