use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbTemplate {
    pub id: i64,
    pub name: String,
    /// JSON text; decoded into `Template::data`.
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DbConfigEntry {
    pub key: String,
    pub value: String,
}

/// A named template as handed to callers (a snapshot, not a live row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbTemplate> for Template {
    type Error = StoreError;

    fn try_from(row: DbTemplate) -> Result<Self, Self::Error> {
        let data = serde_json::from_str(&row.data).map_err(|e| {
            StoreError::Unavailable(format!("corrupt data for template {:?}: {e}", row.name))
        })?;
        Ok(Template {
            name: row.name,
            data,
            created_at: row.created_at,
        })
    }
}
