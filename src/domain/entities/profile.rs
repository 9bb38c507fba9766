use crate::domain::value_objects::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user settings row. The primary key is the auth user id, so a user has
/// at most one profile and writes are upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: RecordId,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn empty(user_id: RecordId) -> Self {
        Self {
            id: user_id,
            full_name: String::new(),
            avatar_url: None,
            updated_at: Utc::now(),
        }
    }
}
