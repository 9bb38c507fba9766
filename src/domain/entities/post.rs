use crate::domain::value_objects::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A feed post authored by a signed-in client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: RecordId,
    pub client_id: RecordId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(client_id: RecordId, title: String, content: String) -> Self {
        Self {
            id: RecordId::generate(),
            client_id,
            title,
            content,
            created_at: Utc::now(),
        }
    }
}
