use crate::domain::value_objects::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment attached to a feed post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: RecordId,
    pub post_id: RecordId,
    pub client_id: RecordId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: RecordId, client_id: RecordId, content: String) -> Self {
        Self {
            id: RecordId::generate(),
            post_id,
            client_id,
            content,
            created_at: Utc::now(),
        }
    }
}
