use crate::domain::value_objects::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sign-in ledger row linking an auth user to their domain data. Upserted on
/// every successful sign-in, keyed by email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: RecordId,
    pub user_id: RecordId,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ClientRecord {
    pub fn new(user_id: RecordId, email: String) -> Self {
        Self {
            id: RecordId::generate(),
            user_id,
            email,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
