use crate::domain::value_objects::RecordId;
use serde::{Deserialize, Serialize};

/// The identity portion of a backend session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: RecordId,
    pub email: String,
}

/// Session state as reported by the auth gateway. The client never refreshes
/// or mints tokens itself; it only reads what the gateway currently holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: AuthUser,
}

impl Session {
    pub fn new(user: AuthUser) -> Self {
        Self { user }
    }
}
