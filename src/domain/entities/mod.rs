mod client;
mod comment;
mod order;
mod post;
mod profile;
mod session;

pub use client::ClientRecord;
pub use comment::Comment;
pub use order::{NewOrder, Order, OrderChanges};
pub use post::Post;
pub use profile::Profile;
pub use session::{AuthUser, Session};

use crate::domain::value_objects::RecordId;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// A row that can live in a reconciled collection: unique id plus a creation
/// timestamp to order by. Serde bounds let the realtime boundary decode raw
/// payloads into the concrete type.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn record_id(&self) -> &RecordId;
    fn created_at(&self) -> DateTime<Utc>;
}

impl Record for Order {
    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for Post {
    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Record for Comment {
    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
