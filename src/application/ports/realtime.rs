use crate::domain::entities::Record;
use crate::domain::value_objects::RecordId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// One row-level change notification, already decoded into a schema type.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<T> {
    Created(T),
    Updated(T),
    /// Delete payloads carry only the removed row's id.
    Deleted(RecordId),
}

/// Wire shape of a change notification as the transport delivers it:
/// `{eventType, new, old}` with untyped rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChange {
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(default)]
    pub new: Option<serde_json::Value>,
    #[serde(default)]
    pub old: Option<serde_json::Value>,
}

impl<T: Record> ChangeEvent<T> {
    /// Validates a raw payload into a typed event. Rows that do not match the
    /// schema are rejected here instead of leaking untyped data inward.
    pub fn from_raw(raw: RawChange) -> Result<Self, AppError> {
        match raw.event_type.as_str() {
            "INSERT" => {
                let row = required_row(raw.new, "INSERT")?;
                Ok(ChangeEvent::Created(serde_json::from_value(row)?))
            }
            "UPDATE" => {
                let row = required_row(raw.new, "UPDATE")?;
                Ok(ChangeEvent::Updated(serde_json::from_value(row)?))
            }
            "DELETE" => {
                let row = required_row(raw.old, "DELETE")?;
                let id = row
                    .get("id")
                    .and_then(|value| value.as_str())
                    .ok_or_else(|| {
                        AppError::InvalidInput("DELETE payload is missing an id".to_string())
                    })?;
                Ok(ChangeEvent::Deleted(RecordId::new(id)))
            }
            other => Err(AppError::InvalidInput(format!(
                "Unknown change event type: {other}"
            ))),
        }
    }

    pub fn to_raw(&self) -> Result<RawChange, AppError> {
        let raw = match self {
            ChangeEvent::Created(record) => RawChange {
                event_type: "INSERT".to_string(),
                new: Some(serde_json::to_value(record)?),
                old: None,
            },
            ChangeEvent::Updated(record) => RawChange {
                event_type: "UPDATE".to_string(),
                new: Some(serde_json::to_value(record)?),
                old: None,
            },
            ChangeEvent::Deleted(id) => RawChange {
                event_type: "DELETE".to_string(),
                new: None,
                old: Some(serde_json::json!({ "id": id.as_str() })),
            },
        };
        Ok(raw)
    }
}

fn required_row(
    row: Option<serde_json::Value>,
    event_type: &str,
) -> Result<serde_json::Value, AppError> {
    row.ok_or_else(|| AppError::InvalidInput(format!("{event_type} payload is missing a row")))
}

/// Called when the stream is dropped; releases the server-side channel.
pub struct SubscriptionGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// A scoped handle on one table's change feed. Dropping the stream runs the
/// guard, so listeners cannot leak past the owning view.
pub struct ChangeStream<T> {
    rx: broadcast::Receiver<ChangeEvent<T>>,
    _guard: SubscriptionGuard,
}

impl<T: Clone> ChangeStream<T> {
    pub fn new(rx: broadcast::Receiver<ChangeEvent<T>>, guard: SubscriptionGuard) -> Self {
        Self { rx, _guard: guard }
    }

    pub async fn recv(&mut self) -> Result<ChangeEvent<T>, broadcast::error::RecvError> {
        self.rx.recv().await
    }
}

#[async_trait]
pub trait RealtimeGateway: Send + Sync {
    async fn subscribe_orders(
        &self,
    ) -> Result<ChangeStream<crate::domain::entities::Order>, AppError>;
    async fn subscribe_posts(&self)
        -> Result<ChangeStream<crate::domain::entities::Post>, AppError>;
    async fn subscribe_comments(
        &self,
    ) -> Result<ChangeStream<crate::domain::entities::Comment>, AppError>;
}
