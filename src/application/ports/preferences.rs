use crate::shared::error::AppError;
use async_trait::async_trait;

/// Small device-local key/value store for view preferences (the browser's
/// localStorage in the original deployment).
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
