use crate::shared::error::AppError;
use async_trait::async_trait;
use bytes::Bytes;

/// Bucket-scoped blob storage with public URLs, as exposed by the hosted
/// backend's storage client.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        upsert: bool,
    ) -> Result<(), AppError>;

    /// URL resolution is a local computation in the hosted SDK as well; it
    /// never fails and does not confirm the object exists.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
