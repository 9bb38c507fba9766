use crate::domain::entities::{ClientRecord, Comment, Order, Post, Profile};
use crate::domain::value_objects::RecordId;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Sort direction for bulk reads, equivalent to `ORDER BY created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Ascending,
    Descending,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<Order, AppError>;
    /// Full-row update by id. Unknown ids are `NotFound`.
    async fn update(&self, order: &Order) -> Result<Order, AppError>;
    async fn delete(&self, id: &RecordId) -> Result<(), AppError>;
    async fn get(&self, id: &RecordId) -> Result<Option<Order>, AppError>;
    /// First order matching the customer name, oldest first.
    async fn find_by_name(&self, name: &str) -> Result<Option<Order>, AppError>;
    async fn list(&self, dir: SortDir) -> Result<Vec<Order>, AppError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: &Post) -> Result<Post, AppError>;
    async fn update(&self, post: &Post) -> Result<Post, AppError>;
    /// Deleting a post also removes its comments (the backend cascades).
    async fn delete(&self, id: &RecordId) -> Result<(), AppError>;
    async fn get(&self, id: &RecordId) -> Result<Option<Post>, AppError>;
    async fn list(&self, dir: SortDir) -> Result<Vec<Post>, AppError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: &Comment) -> Result<Comment, AppError>;
    async fn delete(&self, id: &RecordId) -> Result<(), AppError>;
    /// Comments for one post, oldest first.
    async fn list_by_post(&self, post_id: &RecordId) -> Result<Vec<Comment>, AppError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Insert-or-update keyed by email (`ON CONFLICT (email)`).
    async fn upsert_by_email(&self, client: &ClientRecord) -> Result<ClientRecord, AppError>;
    async fn find_by_user_id(&self, user_id: &RecordId) -> Result<Option<ClientRecord>, AppError>;
    async fn get(&self, id: &RecordId) -> Result<Option<ClientRecord>, AppError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert-or-update keyed by the auth user id.
    async fn upsert(&self, profile: &Profile) -> Result<Profile, AppError>;
    async fn get(&self, user_id: &RecordId) -> Result<Option<Profile>, AppError>;
}
