use crate::domain::entities::{AuthUser, Session};
use crate::shared::error::AppError;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Emitted by the gateway whenever session state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
}

/// The hosted identity provider's client surface. Token issuance, refresh and
/// email confirmation all happen on the other side of this trait.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError>;
    /// Registers a new account. The returned user is unconfirmed until the
    /// emailed link is followed.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AppError>;
    async fn sign_out(&self) -> Result<(), AppError>;
    async fn request_password_reset(&self, email: &str, redirect_to: &str)
        -> Result<(), AppError>;
    /// Requires a live session (the user arrived through a recovery link).
    async fn update_password(&self, new_password: &str) -> Result<(), AppError>;
    async fn current_session(&self) -> Result<Option<Session>, AppError>;
    fn session_events(&self) -> broadcast::Receiver<SessionEvent>;
}
