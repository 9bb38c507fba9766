use crate::application::ports::auth_gateway::{AuthGateway, SessionEvent};
use crate::application::ports::repositories::ClientRepository;
use crate::domain::entities::{AuthUser, ClientRecord, Session};
use crate::shared::error::AppError;
use crate::shared::validation::{validate_email, validate_password};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Where the app should route after following an emailed confirmation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmRoute {
    /// Password recovery: collect a new password, carrying the token along.
    UpdatePassword { token: String },
    /// Email verified; back to sign-in with a success notice.
    SignInVerified,
    /// Anything else is treated as an invalid link.
    SignInInvalid,
}

pub fn resolve_confirm_link(kind: Option<&str>, token: Option<&str>) -> ConfirmRoute {
    match (kind, token) {
        (Some("recovery"), Some(token)) if !token.is_empty() => ConfirmRoute::UpdatePassword {
            token: token.to_string(),
        },
        (Some("signup"), Some(token)) if !token.is_empty() => ConfirmRoute::SignInVerified,
        _ => ConfirmRoute::SignInInvalid,
    }
}

pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    clients: Arc<dyn ClientRepository>,
}

impl AuthService {
    pub fn new(gateway: Arc<dyn AuthGateway>, clients: Arc<dyn ClientRepository>) -> Self {
        Self { gateway, clients }
    }

    /// Signs in and records the client in the sign-in ledger. A failed ledger
    /// upsert is logged but does not fail the sign-in itself.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        validate_email(email)?;
        if password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }

        let session = self.gateway.sign_in(email.trim(), password).await?;

        let client = ClientRecord::new(session.user.id.clone(), session.user.email.clone());
        match self.clients.upsert_by_email(&client).await {
            Ok(_) => info!(email = %session.user.email, "client sign-in recorded"),
            Err(err) => warn!(%err, "failed to record client sign-in"),
        }

        Ok(session)
    }

    /// Registers a new account. The account stays unconfirmed until the user
    /// follows the emailed link, so no session is returned here.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthUser, AppError> {
        if password != confirm_password {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }
        validate_email(email)?;
        validate_password(password)?;

        self.gateway.sign_up(email.trim(), password).await
    }

    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.gateway.sign_out().await
    }

    pub async fn request_password_reset(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), AppError> {
        validate_email(email)?;
        self.gateway
            .request_password_reset(email.trim(), redirect_to)
            .await
    }

    /// Sets a new password for the recovery session, then signs the user out
    /// so they re-authenticate with it.
    pub async fn update_password(
        &self,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AppError> {
        if new_password != confirm_password {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }
        validate_password(new_password)?;

        self.gateway.update_password(new_password).await?;
        self.gateway.sign_out().await
    }

    pub async fn current_session(&self) -> Result<Option<Session>, AppError> {
        self.gateway.current_session().await
    }

    /// Starts a watcher that mirrors the provider's session state: one
    /// initial read, then the sign-in/sign-out event stream.
    pub async fn watch_sessions(&self) -> SessionWatcher {
        SessionWatcher::start(Arc::clone(&self.gateway)).await
    }
}

/// Holds the latest known session, kept current by the gateway's event
/// stream. Dropping the watcher stops the listener.
pub struct SessionWatcher {
    session: Arc<RwLock<Option<Session>>>,
    task: JoinHandle<()>,
}

impl SessionWatcher {
    pub(crate) async fn start(gateway: Arc<dyn AuthGateway>) -> Self {
        // Subscribe before the initial read so a sign-in racing the read is
        // not lost.
        let mut events = gateway.session_events();

        let initial = match gateway.current_session().await {
            Ok(session) => session,
            Err(err) => {
                // Same policy as the original shell: an unreadable session is
                // treated as signed-out, not as a fatal error.
                warn!(%err, "failed to read current session, assuming signed out");
                None
            }
        };

        let session = Arc::new(RwLock::new(initial));
        let shared = Arc::clone(&session);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::SignedIn(next)) => {
                        *shared.write().await = Some(next);
                    }
                    Ok(SessionEvent::SignedOut) => {
                        *shared.write().await = None;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "session event stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self { session, task }
    }

    pub async fn current(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub fn close(&self) {
        self.task.abort();
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.close();
    }
}
