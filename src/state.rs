use crate::application::ports::auth_gateway::AuthGateway;
use crate::application::ports::object_storage::ObjectStorage;
use crate::application::ports::preferences::PreferenceStore;
use crate::application::ports::realtime::RealtimeGateway;
use crate::application::ports::repositories::{
    ClientRepository, CommentRepository, OrderRepository, PostRepository, ProfileRepository,
};
use crate::application::services::{
    AnalyticsService, AuthService, OrderService, PostService, SettingsService,
};
use crate::infrastructure::memory::MemoryBackend;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use tracing::info;

/// Everything the services need from a backend, as one bundle so alternate
/// backends plug in at a single seam.
pub struct BackendPorts {
    pub auth: Arc<dyn AuthGateway>,
    pub orders: Arc<dyn OrderRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub realtime: Arc<dyn RealtimeGateway>,
    pub storage: Arc<dyn ObjectStorage>,
    pub preferences: Arc<dyn PreferenceStore>,
}

impl BackendPorts {
    /// Wires every port to one shared in-process backend.
    pub fn from_memory(backend: Arc<MemoryBackend>) -> Self {
        Self {
            auth: backend.clone(),
            orders: backend.clone(),
            posts: backend.clone(),
            comments: backend.clone(),
            clients: backend.clone(),
            profiles: backend.clone(),
            realtime: backend.clone(),
            storage: backend.clone(),
            preferences: backend,
        }
    }
}

/// Shared application state: validated config plus one instance of each
/// service, handed out behind `Arc`s.
pub struct AppState {
    pub config: AppConfig,
    pub auth: Arc<AuthService>,
    pub orders: Arc<OrderService>,
    pub posts: Arc<PostService>,
    pub settings: Arc<SettingsService>,
    pub analytics: Arc<AnalyticsService>,
}

impl AppState {
    pub fn new(config: AppConfig, ports: BackendPorts) -> Result<Self, AppError> {
        config.validate().map_err(AppError::Validation)?;

        let auth = Arc::new(AuthService::new(ports.auth, ports.clients.clone()));
        let orders = Arc::new(OrderService::new(
            ports.orders.clone(),
            ports.clients.clone(),
            ports.realtime.clone(),
            config.feed.page_size,
        ));
        let posts = Arc::new(PostService::new(
            ports.posts,
            ports.comments,
            ports.clients,
            ports.realtime,
            config.feed.page_size,
        ));
        let settings = Arc::new(SettingsService::new(
            ports.profiles,
            ports.storage,
            ports.preferences,
            config.storage.clone(),
        ));
        let analytics = Arc::new(AnalyticsService::new(ports.orders));

        info!(page_size = config.feed.page_size, "application state initialized");
        Ok(Self {
            config,
            auth,
            orders,
            posts,
            settings,
            analytics,
        })
    }

    /// State backed entirely by the in-process backend; tests and the demo
    /// binary start here.
    pub fn with_memory_backend(config: AppConfig) -> Result<(Self, Arc<MemoryBackend>), AppError> {
        let backend = MemoryBackend::with_capacity(config.backend.realtime_channel_capacity);
        let state = Self::new(config, BackendPorts::from_memory(backend.clone()))?;
        Ok((state, backend))
    }
}
