pub mod analytics_service;
pub mod auth_service;
pub mod order_service;
pub mod post_service;
pub mod settings_service;

pub use analytics_service::{AnalyticsService, MonthlyPoint, SalesOverview};
pub use auth_service::{resolve_confirm_link, AuthService, ConfirmRoute, SessionWatcher};
pub use order_service::OrderService;
pub use post_service::{CommentView, PostFeed, PostService, PostView};
pub use settings_service::SettingsService;
