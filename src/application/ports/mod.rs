pub mod auth_gateway;
pub mod object_storage;
pub mod preferences;
pub mod realtime;
pub mod repositories;

pub use auth_gateway::{AuthGateway, SessionEvent};
pub use object_storage::ObjectStorage;
pub use preferences::PreferenceStore;
pub use realtime::{ChangeEvent, ChangeStream, RawChange, RealtimeGateway, SubscriptionGuard};
pub use repositories::{
    ClientRepository, CommentRepository, OrderRepository, PostRepository, ProfileRepository,
    SortDir,
};
