pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use shared::{AppConfig, AppError, Result};
pub use state::{AppState, BackendPorts};

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Safe to call once per process; later calls are ignored.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shopdesk=debug,info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}
