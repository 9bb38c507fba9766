//! Walks the order dashboard flow against the in-process backend: sign in,
//! open the live view, mutate the table and watch the view follow.

use shopdesk::domain::entities::{NewOrder, OrderChanges};
use shopdesk::{AppConfig, AppState, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    shopdesk::init_logging();

    let config = AppConfig::from_env();
    let (state, backend) = AppState::with_memory_backend(config)?;

    backend.register_confirmed("demo@example.com", "demo-password").await;
    let session = state.auth.sign_in("demo@example.com", "demo-password").await?;
    let user_id = session.user.id.clone();
    info!(email = %session.user.email, "signed in");

    let live = state.orders.live_orders().await?;

    let order = state
        .orders
        .create_order(
            &user_id,
            NewOrder {
                name: "Emily Williams".to_string(),
                address: "324 Main Avenue".to_string(),
                city: "New York".to_string(),
                zip_code: "11990".to_string(),
                price: 34.0,
            },
        )
        .await?;
    sleep(Duration::from_millis(50)).await;
    info!(rows = live.len().await, "after create");

    state
        .orders
        .update_order(
            &order.id,
            OrderChanges {
                price: Some(75.0),
                ..OrderChanges::default()
            },
        )
        .await?;
    sleep(Duration::from_millis(50)).await;
    for row in live.snapshot().await {
        info!(name = %row.name, price = row.price, "live row");
    }

    let overview = state.analytics.overview().await?;
    info!(
        total_orders = overview.total_orders,
        total_revenue = overview.total_revenue,
        "overview"
    );

    state.orders.delete_order(&order.id).await?;
    sleep(Duration::from_millis(50)).await;
    info!(rows = live.len().await, "after delete");

    drop(live);
    state.auth.sign_out().await?;
    Ok(())
}
