use bytes::Bytes;
use shopdesk::domain::entities::{NewOrder, OrderChanges};
use shopdesk::{AppConfig, AppState};
use std::time::Duration;
use tokio::time::sleep;

fn order_fields(name: &str, price: f64) -> NewOrder {
    NewOrder {
        name: name.to_string(),
        address: "324 Main Avenue".to_string(),
        city: "New York".to_string(),
        zip_code: "11990".to_string(),
        price,
    }
}

#[tokio::test]
async fn sign_in_to_live_dashboard_flow() {
    let (state, backend) =
        AppState::with_memory_backend(AppConfig::default()).expect("state builds");
    backend.register_confirmed("emily@example.com", "secret1").await;

    let session = state
        .auth
        .sign_in("emily@example.com", "secret1")
        .await
        .expect("sign in");
    let user_id = session.user.id.clone();

    // The live view tracks creates, updates and deletes without refetching.
    let live = state.orders.live_orders().await.expect("live view");
    assert_eq!(backend.active_realtime_subscriptions(), 1);

    let first = state
        .orders
        .create_order(&user_id, order_fields("Emily Williams", 34.0))
        .await
        .expect("first order");
    let second = state
        .orders
        .create_order(&user_id, order_fields("James Smith", 120.0))
        .await
        .expect("second order");
    sleep(Duration::from_millis(50)).await;
    assert_eq!(live.len().await, 2);

    state
        .orders
        .update_order(
            &first.id,
            OrderChanges {
                price: Some(50.0),
                ..OrderChanges::default()
            },
        )
        .await
        .expect("price update");
    state.orders.delete_order(&second.id).await.expect("delete");
    sleep(Duration::from_millis(50)).await;

    let rows = live.snapshot().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].price, 50.0);

    let overview = state.analytics.overview().await.expect("overview");
    assert_eq!(overview.total_orders, 1);
    assert_eq!(overview.total_revenue, 50.0);

    // Closing the dashboard releases the change-feed subscription.
    drop(live);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(backend.active_realtime_subscriptions(), 0);
}

#[tokio::test]
async fn feed_and_settings_flow() {
    let (state, backend) =
        AppState::with_memory_backend(AppConfig::default()).expect("state builds");
    backend.register_confirmed("emily@example.com", "secret1").await;
    let session = state
        .auth
        .sign_in("emily@example.com", "secret1")
        .await
        .expect("sign in");
    let user_id = session.user.id.clone();

    let post = state
        .posts
        .create_post(&user_id, "Opening week", "We are live!")
        .await
        .expect("post");
    state
        .posts
        .add_comment(&user_id, &post.id, "Congrats!")
        .await
        .expect("comment");

    let feed = state.posts.load_feed().await.expect("feed");
    assert_eq!(feed.posts().len(), 1);
    assert_eq!(feed.comments_for(&post.id).len(), 1);

    let views = state.posts.list_posts().await.expect("views");
    assert_eq!(
        views[0].author_email.as_deref(),
        Some("emily@example.com")
    );

    let url = state
        .settings
        .upload_avatar(&user_id, "me.png", Bytes::from_static(b"png"))
        .await
        .expect("avatar");
    let profile = state.settings.load_profile(&user_id).await.expect("profile");
    assert_eq!(profile.avatar_url.as_deref(), Some(url.as_str()));
}
