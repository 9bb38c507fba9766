use crate::application::ports::auth_gateway::{AuthGateway, SessionEvent};
use crate::application::ports::object_storage::ObjectStorage;
use crate::application::ports::preferences::PreferenceStore;
use crate::application::ports::realtime::{
    ChangeEvent, ChangeStream, RealtimeGateway, SubscriptionGuard,
};
use crate::application::ports::repositories::{
    ClientRepository, CommentRepository, OrderRepository, PostRepository, ProfileRepository,
    SortDir,
};
use crate::domain::entities::{
    AuthUser, ClientRecord, Comment, Order, Post, Profile, Record, Session,
};
use crate::domain::value_objects::RecordId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

struct Account {
    user_id: RecordId,
    password: String,
    confirmed: bool,
}

/// In-process backend implementing every port against `HashMap` tables. Used
/// by the test suite and the demo binary in place of the hosted project.
///
/// Change notifications are round-tripped through the raw wire shape before
/// delivery, so consumers exercise the same decode path as the real
/// transport.
pub struct MemoryBackend {
    base_url: String,
    orders: RwLock<HashMap<RecordId, Order>>,
    posts: RwLock<HashMap<RecordId, Post>>,
    comments: RwLock<HashMap<RecordId, Comment>>,
    clients: RwLock<HashMap<RecordId, ClientRecord>>,
    profiles: RwLock<HashMap<RecordId, Profile>>,
    order_events: broadcast::Sender<ChangeEvent<Order>>,
    post_events: broadcast::Sender<ChangeEvent<Post>>,
    comment_events: broadcast::Sender<ChangeEvent<Comment>>,
    accounts: RwLock<HashMap<String, Account>>,
    session: RwLock<Option<Session>>,
    session_events: broadcast::Sender<SessionEvent>,
    objects: RwLock<HashMap<String, Bytes>>,
    preferences: RwLock<HashMap<String, String>>,
    subscriptions: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Self::with_capacity(256)
    }

    pub fn with_capacity(channel_capacity: usize) -> Arc<Self> {
        let (order_events, _) = broadcast::channel(channel_capacity);
        let (post_events, _) = broadcast::channel(channel_capacity);
        let (comment_events, _) = broadcast::channel(channel_capacity);
        let (session_events, _) = broadcast::channel(channel_capacity);

        Arc::new(Self {
            base_url: "http://localhost:54321".to_string(),
            orders: RwLock::new(HashMap::new()),
            posts: RwLock::new(HashMap::new()),
            comments: RwLock::new(HashMap::new()),
            clients: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            order_events,
            post_events,
            comment_events,
            accounts: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            session_events,
            objects: RwLock::new(HashMap::new()),
            preferences: RwLock::new(HashMap::new()),
            subscriptions: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Creates an account that can sign in immediately, skipping the email
    /// confirmation step.
    pub async fn register_confirmed(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: RecordId::generate(),
            email: email.to_string(),
        };
        self.accounts.write().await.insert(
            email.to_string(),
            Account {
                user_id: user.id.clone(),
                password: password.to_string(),
                confirmed: true,
            },
        );
        user
    }

    /// Marks an account confirmed, as following the emailed link would.
    pub async fn confirm_email(&self, email: &str) -> bool {
        match self.accounts.write().await.get_mut(email) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Live change-feed listeners across all tables.
    pub fn active_realtime_subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    fn open_stream<T: Record>(
        &self,
        tx: &broadcast::Sender<ChangeEvent<T>>,
    ) -> ChangeStream<T> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let counter = Arc::clone(&self.subscriptions);
        ChangeStream::new(
            tx.subscribe(),
            SubscriptionGuard::new(move || {
                counter.fetch_sub(1, Ordering::SeqCst);
            }),
        )
    }
}

/// Encodes to the wire shape and decodes back before broadcasting. A send
/// with no listeners is not an error.
fn publish<T: Record>(
    tx: &broadcast::Sender<ChangeEvent<T>>,
    event: ChangeEvent<T>,
) -> Result<(), AppError> {
    let raw = event.to_raw()?;
    let typed = ChangeEvent::from_raw(raw)?;
    if tx.send(typed).is_err() {
        debug!("change published with no listeners");
    }
    Ok(())
}

fn sort_by_created<T: Record>(rows: &mut [T], dir: SortDir) {
    rows.sort_by(|a, b| match dir {
        SortDir::Ascending => a.created_at().cmp(&b.created_at()),
        SortDir::Descending => b.created_at().cmp(&a.created_at()),
    });
}

#[async_trait]
impl OrderRepository for MemoryBackend {
    async fn insert(&self, order: &Order) -> Result<Order, AppError> {
        self.orders
            .write()
            .await
            .insert(order.id.clone(), order.clone());
        publish(&self.order_events, ChangeEvent::Created(order.clone()))?;
        Ok(order.clone())
    }

    async fn update(&self, order: &Order) -> Result<Order, AppError> {
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order.id) {
            return Err(AppError::NotFound(format!("Order not found: {}", order.id)));
        }
        orders.insert(order.id.clone(), order.clone());
        drop(orders);
        publish(&self.order_events, ChangeEvent::Updated(order.clone()))?;
        Ok(order.clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), AppError> {
        if self.orders.write().await.remove(id).is_some() {
            publish(&self.order_events, ChangeEvent::<Order>::Deleted(id.clone()))?;
        }
        Ok(())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Order>, AppError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Order>, AppError> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|order| order.name == name)
            .min_by_key(|order| order.created_at)
            .cloned())
    }

    async fn list(&self, dir: SortDir) -> Result<Vec<Order>, AppError> {
        let mut rows: Vec<Order> = self.orders.read().await.values().cloned().collect();
        sort_by_created(&mut rows, dir);
        Ok(rows)
    }
}

#[async_trait]
impl PostRepository for MemoryBackend {
    async fn insert(&self, post: &Post) -> Result<Post, AppError> {
        self.posts
            .write()
            .await
            .insert(post.id.clone(), post.clone());
        publish(&self.post_events, ChangeEvent::Created(post.clone()))?;
        Ok(post.clone())
    }

    async fn update(&self, post: &Post) -> Result<Post, AppError> {
        let mut posts = self.posts.write().await;
        if !posts.contains_key(&post.id) {
            return Err(AppError::NotFound(format!("Post not found: {}", post.id)));
        }
        posts.insert(post.id.clone(), post.clone());
        drop(posts);
        publish(&self.post_events, ChangeEvent::Updated(post.clone()))?;
        Ok(post.clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), AppError> {
        if self.posts.write().await.remove(id).is_none() {
            return Ok(());
        }

        // Cascade, the way the backend's foreign key does.
        let mut comments = self.comments.write().await;
        let orphaned: Vec<RecordId> = comments
            .values()
            .filter(|comment| &comment.post_id == id)
            .map(|comment| comment.id.clone())
            .collect();
        for comment_id in &orphaned {
            comments.remove(comment_id);
        }
        drop(comments);

        for comment_id in orphaned {
            publish(
                &self.comment_events,
                ChangeEvent::<Comment>::Deleted(comment_id),
            )?;
        }
        publish(&self.post_events, ChangeEvent::<Post>::Deleted(id.clone()))?;
        Ok(())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Post>, AppError> {
        Ok(self.posts.read().await.get(id).cloned())
    }

    async fn list(&self, dir: SortDir) -> Result<Vec<Post>, AppError> {
        let mut rows: Vec<Post> = self.posts.read().await.values().cloned().collect();
        sort_by_created(&mut rows, dir);
        Ok(rows)
    }
}

#[async_trait]
impl CommentRepository for MemoryBackend {
    async fn insert(&self, comment: &Comment) -> Result<Comment, AppError> {
        if !self.posts.read().await.contains_key(&comment.post_id) {
            return Err(AppError::NotFound(format!(
                "Post not found: {}",
                comment.post_id
            )));
        }
        self.comments
            .write()
            .await
            .insert(comment.id.clone(), comment.clone());
        publish(&self.comment_events, ChangeEvent::Created(comment.clone()))?;
        Ok(comment.clone())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), AppError> {
        if self.comments.write().await.remove(id).is_some() {
            publish(
                &self.comment_events,
                ChangeEvent::<Comment>::Deleted(id.clone()),
            )?;
        }
        Ok(())
    }

    async fn list_by_post(&self, post_id: &RecordId) -> Result<Vec<Comment>, AppError> {
        let mut rows: Vec<Comment> = self
            .comments
            .read()
            .await
            .values()
            .filter(|comment| &comment.post_id == post_id)
            .cloned()
            .collect();
        sort_by_created(&mut rows, SortDir::Ascending);
        Ok(rows)
    }
}

#[async_trait]
impl ClientRepository for MemoryBackend {
    async fn upsert_by_email(&self, client: &ClientRecord) -> Result<ClientRecord, AppError> {
        let mut clients = self.clients.write().await;
        let merged = match clients.values().find(|row| row.email == client.email) {
            Some(existing) => ClientRecord {
                id: existing.id.clone(),
                created_at: existing.created_at,
                ..client.clone()
            },
            None => client.clone(),
        };
        clients.insert(merged.id.clone(), merged.clone());
        Ok(merged)
    }

    async fn find_by_user_id(&self, user_id: &RecordId) -> Result<Option<ClientRecord>, AppError> {
        Ok(self
            .clients
            .read()
            .await
            .values()
            .find(|client| &client.user_id == user_id)
            .cloned())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<ClientRecord>, AppError> {
        Ok(self.clients.read().await.get(id).cloned())
    }
}

#[async_trait]
impl ProfileRepository for MemoryBackend {
    async fn upsert(&self, profile: &Profile) -> Result<Profile, AppError> {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile.clone());
        Ok(profile.clone())
    }

    async fn get(&self, user_id: &RecordId) -> Result<Option<Profile>, AppError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }
}

#[async_trait]
impl RealtimeGateway for MemoryBackend {
    async fn subscribe_orders(&self) -> Result<ChangeStream<Order>, AppError> {
        Ok(self.open_stream(&self.order_events))
    }

    async fn subscribe_posts(&self) -> Result<ChangeStream<Post>, AppError> {
        Ok(self.open_stream(&self.post_events))
    }

    async fn subscribe_comments(&self) -> Result<ChangeStream<Comment>, AppError> {
        Ok(self.open_stream(&self.comment_events))
    }
}

#[async_trait]
impl AuthGateway for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(email)
            .filter(|account| account.password == password)
            .ok_or_else(|| AppError::Auth("Invalid login credentials".to_string()))?;
        if !account.confirmed {
            return Err(AppError::Auth("Email not confirmed".to_string()));
        }

        let session = Session::new(AuthUser {
            id: account.user_id.clone(),
            email: email.to_string(),
        });
        drop(accounts);

        *self.session.write().await = Some(session.clone());
        let _ = self
            .session_events
            .send(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AppError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(AppError::Auth("User already registered".to_string()));
        }

        let user = AuthUser {
            id: RecordId::generate(),
            email: email.to_string(),
        };
        accounts.insert(
            email.to_string(),
            Account {
                user_id: user.id.clone(),
                password: password.to_string(),
                confirmed: false,
            },
        );
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        *self.session.write().await = None;
        let _ = self.session_events.send(SessionEvent::SignedOut);
        Ok(())
    }

    async fn request_password_reset(
        &self,
        _email: &str,
        _redirect_to: &str,
    ) -> Result<(), AppError> {
        // The hosted provider replies success whether or not the account
        // exists, so address enumeration stays impossible.
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), AppError> {
        let session = self.session.read().await.clone();
        let session =
            session.ok_or_else(|| AppError::Auth("Auth session missing".to_string()))?;

        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&session.user.email)
            .ok_or_else(|| AppError::Auth("Auth session missing".to_string()))?;
        account.password = new_password.to_string();
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, AppError> {
        Ok(self.session.read().await.clone())
    }

    fn session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.session_events.subscribe()
    }
}

#[async_trait]
impl ObjectStorage for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        upsert: bool,
    ) -> Result<(), AppError> {
        let key = format!("{bucket}/{path}");
        let mut objects = self.objects.write().await;
        if !upsert && objects.contains_key(&key) {
            return Err(AppError::Storage("The resource already exists".to_string()));
        }
        objects.insert(key, bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }
}

#[async_trait]
impl PreferenceStore for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.preferences.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.preferences
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.preferences.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(name: &str) -> Order {
        Order {
            id: RecordId::generate(),
            client_id: RecordId::new("client-1"),
            name: name.to_string(),
            address: "324 Main Avenue".to_string(),
            city: "New York".to_string(),
            zip_code: "11990".to_string(),
            price: 34.0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn unconfirmed_accounts_cannot_sign_in() {
        let backend = MemoryBackend::new();
        backend
            .sign_up("emily@example.com", "secret1")
            .await
            .expect("sign up");

        let err = backend
            .sign_in("emily@example.com", "secret1")
            .await
            .expect_err("unconfirmed");
        assert!(matches!(err, AppError::Auth(ref msg) if msg == "Email not confirmed"));

        assert!(backend.confirm_email("emily@example.com").await);
        let session = backend
            .sign_in("emily@example.com", "secret1")
            .await
            .expect("confirmed sign in");
        assert_eq!(session.user.email, "emily@example.com");
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let backend = MemoryBackend::new();
        backend.register_confirmed("emily@example.com", "secret1").await;

        let err = backend
            .sign_in("emily@example.com", "nope")
            .await
            .expect_err("wrong password");
        assert!(matches!(err, AppError::Auth(ref msg) if msg == "Invalid login credentials"));
    }

    #[tokio::test]
    async fn update_password_requires_a_session() {
        let backend = MemoryBackend::new();
        backend.register_confirmed("emily@example.com", "secret1").await;

        let err = backend
            .update_password("next-secret")
            .await
            .expect_err("no session");
        assert!(matches!(err, AppError::Auth(_)));

        backend
            .sign_in("emily@example.com", "secret1")
            .await
            .expect("sign in");
        backend
            .update_password("next-secret")
            .await
            .expect("update with session");
        backend.sign_out().await.expect("sign out");

        backend
            .sign_in("emily@example.com", "next-secret")
            .await
            .expect("new password works");
    }

    #[tokio::test]
    async fn subscriptions_are_counted_and_released() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.active_realtime_subscriptions(), 0);

        let orders = backend.subscribe_orders().await.expect("orders stream");
        let posts = backend.subscribe_posts().await.expect("posts stream");
        assert_eq!(backend.active_realtime_subscriptions(), 2);

        drop(orders);
        drop(posts);
        assert_eq!(backend.active_realtime_subscriptions(), 0);
    }

    #[tokio::test]
    async fn changes_round_trip_the_wire_shape() {
        let backend = MemoryBackend::new();
        let mut stream = backend.subscribe_orders().await.expect("stream");

        let row = order("Emily Williams");
        OrderRepository::insert(&*backend, &row).await.expect("insert");
        OrderRepository::delete(&*backend, &row.id)
            .await
            .expect("delete");

        assert_eq!(
            stream.recv().await.expect("created"),
            ChangeEvent::Created(row.clone())
        );
        assert_eq!(
            stream.recv().await.expect("deleted"),
            ChangeEvent::Deleted(row.id)
        );
    }

    #[tokio::test]
    async fn deleting_a_post_emits_comment_deletions_first() {
        let backend = MemoryBackend::new();
        let post = Post::new(RecordId::new("client-1"), "Post".into(), "body".into());
        PostRepository::insert(&*backend, &post).await.expect("post");
        let comment = Comment::new(post.id.clone(), RecordId::new("client-1"), "hi".into());
        CommentRepository::insert(&*backend, &comment)
            .await
            .expect("comment");

        let mut stream = backend.subscribe_comments().await.expect("stream");
        PostRepository::delete(&*backend, &post.id)
            .await
            .expect("cascade delete");

        assert_eq!(
            stream.recv().await.expect("cascaded"),
            ChangeEvent::Deleted(comment.id)
        );
        assert!(backend
            .list_by_post(&post.id)
            .await
            .expect("list")
            .is_empty());
    }

    #[tokio::test]
    async fn upsert_by_email_keeps_the_original_row_id() {
        let backend = MemoryBackend::new();
        let first = ClientRecord::new(RecordId::new("user-1"), "emily@example.com".into());
        let stored = backend.upsert_by_email(&first).await.expect("insert");

        let second = ClientRecord::new(RecordId::new("user-2"), "emily@example.com".into());
        let merged = backend.upsert_by_email(&second).await.expect("upsert");

        assert_eq!(merged.id, stored.id);
        assert_eq!(merged.user_id, RecordId::new("user-2"));
    }

    #[tokio::test]
    async fn storage_rejects_overwrites_unless_upserting() {
        let backend = MemoryBackend::new();
        backend
            .upload("avatars", "a.png", Bytes::from_static(b"one"), false)
            .await
            .expect("first upload");

        let err = backend
            .upload("avatars", "a.png", Bytes::from_static(b"two"), false)
            .await
            .expect_err("conflict");
        assert!(matches!(err, AppError::Storage(_)));

        backend
            .upload("avatars", "a.png", Bytes::from_static(b"two"), true)
            .await
            .expect("upsert allowed");
        assert_eq!(
            backend.public_url("avatars", "a.png"),
            "http://localhost:54321/storage/v1/object/public/avatars/a.png"
        );
    }
}
