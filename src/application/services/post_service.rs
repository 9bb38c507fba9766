use crate::application::live::{LiveCollection, LiveQuery, SnapshotFn};
use crate::application::ports::realtime::{ChangeEvent, ChangeStream, RealtimeGateway};
use crate::application::ports::repositories::{
    ClientRepository, CommentRepository, PostRepository, SortDir,
};
use crate::domain::entities::{Comment, Post};
use crate::domain::value_objects::RecordId;
use crate::shared::error::AppError;
use crate::shared::validation::require_field;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A post enriched with its author's email for display. Authors whose client
/// record has vanished render with no email rather than failing the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub post: Post,
    pub author_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    pub comment: Comment,
    pub author_email: Option<String>,
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    clients: Arc<dyn ClientRepository>,
    realtime: Arc<dyn RealtimeGateway>,
    page_size: usize,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        clients: Arc<dyn ClientRepository>,
        realtime: Arc<dyn RealtimeGateway>,
        page_size: usize,
    ) -> Self {
        Self {
            posts,
            comments,
            clients,
            realtime,
            page_size,
        }
    }

    pub async fn create_post(
        &self,
        user_id: &RecordId,
        title: &str,
        content: &str,
    ) -> Result<Post, AppError> {
        require_field(title, "title")?;
        require_field(content, "content")?;

        let client = self.resolve_client(user_id).await?;
        let post = Post::new(client.id, title.trim().to_string(), content.trim().to_string());
        let inserted = self.posts.insert(&post).await?;
        info!(post_id = %inserted.id, "post created");
        Ok(inserted)
    }

    pub async fn update_post(
        &self,
        id: &RecordId,
        title: &str,
        content: &str,
    ) -> Result<Post, AppError> {
        require_field(title, "title")?;
        require_field(content, "content")?;

        let mut post = self
            .posts
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post not found: {id}")))?;
        post.title = title.trim().to_string();
        post.content = content.trim().to_string();
        self.posts.update(&post).await
    }

    pub async fn delete_post(&self, id: &RecordId) -> Result<(), AppError> {
        self.posts.delete(id).await?;
        info!(post_id = %id, "post deleted");
        Ok(())
    }

    pub async fn list_posts(&self) -> Result<Vec<PostView>, AppError> {
        let posts = self.posts.list(SortDir::Descending).await?;
        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            let author_email = self.author_email(&post.client_id).await?;
            views.push(PostView { post, author_email });
        }
        Ok(views)
    }

    pub async fn add_comment(
        &self,
        user_id: &RecordId,
        post_id: &RecordId,
        content: &str,
    ) -> Result<Comment, AppError> {
        require_field(content, "content")?;

        let client = self.resolve_client(user_id).await?;
        let comment = Comment::new(post_id.clone(), client.id, content.trim().to_string());
        self.comments.insert(&comment).await
    }

    /// Comments for one post, oldest first, enriched with their authors.
    pub async fn list_comments(&self, post_id: &RecordId) -> Result<Vec<CommentView>, AppError> {
        let comments = self.comments.list_by_post(post_id).await?;
        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            let author_email = self.author_email(&comment.client_id).await?;
            views.push(CommentView {
                comment,
                author_email,
            });
        }
        Ok(views)
    }

    /// Reconciled live view over the posts table alone; the full feed with
    /// comments goes through `load_feed` plus the two change streams.
    pub async fn live_posts(&self) -> Result<LiveQuery<Post>, AppError> {
        let repo = Arc::clone(&self.posts);
        let fetch: SnapshotFn<Post> = Arc::new(move || {
            let repo = Arc::clone(&repo);
            Box::pin(async move { repo.list(SortDir::Descending).await })
        });

        let stream = self.realtime.subscribe_posts().await?;
        LiveQuery::open(fetch, stream, self.page_size).await
    }

    /// Bulk-loads the feed view-model: every post, newest first, with its
    /// comment thread.
    pub async fn load_feed(&self) -> Result<PostFeed, AppError> {
        let posts = self.posts.list(SortDir::Descending).await?;
        let mut feed = PostFeed::with_page_size(self.page_size);
        for post in &posts {
            let comments = self.comments.list_by_post(&post.id).await?;
            feed.seed_comments(post.id.clone(), comments);
        }
        feed.seed_posts(posts);
        Ok(feed)
    }

    pub async fn subscribe_post_changes(&self) -> Result<ChangeStream<Post>, AppError> {
        self.realtime.subscribe_posts().await
    }

    pub async fn subscribe_comment_changes(&self) -> Result<ChangeStream<Comment>, AppError> {
        self.realtime.subscribe_comments().await
    }

    async fn resolve_client(
        &self,
        user_id: &RecordId,
    ) -> Result<crate::domain::entities::ClientRecord, AppError> {
        self.clients
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "Could not find client record. Please ensure you have signed up.".to_string(),
                )
            })
    }

    async fn author_email(&self, client_id: &RecordId) -> Result<Option<String>, AppError> {
        Ok(self
            .clients
            .get(client_id)
            .await?
            .map(|client| client.email))
    }
}

/// View-model for the feed page: the reconciled post collection plus a
/// comment thread per post. Deleting a post drops its thread as well.
#[derive(Debug, Clone)]
pub struct PostFeed {
    posts: LiveCollection<Post>,
    comments: HashMap<RecordId, Vec<Comment>>,
}

impl PostFeed {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            posts: LiveCollection::with_page_size(page_size),
            comments: HashMap::new(),
        }
    }

    pub fn seed_posts(&mut self, posts: Vec<Post>) {
        self.posts.seed(posts);
    }

    pub fn seed_comments(&mut self, post_id: RecordId, mut comments: Vec<Comment>) {
        comments.sort_by_key(|comment| comment.created_at);
        self.comments.insert(post_id, comments);
    }

    pub fn apply_post_change(&mut self, event: ChangeEvent<Post>) {
        if let ChangeEvent::Deleted(id) = &event {
            self.comments.remove(id);
        }
        self.posts.apply(event);
    }

    pub fn apply_comment_change(&mut self, event: ChangeEvent<Comment>) {
        match event {
            ChangeEvent::Created(comment) => {
                let thread = self.comments.entry(comment.post_id.clone()).or_default();
                // Duplicate delivery guard, same policy as the collection.
                thread.retain(|existing| existing.id != comment.id);
                thread.push(comment);
                thread.sort_by_key(|comment| comment.created_at);
            }
            ChangeEvent::Updated(comment) => {
                if let Some(thread) = self.comments.get_mut(&comment.post_id) {
                    if let Some(slot) = thread.iter_mut().find(|c| c.id == comment.id) {
                        *slot = comment;
                    }
                }
            }
            ChangeEvent::Deleted(id) => {
                for thread in self.comments.values_mut() {
                    thread.retain(|comment| comment.id != id);
                }
            }
        }
    }

    pub fn posts(&self) -> &[Post] {
        self.posts.records()
    }

    pub fn posts_page(&self, page: usize) -> &[Post] {
        self.posts.page(page)
    }

    pub fn comments_for(&self, post_id: &RecordId) -> &[Comment] {
        self.comments
            .get(post_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
