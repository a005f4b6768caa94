//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Lookups that can miss return `Ok(None)`; the handler decides whether that
//! is a 404.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::models::{
    Article, ArticleUpdate, ArticleView, CadModel, CadModelView, FeedQuery, Identity,
    SavedArticle, SavedArticleView, SavedCadModel, SavedCadModelView, StatCounter, Stats,
    TargetType, User,
};

/// Data persistence contract for users, content, stats and bookmarks.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ContentRepo: Send + Sync {
    // User Operations

    /// Creates the user on first sight, refreshes profile fields otherwise.
    async fn upsert_user(&self, identity: &Identity) -> anyhow::Result<User>;

    // Article Operations

    /// Inserts the article together with its zeroed Stats row.
    async fn create_article(&self, article: Article) -> anyhow::Result<Article>;
    async fn get_article(&self, id: Uuid) -> anyhow::Result<Option<ArticleView>>;
    /// Returns `None` when no article has this id.
    async fn update_article(&self, id: Uuid, update: ArticleUpdate) -> anyhow::Result<Option<Article>>;
    async fn list_published_articles(&self, query: FeedQuery) -> anyhow::Result<Vec<ArticleView>>;
    async fn list_articles_by_user(&self, user_id: &str) -> anyhow::Result<Vec<ArticleView>>;
    /// Published article counts keyed by the stored category string.
    async fn count_published_articles_by_category(&self) -> anyhow::Result<Vec<(String, i64)>>;

    // CAD Model Operations

    /// Inserts the model together with its zeroed Stats row.
    async fn create_cad_model(&self, model: CadModel) -> anyhow::Result<CadModel>;
    async fn get_cad_model(&self, id: Uuid) -> anyhow::Result<Option<CadModelView>>;
    async fn list_published_cad_models(&self, query: FeedQuery) -> anyhow::Result<Vec<CadModelView>>;
    async fn list_cad_models_by_user(&self, user_id: &str) -> anyhow::Result<Vec<CadModelView>>;

    // Stats Operations

    /// Stats rows of every article and CAD model owned by the user.
    async fn stats_for_user(&self, user_id: &str) -> anyhow::Result<Vec<Stats>>;
    /// Bumps one counter; `None` when the target has no Stats row.
    async fn increment_stat(
        &self,
        target_type: TargetType,
        target_id: Uuid,
        counter: StatCounter,
    ) -> anyhow::Result<Option<Stats>>;

    // Bookmark Operations

    /// Idempotent per (user, article). `None` when the article does not exist.
    async fn save_article(&self, user_id: &str, article_id: Uuid) -> anyhow::Result<Option<SavedArticle>>;
    /// Idempotent per (user, model). `None` when the model does not exist.
    async fn save_cad_model(&self, user_id: &str, cad_model_id: Uuid) -> anyhow::Result<Option<SavedCadModel>>;
    async fn saved_articles(&self, user_id: &str) -> anyhow::Result<Vec<SavedArticleView>>;
    async fn saved_cad_models(&self, user_id: &str) -> anyhow::Result<Vec<SavedCadModelView>>;
}

/// What an uploaded file is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    CadFile,
    Thumbnail,
}

/// One file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: mime::Mime,
    pub data: Bytes,
}

/// Media storage contract for CAD files and thumbnails.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores the upload and returns the URL it will be served from.
    async fn save_upload(&self, upload: Upload, kind: MediaKind) -> anyhow::Result<String>;
}

/// Session token contract. Verification failures are not errors: a bad
/// token simply resolves to no identity.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait SessionProvider: Send + Sync {
    /// Resolves the identity carried by a signed session token.
    fn resolve(&self, token: &str) -> Option<Identity>;

    /// Signs a session token for an identity returned by an identity provider.
    fn issue(&self, identity: &Identity) -> anyhow::Result<String>;
}
