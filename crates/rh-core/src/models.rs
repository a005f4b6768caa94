//! # Domain Models
//!
//! These structs represent the core entities of RoboHub.
//! Content ids are UUID v7 (time-ordered); user ids are the opaque subject
//! carried by the session token.
//!
//! JSON field names are camelCase because the browser client reads them
//! directly (`publishedAt`, `userId`, `fileUrl`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub type UserId = String;

/// Publication state shared by articles and CAD models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
}

impl ContentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
        }
    }

    /// Publish timestamp for content created in this state.
    pub fn published_at(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ContentStatus::Published => Some(now),
            ContentStatus::Draft => None,
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            other => Err(AppError::ValidationError(format!("Invalid status: {other}"))),
        }
    }
}

/// Which kind of content a Stats row counts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Article,
    CadModel,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Article => "article",
            TargetType::CadModel => "cad_model",
        }
    }

    /// Entity name used in not-found messages.
    pub fn label(self) -> &'static str {
        match self {
            TargetType::Article => "Article",
            TargetType::CadModel => "CAD model",
        }
    }
}

impl FromStr for TargetType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(TargetType::Article),
            "cad_model" => Ok(TargetType::CadModel),
            other => Err(AppError::Internal(format!("unknown stats target type {other}"))),
        }
    }
}

/// The fixed set of browsable categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hardware,
    Software,
    Electronics,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Hardware, Category::Software, Category::Electronics];

    pub fn slug(self) -> &'static str {
        match self {
            Category::Hardware => "hardware",
            Category::Software => "software",
            Category::Electronics => "electronics",
        }
    }

    /// Display title shown on category pages.
    pub fn label(self) -> &'static str {
        match self {
            Category::Hardware => "メカ",
            Category::Software => "ソフト",
            Category::Electronics => "電気・電子",
        }
    }
}

impl FromStr for Category {
    type Err = AppError;

    /// Case-insensitive: `/category/Hardware` and `/category/hardware` are the same feed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::NotFound("Category".to_string(), s.to_string()))
    }
}

/// A verified caller, as carried by the signed session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public fields of a user embedded in content responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Validated input for a new article.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub category: String,
    pub status: ContentStatus,
}

/// A markdown article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    /// Raw markdown; rendering happens client-side.
    pub content: String,
    pub category: String,
    pub status: ContentStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn create(user_id: UserId, input: NewArticle, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: input.title,
            content: input.content,
            category: input.category,
            published_at: input.status.published_at(now),
            status: input.status,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial edit of an article. `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub status: Option<ContentStatus>,
}

impl ArticleUpdate {
    /// Applies the edit in place.
    ///
    /// `publishedAt` is stamped the first time the article ends up published
    /// and is never cleared afterwards, even when the status goes back to draft.
    pub fn apply(self, article: &mut Article, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            article.title = title;
        }
        if let Some(content) = self.content {
            article.content = content;
        }
        if let Some(category) = self.category {
            article.category = category;
        }
        if let Some(status) = self.status {
            article.status = status;
        }
        if article.status == ContentStatus::Published && article.published_at.is_none() {
            article.published_at = Some(now);
        }
        article.updated_at = now;
    }
}

/// Validated input for a CAD model upload, once the media store has
/// produced URLs for the two files.
#[derive(Debug, Clone)]
pub struct NewCadModel {
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: ContentStatus,
    pub file_url: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CadModel {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub status: ContentStatus,
    pub file_url: String,
    pub thumbnail_url: Option<String>,
    pub user_id: UserId,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CadModel {
    pub fn create(user_id: UserId, input: NewCadModel, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: input.title,
            description: Some(input.description),
            category: input.category,
            published_at: input.status.published_at(now),
            status: input.status,
            file_url: input.file_url,
            thumbnail_url: Some(input.thumbnail_url),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Engagement counters attached one-to-one to an article or CAD model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub id: Uuid,
    pub target_type: TargetType,
    pub target_id: Uuid,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

impl Stats {
    pub fn zeroed(target_type: TargetType, target_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            target_type,
            target_id,
            views: 0,
            likes: 0,
            comments: 0,
        }
    }
}

/// Counters that engagement endpoints may bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCounter {
    Views,
    Likes,
}

impl StatCounter {
    pub fn column(self) -> &'static str {
        match self {
            StatCounter::Views => "views",
            StatCounter::Likes => "likes",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: Article,
    pub user: Option<UserSummary>,
    pub stats: Option<Stats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadModelView {
    #[serde(flatten)]
    pub cad_model: CadModel,
    pub user: Option<UserSummary>,
    pub stats: Option<Stats>,
}

/// A user's bookmark of an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedArticle {
    pub id: Uuid,
    pub user_id: UserId,
    pub article_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's bookmark of a CAD model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCadModel {
    pub id: Uuid,
    pub user_id: UserId,
    pub cad_model_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedArticleView {
    #[serde(flatten)]
    pub saved: SavedArticle,
    pub article: ArticleView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCadModelView {
    #[serde(flatten)]
    pub saved: SavedCadModel,
    pub cad_model: CadModelView,
}

/// Paging and filtering for the public feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    pub category: Option<Category>,
    pub limit: i64,
    pub offset: i64,
}

impl FeedQuery {
    pub const DEFAULT_LIMIT: i64 = 30;
    pub const MAX_LIMIT: i64 = 50;

    pub fn new(category: Option<Category>, limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            category,
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}
