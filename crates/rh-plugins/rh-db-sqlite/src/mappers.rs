//! Row → domain model mapping.
//!
//! Content queries share one column layout (see `ARTICLE_COLUMNS` and
//! `CAD_MODEL_COLUMNS` in the parent module) so a single mapper serves the
//! detail, feed, dashboard and bookmark queries.

use rh_core::models::{
    Article, ArticleView, CadModel, CadModelView, ContentStatus, SavedArticle, SavedCadModel,
    Stats, TargetType, User, UserSummary,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

fn status(row: &SqliteRow) -> anyhow::Result<ContentStatus> {
    Ok(row.try_get::<String, _>("status")?.parse()?)
}

pub fn map_user(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        image: row.try_get("image")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub fn map_stats(row: &SqliteRow) -> anyhow::Result<Stats> {
    Ok(Stats {
        id: row.try_get("id")?,
        target_type: row.try_get::<String, _>("target_type")?.parse()?,
        target_id: row.try_get("target_id")?,
        views: row.try_get("views")?,
        likes: row.try_get("likes")?,
        comments: row.try_get("comments")?,
    })
}

// Author and stats come from LEFT JOINs, so both may be absent.
fn joined_author(row: &SqliteRow) -> anyhow::Result<Option<UserSummary>> {
    let author_id: Option<String> = row.try_get("author_id")?;
    Ok(match author_id {
        Some(_) => Some(UserSummary {
            name: row.try_get("author_name")?,
            image: row.try_get("author_image")?,
        }),
        None => None,
    })
}

fn joined_stats(row: &SqliteRow, target_type: TargetType, target_id: Uuid) -> anyhow::Result<Option<Stats>> {
    let stats_id: Option<Uuid> = row.try_get("stats_id")?;
    Ok(match stats_id {
        Some(id) => Some(Stats {
            id,
            target_type,
            target_id,
            views: row.try_get("views")?,
            likes: row.try_get("likes")?,
            comments: row.try_get("comments")?,
        }),
        None => None,
    })
}

pub fn map_article(row: &SqliteRow) -> anyhow::Result<Article> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        category: row.try_get("category")?,
        status: status(row)?,
        published_at: row.try_get("published_at")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub fn map_article_view(row: &SqliteRow) -> anyhow::Result<ArticleView> {
    let article = map_article(row)?;
    let stats = joined_stats(row, TargetType::Article, article.id)?;
    Ok(ArticleView {
        user: joined_author(row)?,
        stats,
        article,
    })
}

pub fn map_cad_model(row: &SqliteRow) -> anyhow::Result<CadModel> {
    Ok(CadModel {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        status: status(row)?,
        file_url: row.try_get("file_url")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        user_id: row.try_get("user_id")?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub fn map_cad_model_view(row: &SqliteRow) -> anyhow::Result<CadModelView> {
    let cad_model = map_cad_model(row)?;
    let stats = joined_stats(row, TargetType::CadModel, cad_model.id)?;
    Ok(CadModelView {
        user: joined_author(row)?,
        stats,
        cad_model,
    })
}

pub fn map_saved_article(row: &SqliteRow) -> anyhow::Result<SavedArticle> {
    Ok(SavedArticle {
        id: row.try_get("saved_id")?,
        user_id: row.try_get("saved_user_id")?,
        article_id: row.try_get("id")?,
        created_at: row.try_get("saved_created_at")?,
        updated_at: row.try_get("saved_updated_at")?,
    })
}

pub fn map_saved_cad_model(row: &SqliteRow) -> anyhow::Result<SavedCadModel> {
    Ok(SavedCadModel {
        id: row.try_get("saved_id")?,
        user_id: row.try_get("saved_user_id")?,
        cad_model_id: row.try_get("id")?,
        created_at: row.try_get("saved_created_at")?,
        updated_at: row.try_get("saved_updated_at")?,
    })
}
