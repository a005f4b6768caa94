//! # rh-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `rh-core` domain models. Content ids are stored as 16-byte BLOBs,
//! timestamps as RFC 3339 TEXT.

mod mappers;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use rh_core::models::{
    Article, ArticleUpdate, ArticleView, CadModel, CadModelView, FeedQuery, Identity,
    SavedArticle, SavedArticleView, SavedCadModel, SavedCadModelView, StatCounter, Stats,
    TargetType, User,
};
use rh_core::traits::ContentRepo;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use mappers::*;

// Shared column layout for every query that produces an ArticleView.
const ARTICLE_COLUMNS: &str = "a.id, a.title, a.content, a.category, a.status, a.published_at, \
    a.user_id, a.created_at, a.updated_at, \
    u.id AS author_id, u.name AS author_name, u.image AS author_image, \
    s.id AS stats_id, s.views, s.likes, s.comments";

const ARTICLE_JOINS: &str = "LEFT JOIN users u ON u.id = a.user_id \
    LEFT JOIN stats s ON s.target_type = 'article' AND s.target_id = a.id";

const CAD_MODEL_COLUMNS: &str = "m.id, m.title, m.description, m.category, m.status, m.file_url, \
    m.thumbnail_url, m.user_id, m.published_at, m.created_at, m.updated_at, \
    u.id AS author_id, u.name AS author_name, u.image AS author_image, \
    s.id AS stats_id, s.views, s.likes, s.comments";

const CAD_MODEL_JOINS: &str = "LEFT JOIN users u ON u.id = m.user_id \
    LEFT JOIN stats s ON s.target_type = 'cad_model' AND s.target_id = m.id";

const STATS_COLUMNS: &str = "id, target_type, target_id, views, likes, comments";

pub struct SqliteContentRepo {
    pool: SqlitePool,
}

impl SqliteContentRepo {
    /// Connects and applies the embedded migrations.
    ///
    /// An in-memory database lives as long as its connection, so for
    /// `sqlite::memory:` the pool is pinned to one connection that is never
    /// recycled.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(database_url, "content store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Zeroed counters for a freshly created article or model. Runs on the
/// caller's transaction so the owner and its Stats row land together.
async fn insert_stats(conn: &mut SqliteConnection, target_type: TargetType, target_id: Uuid) -> anyhow::Result<()> {
    let stats = Stats::zeroed(target_type, target_id);
    sqlx::query("INSERT INTO stats (id, target_type, target_id, views, likes, comments) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(stats.id)
        .bind(stats.target_type.as_str())
        .bind(stats.target_id)
        .bind(stats.views)
        .bind(stats.likes)
        .bind(stats.comments)
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl ContentRepo for SqliteContentRepo {
    async fn upsert_user(&self, identity: &Identity) -> anyhow::Result<User> {
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO users (id, name, email, image, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT (id) DO UPDATE SET name = excluded.name, email = excluded.email, \
             image = excluded.image, updated_at = excluded.updated_at \
             RETURNING id, name, email, image, created_at, updated_at",
        )
        .bind(&identity.id)
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.image)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        map_user(&row)
    }

    /// Atomic operation to create an article and its Stats row.
    ///
    /// # Developer Note
    /// Both inserts share one transaction; an article never exists without
    /// its counters.
    async fn create_article(&self, article: Article) -> anyhow::Result<Article> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO articles (id, title, content, category, status, published_at, user_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.category)
        .bind(article.status.as_str())
        .bind(article.published_at)
        .bind(&article.user_id)
        .bind(article.created_at)
        .bind(article.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_stats(&mut tx, TargetType::Article, article.id).await?;

        tx.commit().await?;
        debug!(article_id = %article.id, "article created");
        Ok(article)
    }

    async fn get_article(&self, id: Uuid) -> anyhow::Result<Option<ArticleView>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles a {ARTICLE_JOINS} WHERE a.id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(map_article_view).transpose()
    }

    /// Read-modify-write inside one transaction.
    async fn update_article(&self, id: Uuid, update: ArticleUpdate) -> anyhow::Result<Option<Article>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, title, content, category, status, published_at, user_id, created_at, updated_at \
             FROM articles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut article = match row {
            Some(row) => map_article(&row)?,
            None => return Ok(None),
        };
        update.apply(&mut article, Utc::now());

        sqlx::query(
            "UPDATE articles SET title = ?, content = ?, category = ?, status = ?, published_at = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.category)
        .bind(article.status.as_str())
        .bind(article.published_at)
        .bind(article.updated_at)
        .bind(article.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(article))
    }

    async fn list_published_articles(&self, query: FeedQuery) -> anyhow::Result<Vec<ArticleView>> {
        let category_clause = if query.category.is_some() { "AND LOWER(a.category) = ?" } else { "" };
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles a {ARTICLE_JOINS} \
             WHERE a.status = 'published' {category_clause} \
             ORDER BY a.published_at DESC LIMIT ? OFFSET ?"
        );
        let mut q = sqlx::query(&sql);
        if let Some(category) = query.category {
            q = q.bind(category.slug());
        }
        let rows = q.bind(query.limit).bind(query.offset).fetch_all(&self.pool).await?;
        rows.iter().map(map_article_view).collect()
    }

    async fn list_articles_by_user(&self, user_id: &str) -> anyhow::Result<Vec<ArticleView>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles a {ARTICLE_JOINS} \
             WHERE a.user_id = ? ORDER BY a.updated_at DESC"
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        rows.iter().map(map_article_view).collect()
    }

    async fn count_published_articles_by_category(&self) -> anyhow::Result<Vec<(String, i64)>> {
        let counts = sqlx::query_as::<_, (String, i64)>(
            "SELECT category, COUNT(*) FROM articles WHERE status = 'published' GROUP BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    /// Atomic operation to create a CAD model and its Stats row.
    async fn create_cad_model(&self, model: CadModel) -> anyhow::Result<CadModel> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO cad_models (id, title, description, category, status, file_url, thumbnail_url, \
             user_id, published_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(model.id)
        .bind(&model.title)
        .bind(&model.description)
        .bind(&model.category)
        .bind(model.status.as_str())
        .bind(&model.file_url)
        .bind(&model.thumbnail_url)
        .bind(&model.user_id)
        .bind(model.published_at)
        .bind(model.created_at)
        .bind(model.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_stats(&mut tx, TargetType::CadModel, model.id).await?;

        tx.commit().await?;
        debug!(cad_model_id = %model.id, "cad model created");
        Ok(model)
    }

    async fn get_cad_model(&self, id: Uuid) -> anyhow::Result<Option<CadModelView>> {
        let sql = format!("SELECT {CAD_MODEL_COLUMNS} FROM cad_models m {CAD_MODEL_JOINS} WHERE m.id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(map_cad_model_view).transpose()
    }

    async fn list_published_cad_models(&self, query: FeedQuery) -> anyhow::Result<Vec<CadModelView>> {
        let category_clause = if query.category.is_some() { "AND LOWER(m.category) = ?" } else { "" };
        let sql = format!(
            "SELECT {CAD_MODEL_COLUMNS} FROM cad_models m {CAD_MODEL_JOINS} \
             WHERE m.status = 'published' {category_clause} \
             ORDER BY m.published_at DESC LIMIT ? OFFSET ?"
        );
        let mut q = sqlx::query(&sql);
        if let Some(category) = query.category {
            q = q.bind(category.slug());
        }
        let rows = q.bind(query.limit).bind(query.offset).fetch_all(&self.pool).await?;
        rows.iter().map(map_cad_model_view).collect()
    }

    async fn list_cad_models_by_user(&self, user_id: &str) -> anyhow::Result<Vec<CadModelView>> {
        let sql = format!(
            "SELECT {CAD_MODEL_COLUMNS} FROM cad_models m {CAD_MODEL_JOINS} \
             WHERE m.user_id = ? ORDER BY m.updated_at DESC"
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        rows.iter().map(map_cad_model_view).collect()
    }

    async fn stats_for_user(&self, user_id: &str) -> anyhow::Result<Vec<Stats>> {
        let rows = sqlx::query(
            "SELECT s.id, s.target_type, s.target_id, s.views, s.likes, s.comments FROM stats s \
             JOIN articles a ON s.target_type = 'article' AND s.target_id = a.id WHERE a.user_id = ? \
             UNION ALL \
             SELECT s.id, s.target_type, s.target_id, s.views, s.likes, s.comments FROM stats s \
             JOIN cad_models m ON s.target_type = 'cad_model' AND s.target_id = m.id WHERE m.user_id = ?",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_stats).collect()
    }

    async fn increment_stat(
        &self,
        target_type: TargetType,
        target_id: Uuid,
        counter: StatCounter,
    ) -> anyhow::Result<Option<Stats>> {
        // The column name comes from a closed enum, never from input.
        let column = counter.column();
        let sql = format!(
            "UPDATE stats SET {column} = {column} + 1 WHERE target_type = ? AND target_id = ? \
             RETURNING {STATS_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(target_type.as_str())
            .bind(target_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_stats).transpose()
    }

    async fn save_article(&self, user_id: &str, article_id: Uuid) -> anyhow::Result<Option<SavedArticle>> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM articles WHERE id = ?")
            .bind(article_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO saved_articles (id, user_id, article_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (user_id, article_id) DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(article_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(
            "SELECT id AS saved_id, user_id AS saved_user_id, article_id AS id, \
             created_at AS saved_created_at, updated_at AS saved_updated_at \
             FROM saved_articles WHERE user_id = ? AND article_id = ?",
        )
        .bind(user_id)
        .bind(article_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        map_saved_article(&row).map(Some)
    }

    async fn save_cad_model(&self, user_id: &str, cad_model_id: Uuid) -> anyhow::Result<Option<SavedCadModel>> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM cad_models WHERE id = ?")
            .bind(cad_model_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO saved_cad_models (id, user_id, cad_model_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (user_id, cad_model_id) DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(cad_model_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(
            "SELECT id AS saved_id, user_id AS saved_user_id, cad_model_id AS id, \
             created_at AS saved_created_at, updated_at AS saved_updated_at \
             FROM saved_cad_models WHERE user_id = ? AND cad_model_id = ?",
        )
        .bind(user_id)
        .bind(cad_model_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        map_saved_cad_model(&row).map(Some)
    }

    async fn saved_articles(&self, user_id: &str) -> anyhow::Result<Vec<SavedArticleView>> {
        let sql = format!(
            "SELECT sa.id AS saved_id, sa.user_id AS saved_user_id, sa.created_at AS saved_created_at, \
             sa.updated_at AS saved_updated_at, {ARTICLE_COLUMNS} \
             FROM saved_articles sa JOIN articles a ON a.id = sa.article_id {ARTICLE_JOINS} \
             WHERE sa.user_id = ? ORDER BY sa.created_at DESC"
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(SavedArticleView {
                    saved: map_saved_article(row)?,
                    article: map_article_view(row)?,
                })
            })
            .collect()
    }

    async fn saved_cad_models(&self, user_id: &str) -> anyhow::Result<Vec<SavedCadModelView>> {
        let sql = format!(
            "SELECT sm.id AS saved_id, sm.user_id AS saved_user_id, sm.created_at AS saved_created_at, \
             sm.updated_at AS saved_updated_at, {CAD_MODEL_COLUMNS} \
             FROM saved_cad_models sm JOIN cad_models m ON m.id = sm.cad_model_id {CAD_MODEL_JOINS} \
             WHERE sm.user_id = ? ORDER BY sm.created_at DESC"
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(SavedCadModelView {
                    saved: map_saved_cad_model(row)?,
                    cad_model: map_cad_model_view(row)?,
                })
            })
            .collect()
    }
}
