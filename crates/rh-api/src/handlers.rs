//! # rh-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.
//! Handlers validate input, call the ports on [`AppState`], and leave status
//! mapping to [`ApiError`].

use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use rh_core::dashboard::{Dashboard, StatTotals};
use rh_core::error::AppError;
use rh_core::models::{
    Article, ArticleUpdate, ArticleView, CadModel, CadModelView, Category, ContentStatus, FeedQuery,
    NewArticle, NewCadModel, SavedArticle, SavedCadModel, StatCounter, Stats, TargetType,
};
use rh_core::traits::{ContentRepo, MediaKind, MediaStore, SessionProvider, Upload};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::session::CurrentUser;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// State shared across all request tasks.
pub struct AppState {
    pub repo: Box<dyn ContentRepo>,
    pub store: Box<dyn MediaStore>,
    pub sessions: Box<dyn SessionProvider>,
    pub policy: ApiPolicy,
}

/// Behavior switches read from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPolicy {
    /// When false, any signed-in user may edit any article.
    pub enforce_article_ownership: bool,
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId(raw.to_string()))
}

fn not_found(target: TargetType, id: Uuid) -> ApiError {
    AppError::NotFound(target.label().to_string(), id.to_string()).into()
}

fn parse_status(raw: Option<&str>) -> Result<ContentStatus, AppError> {
    raw.map(str::parse::<ContentStatus>).transpose().map(Option::unwrap_or_default)
}

// Absent and whitespace-only values are both "missing".
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// Body rejections keep 413 when the upload cap was hit; anything else is a
// malformed request.
fn rejected_body(status: StatusCode, text: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(text)
    } else {
        AppError::ValidationError(text)
    }
}

fn rejected_json(rejection: JsonRejection) -> AppError {
    rejected_body(rejection.status(), rejection.body_text())
}

fn missing_fields() -> ApiError {
    AppError::ValidationError("Missing required fields".to_string()).into()
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FeedParams {
    fn into_query(self) -> Result<FeedQuery, AppError> {
        let category = self.category.as_deref().map(str::parse::<Category>).transpose()?;
        Ok(FeedQuery::new(category, self.limit, self.offset))
    }
}

fn feed_query(params: Result<Query<FeedParams>, QueryRejection>) -> Result<FeedQuery, AppError> {
    let Query(params) = params.map_err(|e| AppError::ValidationError(e.body_text()))?;
    params.into_query()
}

// ── Articles ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    params: Result<Query<FeedParams>, QueryRejection>,
) -> ApiResult<Vec<ArticleView>> {
    let query = feed_query(params)?;
    Ok(Json(state.repo.list_published_articles(query).await?))
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CreateArticleRequest>, JsonRejection>,
) -> ApiResult<Article> {
    let Json(req) = body.map_err(rejected_json)?;

    let (Some(title), Some(content), Some(category)) =
        (required(req.title), required(req.content), required(req.category))
    else {
        return Err(missing_fields());
    };
    let status = parse_status(req.status.as_deref())?;

    let article = Article::create(user.id, NewArticle { title, content, category, status }, Utc::now());
    let article = state.repo.create_article(article).await?;
    info!(article_id = %article.id, user_id = %article.user_id, status = %article.status, "article created");
    Ok(Json(article))
}

pub async fn get_article(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<ArticleView> {
    let id = parse_id(&id)?;
    match state.repo.get_article(id).await? {
        Some(view) => Ok(Json(view)),
        None => Err(not_found(TargetType::Article, id)),
    }
}

pub async fn update_article(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<UpdateArticleRequest>, JsonRejection>,
) -> ApiResult<Article> {
    let id = parse_id(&id)?;
    let Json(req) = body.map_err(rejected_json)?;
    let status = req.status.as_deref().map(str::parse::<ContentStatus>).transpose()?;

    if state.policy.enforce_article_ownership {
        let existing = state.repo.get_article(id).await?.ok_or_else(|| not_found(TargetType::Article, id))?;
        if existing.article.user_id != user.id {
            return Err(AppError::Forbidden("article belongs to another user".to_string()).into());
        }
    }

    let update = ArticleUpdate {
        title: req.title,
        content: req.content,
        category: req.category,
        status,
    };
    match state.repo.update_article(id, update).await? {
        Some(article) => {
            if article.user_id != user.id {
                warn!(article_id = %id, owner = %article.user_id, editor = %user.id, "article edited by non-owner");
            }
            Ok(Json(article))
        }
        None => Err(not_found(TargetType::Article, id)),
    }
}

async fn bump(state: &AppState, target: TargetType, raw_id: &str, counter: StatCounter) -> ApiResult<Stats> {
    let id = parse_id(raw_id)?;
    match state.repo.increment_stat(target, id, counter).await? {
        Some(stats) => Ok(Json(stats)),
        None => Err(not_found(target, id)),
    }
}

pub async fn like_article(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Stats> {
    bump(&state, TargetType::Article, &id, StatCounter::Likes).await
}

pub async fn view_article(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Stats> {
    bump(&state, TargetType::Article, &id, StatCounter::Views).await
}

pub async fn save_article(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<SavedArticle> {
    let id = parse_id(&id)?;
    match state.repo.save_article(&user.id, id).await? {
        Some(saved) => Ok(Json(saved)),
        None => Err(not_found(TargetType::Article, id)),
    }
}

// ── CAD models ───────────────────────────────────────────────────────────────

pub async fn list_cad_models(
    State(state): State<Arc<AppState>>,
    params: Result<Query<FeedParams>, QueryRejection>,
) -> ApiResult<Vec<CadModelView>> {
    let query = feed_query(params)?;
    Ok(Json(state.repo.list_published_cad_models(query).await?))
}

pub async fn get_cad_model(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<CadModelView> {
    let id = parse_id(&id)?;
    match state.repo.get_cad_model(id).await? {
        Some(view) => Ok(Json(view)),
        None => Err(not_found(TargetType::CadModel, id)),
    }
}

#[derive(Default)]
struct CadModelForm {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    status: Option<String>,
    file: Option<Upload>,
    thumbnail: Option<Upload>,
}

async fn read_cad_model_form(mut multipart: Multipart) -> Result<CadModelForm, ApiError> {
    let malformed = |e: MultipartError| rejected_body(e.status(), e.body_text());
    let mut form = CadModelForm::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" | "thumbnail" => {
                let file_name = field.file_name().filter(|n| !n.is_empty()).map(str::to_string);
                let content_type = field
                    .content_type()
                    .and_then(|ct| ct.parse::<mime::Mime>().ok())
                    .or_else(|| file_name.as_deref().and_then(|n| mime_guess::from_path(n).first()))
                    .unwrap_or(mime::APPLICATION_OCTET_STREAM);
                let data = field.bytes().await.map_err(malformed)?;

                // Browsers send an empty, unnamed part for an untouched file input.
                if file_name.is_none() && data.is_empty() {
                    continue;
                }
                let upload = Upload { file_name, content_type, data };
                if name == "file" {
                    form.file = Some(upload);
                } else {
                    form.thumbnail = Some(upload);
                }
            }
            "title" => form.title = Some(field.text().await.map_err(malformed)?),
            "description" => form.description = Some(field.text().await.map_err(malformed)?),
            "category" => form.category = Some(field.text().await.map_err(malformed)?),
            "status" => form.status = Some(field.text().await.map_err(malformed)?),
            _ => {}
        }
    }
    Ok(form)
}

pub async fn create_cad_model(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<CadModel> {
    let multipart = multipart.map_err(|e| rejected_body(e.status(), e.body_text()))?;
    let form = read_cad_model_form(multipart).await?;

    let (Some(title), Some(description), Some(category), Some(file), Some(thumbnail)) = (
        required(form.title),
        required(form.description),
        required(form.category),
        form.file,
        form.thumbnail,
    ) else {
        return Err(missing_fields());
    };
    let status = parse_status(form.status.as_deref())?;

    let file_url = state.store.save_upload(file, MediaKind::CadFile).await?;
    let thumbnail_url = state.store.save_upload(thumbnail, MediaKind::Thumbnail).await?;

    let model = CadModel::create(
        user.id,
        NewCadModel {
            title,
            description,
            category,
            status,
            file_url,
            thumbnail_url,
        },
        Utc::now(),
    );
    let model = state.repo.create_cad_model(model).await?;
    info!(cad_model_id = %model.id, user_id = %model.user_id, status = %model.status, "cad model created");
    Ok(Json(model))
}

pub async fn like_cad_model(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Stats> {
    bump(&state, TargetType::CadModel, &id, StatCounter::Likes).await
}

pub async fn view_cad_model(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Stats> {
    bump(&state, TargetType::CadModel, &id, StatCounter::Views).await
}

pub async fn save_cad_model(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<SavedCadModel> {
    let id = parse_id(&id)?;
    match state.repo.save_cad_model(&user.id, id).await? {
        Some(saved) => Ok(Json(saved)),
        None => Err(not_found(TargetType::CadModel, id)),
    }
}

// ── Categories & dashboard ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub slug: &'static str,
    pub label: &'static str,
    pub article_count: i64,
}

pub async fn list_categories(State(state): State<Arc<AppState>>) -> ApiResult<Vec<CategorySummary>> {
    let counts = state.repo.count_published_articles_by_category().await?;

    // Stored categories are free text; fold case variants into the fixed set.
    let summaries = Category::ALL
        .into_iter()
        .map(|category| CategorySummary {
            slug: category.slug(),
            label: category.label(),
            article_count: counts
                .iter()
                .filter(|(stored, _)| stored.eq_ignore_ascii_case(category.slug()))
                .map(|(_, n)| n)
                .sum(),
        })
        .collect();
    Ok(Json(summaries))
}

/// Everything the dashboard page shows, read concurrently.
pub async fn dashboard(State(state): State<Arc<AppState>>, CurrentUser(user): CurrentUser) -> ApiResult<Dashboard> {
    let uid = user.id.as_str();
    let (articles, cad_models, stats, saved_articles, saved_cad_models) = tokio::try_join!(
        state.repo.list_articles_by_user(uid),
        state.repo.list_cad_models_by_user(uid),
        state.repo.stats_for_user(uid),
        state.repo.saved_articles(uid),
        state.repo.saved_cad_models(uid),
    )?;

    Ok(Json(Dashboard {
        articles,
        cad_models,
        stats: StatTotals::from_stats(&stats),
        saved_articles,
        saved_cad_models,
    }))
}
