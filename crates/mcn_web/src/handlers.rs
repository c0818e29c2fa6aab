use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mcn_core::{Article, Category, Notification, StorySubmission};
use mcn_ingest::PipelineState;
use mcn_storage::query::{self, ArticleDetail, HomePage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryInfo {
    pub name: Category,
    pub requestable: bool,
    pub selectable: bool,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub outcome: &'static str,
    pub message: Option<String>,
    pub added: Vec<Article>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationBody {
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct FeedStatus {
    pub notification: Option<Notification>,
    pub refreshing: bool,
    pub backfilling: bool,
    pub pipeline: PipelineState,
    pub load_error: Option<String>,
    pub location: String,
}

async fn feed(state: &AppState, location: Option<String>) -> ApiResult<Vec<Article>> {
    let articles = state.manager.storage().all().await?;
    let location = location.unwrap_or_else(|| state.manager.location());
    Ok(query::for_location(&articles, &location))
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedParams>,
) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(feed(&state, params.location).await?))
}

pub async fn home(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedParams>,
) -> ApiResult<Json<HomePage>> {
    let articles = feed(&state, params.location).await?;
    Ok(Json(query::home(&articles)))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ArticleDetail>> {
    let articles = state.manager.storage().all().await?;
    query::detail(&articles, &id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Article '{}' not found", id)))
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<StorySubmission>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let article = state.manager.submit(submission).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn list_categories() -> Json<Vec<CategoryInfo>> {
    Json(
        Category::ALL
            .into_iter()
            .map(|name| CategoryInfo {
                name,
                requestable: name.is_requestable(),
                selectable: name.is_user_selectable(),
            })
            .collect(),
    )
}

pub async fn category_articles(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<Article>>> {
    let articles = state.manager.storage().all().await?;
    Ok(Json(query::by_category(&articles, &name)))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Article>>> {
    let articles = state.manager.storage().all().await?;
    Ok(Json(query::search(&articles, &params.q)))
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> Json<RefreshResponse> {
    let outcome = state.manager.refresh().await;
    Json(RefreshResponse {
        outcome: outcome.kind(),
        message: outcome.message(),
        added: outcome.added().to_vec(),
    })
}

pub async fn notification(State(state): State<Arc<AppState>>) -> Json<Option<Notification>> {
    Json(state.manager.notification())
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<FeedStatus> {
    let manager = &state.manager;
    Json(FeedStatus {
        notification: manager.notification(),
        refreshing: manager.is_refreshing(),
        backfilling: manager.is_backfilling(),
        pipeline: manager.pipeline_state(),
        load_error: manager.load_error(),
        location: manager.location(),
    })
}

pub async fn set_location(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LocationBody>,
) -> ApiResult<Json<LocationBody>> {
    let location = body.location.trim();
    if location.is_empty() {
        return Err(ApiError::Validation("Location is required".to_string()));
    }
    state.manager.set_location(location);
    Ok(Json(LocationBody {
        location: location.to_string(),
    }))
}
