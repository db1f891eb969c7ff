//! News CRUD endpoints.
//!
//! Every successful mutation announces itself over the broadcaster after the
//! store write is confirmed. `publish` never fails, so the write paths call
//! it unconditionally.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use newsroom_core::event::{NEWS_CREATED, NEWS_DELETED, NEWS_UPDATED};
use newsroom_store::{Article, ArticlePatch, NewArticle, StoreError};

use crate::app::AppState;

/// Store errors mapped to HTTP responses: 404 for missing articles,
/// 400 for malformed input, 500 for everything else.
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::InvalidTimestamp(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// POST /news — create a draft article.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewArticle>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let article = state.store.create(body)?;

    state.broadcaster.publish(
        NEWS_CREATED,
        json!({ "message": format!("New article created: \"{}\"", article.title) }),
    );

    Ok((StatusCode::CREATED, Json(article)))
}

/// GET /news — all articles, newest first.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Article>>, ApiError> {
    Ok(Json(state.store.list()?))
}

/// GET /news/{id}
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Article>, ApiError> {
    let article = state
        .store
        .get(&id)?
        .ok_or(StoreError::NotFound { id })?;
    Ok(Json(article))
}

/// PUT /news/{id} — partial update.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<ArticlePatch>,
) -> Result<Json<Article>, ApiError> {
    let article = state.store.update(&id, patch)?;

    state.broadcaster.publish(
        NEWS_UPDATED,
        json!({ "message": format!("Article \"{}\" was updated.", article.title) }),
    );

    Ok(Json(article))
}

/// DELETE /news/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    // Fetch first so the announcement can name the article.
    let article = state
        .store
        .get(&id)?
        .ok_or(StoreError::NotFound { id: id.clone() })?;
    state.store.delete(&id)?;

    state.broadcaster.publish(
        NEWS_DELETED,
        json!({ "message": format!("Article \"{}\" was deleted.", article.title) }),
    );

    Ok(StatusCode::NO_CONTENT)
}
