use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::AnalysisResult;
use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Debug entry points that invoke analysis standalone. Unlike the upload
/// flow, analysis failures here surface directly as HTTP errors.
pub fn debug_routes() -> Router<AppState> {
    Router::new()
        .route("/debug/analyze-text", post(analyze_text))
        .route("/debug/analyze-url", post(analyze_url))
        .route("/debug/storage-url", get(storage_url))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeUrlRequest {
    pub image_url: String,
    pub description: Option<String>,
}

#[instrument(skip(state, body))]
async fn analyze_text(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(body): Json<AnalyzeTextRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    if body.description.trim().is_empty() {
        return Err(ApiError::Validation("description must not be blank".into()));
    }
    let result = state.analyzer.analyze_text_only(&body.description).await?;
    Ok(Json(result))
}

#[instrument(skip(state, body))]
async fn analyze_url(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(body): Json<AnalyzeUrlRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let result = state
        .analyzer
        .analyze_image(&body.image_url, body.description.as_deref())
        .await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct StorageUrlQuery {
    pub object_name: String,
}

#[derive(Debug, Serialize)]
pub struct StorageUrlResponse {
    pub object_name: String,
    pub url: String,
}

#[instrument(skip(state))]
async fn storage_url(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<StorageUrlQuery>,
) -> Result<Json<StorageUrlResponse>, ApiError> {
    let url = state
        .storage
        .presign_get(&q.object_name, state.config.storage.image_url_ttl_secs)
        .await
        .map_err(ApiError::Storage)?;
    Ok(Json(StorageUrlResponse {
        object_name: q.object_name,
        url,
    }))
}
