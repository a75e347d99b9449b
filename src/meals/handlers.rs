use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{MealResponse, MealUpdateRequest, RangeQuery};
use super::repo::MealType;
use super::services::{self, MealUpload};
use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals))
        .route("/meals/range", get(list_meals_in_range))
        .route("/meals/type/:meal_type", get(list_meals_by_type))
        .route("/meals/:id", get(get_meal))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/upload", post(upload_meal))
        .route("/meals/:id", put(update_meal).delete(delete_meal))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// POST /meals/upload (multipart)
/// Fields: `image` (file, optional), `meal_type`, `meal_time` (RFC 3339),
/// `description`. At least one of image/description is required.
#[instrument(skip(state, multipart))]
pub async fn upload_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MealResponse>), ApiError> {
    let mut upload = MealUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart payload: {e}")))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("image") => {
                upload.content_type = field.content_type().map(|s| s.to_string());
                upload.image = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::Validation(format!("unreadable image: {e}")))?,
                );
            }
            Some("meal_type") => {
                let text = read_text(field).await?;
                if !text.trim().is_empty() {
                    upload.meal_type =
                        Some(text.trim().parse::<MealType>().map_err(ApiError::Validation)?);
                }
            }
            Some("meal_time") => {
                let text = read_text(field).await?;
                if !text.trim().is_empty() {
                    let parsed = OffsetDateTime::parse(text.trim(), &Rfc3339).map_err(|_| {
                        ApiError::Validation(format!("meal_time must be RFC 3339, got {text:?}"))
                    })?;
                    upload.meal_time = Some(parsed);
                }
            }
            Some("description") => {
                upload.description = Some(read_text(field).await?);
            }
            _ => {}
        }
    }

    let response = services::upload_meal(&state, user_id, upload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::Validation(format!("unreadable field: {e}")))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MealResponse>, ApiError> {
    Ok(Json(services::get_meal(&state, user_id, id).await?))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<MealResponse>>, ApiError> {
    Ok(Json(services::list_meals(&state, user_id).await?))
}

#[instrument(skip(state))]
pub async fn list_meals_in_range(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<MealResponse>>, ApiError> {
    if range.end < range.start {
        return Err(ApiError::Validation("end must not precede start".into()));
    }
    Ok(Json(
        services::list_meals_in_range(&state, user_id, range.start, range.end).await?,
    ))
}

#[instrument(skip(state))]
pub async fn list_meals_by_type(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(meal_type): Path<String>,
) -> Result<Json<Vec<MealResponse>>, ApiError> {
    let meal_type = meal_type
        .parse::<MealType>()
        .map_err(ApiError::Validation)?;
    Ok(Json(
        services::list_meals_by_type(&state, user_id, meal_type).await?,
    ))
}

#[instrument(skip(state, body))]
pub async fn update_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MealUpdateRequest>,
) -> Result<Json<MealResponse>, ApiError> {
    Ok(Json(
        services::update_meal(&state, user_id, id, body.into()).await?,
    ))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    services::delete_meal(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
