use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{DailyNutritionStats, MealTypeDistribution, NutritionSummary, PeriodStats, PeriodicSummary};
use super::service;
use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Optional RFC 3339 bounds; defaults to the last 30 days.
#[derive(Debug, Default, Deserialize)]
pub struct StatsRangeQuery {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
}

fn resolve_range(q: &StatsRangeQuery) -> (OffsetDateTime, OffsetDateTime) {
    let today = OffsetDateTime::now_utc().date();
    let start = q.start.unwrap_or_else(|| day_start(today - Duration::days(30)));
    let end = q.end.unwrap_or_else(|| day_end(today));
    (start, end)
}

fn day_start(date: Date) -> OffsetDateTime {
    date.midnight().assume_utc()
}

fn day_end(date: Date) -> OffsetDateTime {
    day_start(date) + Duration::days(1) - Duration::nanoseconds(1)
}

fn period_bounds(days: i64) -> (OffsetDateTime, OffsetDateTime) {
    let today = OffsetDateTime::now_utc().date();
    (day_start(today - Duration::days(days - 1)), day_end(today))
}

#[instrument(skip(state))]
pub async fn daily(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<StatsRangeQuery>,
) -> Result<Json<Vec<DailyNutritionStats>>, ApiError> {
    let (start, end) = resolve_range(&q);
    let meals = state.meals.list_by_range(user_id, start, end).await?;
    Ok(Json(service::daily_stats(&meals)))
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<StatsRangeQuery>,
) -> Result<Json<NutritionSummary>, ApiError> {
    let (start, end) = resolve_range(&q);
    let meals = state.meals.list_by_range(user_id, start, end).await?;
    Ok(Json(service::summary(&meals)))
}

#[instrument(skip(state))]
pub async fn meal_distribution(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<StatsRangeQuery>,
) -> Result<Json<Vec<MealTypeDistribution>>, ApiError> {
    let (start, end) = resolve_range(&q);
    let meals = state.meals.list_by_range(user_id, start, end).await?;
    Ok(Json(service::meal_type_distribution(&meals)))
}

#[instrument(skip(state))]
pub async fn weekly(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PeriodStats>, ApiError> {
    Ok(Json(period(&state, user_id, 7).await?))
}

#[instrument(skip(state))]
pub async fn monthly(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PeriodStats>, ApiError> {
    Ok(Json(period(&state, user_id, 30).await?))
}

#[instrument(skip(state))]
pub async fn periodic_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PeriodicSummary>, ApiError> {
    Ok(Json(PeriodicSummary {
        week: period(&state, user_id, 7).await?,
        month: period(&state, user_id, 30).await?,
        six_months: period(&state, user_id, 180).await?,
    }))
}

async fn period(state: &AppState, user_id: Uuid, days: i64) -> Result<PeriodStats, ApiError> {
    let (start, end) = period_bounds(days);
    let meals = state.meals.list_by_range(user_id, start, end).await?;
    Ok(service::period_stats(&meals, days as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn day_bounds_cover_the_whole_date() {
        let start = day_start(date!(2026 - 03 - 01));
        let end = day_end(date!(2026 - 03 - 01));
        assert_eq!(start.date(), end.date());
        assert!(end > start);
        assert_eq!((end - start).whole_days(), 0);
        assert_eq!(end.date().next_day().unwrap(), date!(2026 - 03 - 02));
    }

    #[test]
    fn period_bounds_span_the_requested_days() {
        let (start, end) = period_bounds(7);
        // 6 whole days back plus the partial current day.
        assert_eq!((end - start).whole_days(), 6);
        assert!(end > start);
    }
}
