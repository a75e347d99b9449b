pub mod dto;
pub mod handlers;
pub mod service;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/statistics/daily", get(handlers::daily))
        .route("/statistics/summary", get(handlers::summary))
        .route("/statistics/meal-distribution", get(handlers::meal_distribution))
        .route("/statistics/weekly", get(handlers::weekly))
        .route("/statistics/monthly", get(handlers::monthly))
        .route("/statistics/periodic-summary", get(handlers::periodic_summary))
}
