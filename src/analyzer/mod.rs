pub mod handlers;
pub mod service;
pub mod vision;

use axum::{async_trait, Router};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::images::ImageError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::debug_routes()
}

/// Structured output of one analysis call. Transient: it is folded into a
/// meal record, never persisted on its own. Absent and explicitly-null
/// fields both decode to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub serving_size: Option<String>,
    pub calories: Option<i32>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub saturated_fat_g: Option<f64>,
    pub carbohydrates_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    pub cholesterol_mg: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allergens: Vec<String>,
    pub health_notes: Option<String>,
    pub confidence: Option<f64>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Transport failure, non-success status or an empty/missing choice.
    #[error("vision service error: {0}")]
    Service(String),
    /// The model replied with something other than the mandated JSON object.
    #[error("invalid analysis response: {0}")]
    Parse(String),
    /// The model's `{"error": …}` sentinel: the input is not a food item.
    #[error("not a food item: {0}")]
    NotFood(String),
    #[error("image preparation failed: {0}")]
    Image(#[from] ImageError),
}

/// Narrow seam between the upload orchestrator and the vision pipeline.
#[async_trait]
pub trait AnalyzerClient: Send + Sync {
    /// Analyze a stored image, reachable through `image_url`, with the
    /// user's description as supplementary context.
    async fn analyze_image(
        &self,
        image_url: &str,
        description: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError>;

    /// Analyze a meal from its text description alone.
    async fn analyze_text_only(&self, description: &str)
        -> Result<AnalysisResult, AnalysisError>;
}
