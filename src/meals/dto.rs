use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{AnalysisStatus, Meal, MealPatch, MealType};

/// Full meal record returned to the client. `image_url` is a freshly signed
/// display URL, minted per response; it is never the URL that was handed to
/// the analyzer.
#[derive(Debug, Serialize)]
pub struct MealResponse {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub meal_time: OffsetDateTime,
    pub meal_type: Option<MealType>,
    pub image_url: Option<String>,
    pub object_name: Option<String>,
    pub description: Option<String>,
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
    pub ingredients: Vec<String>,
    pub allergens: Vec<String>,
    pub health_notes: Option<String>,
    pub confidence: Option<f64>,
    pub analysis_status: AnalysisStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl MealResponse {
    pub fn from_meal(meal: Meal, image_url: Option<String>) -> Self {
        Self {
            id: meal.id,
            meal_time: meal.meal_time,
            meal_type: meal.meal_type,
            image_url,
            object_name: meal.object_name,
            description: meal.description,
            serving_size: meal.serving_size,
            calories: meal.calories,
            protein_g: meal.protein_g,
            fat_g: meal.fat_g,
            saturated_fat_g: meal.saturated_fat_g,
            carbohydrates_g: meal.carbohydrates_g,
            fiber_g: meal.fiber_g,
            sugar_g: meal.sugar_g,
            sodium_mg: meal.sodium_mg,
            cholesterol_mg: meal.cholesterol_mg,
            ingredients: meal.ingredients.map(|j| j.0).unwrap_or_default(),
            allergens: meal.allergens.map(|j| j.0).unwrap_or_default(),
            health_notes: meal.health_notes,
            confidence: meal.confidence,
            analysis_status: meal.analysis_status,
            created_at: meal.created_at,
        }
    }
}

/// Partial meal edit; absent fields keep their stored values.
#[derive(Debug, Default, Deserialize)]
pub struct MealUpdateRequest {
    pub meal_type: Option<MealType>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub meal_time: Option<OffsetDateTime>,
    pub description: Option<String>,
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
    pub ingredients: Option<Vec<String>>,
    pub allergens: Option<Vec<String>>,
    pub health_notes: Option<String>,
}

impl From<MealUpdateRequest> for MealPatch {
    fn from(r: MealUpdateRequest) -> Self {
        Self {
            meal_type: r.meal_type,
            meal_time: r.meal_time,
            description: r.description,
            serving_size: r.serving_size,
            calories: r.calories,
            protein_g: r.protein_g,
            fat_g: r.fat_g,
            saturated_fat_g: r.saturated_fat_g,
            carbohydrates_g: r.carbohydrates_g,
            fiber_g: r.fiber_g,
            sugar_g: r.sugar_g,
            sodium_mg: r.sodium_mg,
            cholesterol_mg: r.cholesterol_mg,
            ingredients: r.ingredients,
            allergens: r.allergens,
            health_notes: r.health_notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}
