use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::analyzer::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "meal_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "BREAKFAST",
            MealType::Lunch => "LUNCH",
            MealType::Dinner => "DINNER",
            MealType::Snack => "SNACK",
        }
    }
}

impl std::str::FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BREAKFAST" => Ok(MealType::Breakfast),
            "LUNCH" => Ok(MealType::Lunch),
            "DINNER" => Ok(MealType::Dinner),
            "SNACK" => Ok(MealType::Snack),
            other => Err(format!("unknown meal type: {other}")),
        }
    }
}

/// Lifecycle of a meal's nutrition analysis. A meal is created PENDING and
/// moved exactly once, within the same upload request, to COMPLETED or
/// FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "analysis_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalysisStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_time: OffsetDateTime,
    pub meal_type: Option<MealType>,
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
    pub ingredients: Option<Json<Vec<String>>>,
    pub allergens: Option<Json<Vec<String>>>,
    pub health_notes: Option<String>,
    pub confidence: Option<f64>,
    pub analysis_status: AnalysisStatus,
    pub created_at: OffsetDateTime,
}

/// Fields of a freshly accepted upload, persisted before analysis runs.
#[derive(Debug, Clone)]
pub struct NewMeal {
    pub user_id: Uuid,
    pub meal_time: OffsetDateTime,
    pub meal_type: Option<MealType>,
    pub object_name: Option<String>,
    pub description: Option<String>,
}

/// Partial update; only provided fields overwrite the stored row.
#[derive(Debug, Clone, Default)]
pub struct MealPatch {
    pub meal_type: Option<MealType>,
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

/// Keyed meal persistence. Lookups are scoped to the owning user: a meal id
/// owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait MealStore: Send + Sync {
    async fn insert_pending(&self, new_meal: NewMeal) -> anyhow::Result<Meal>;
    async fn complete_analysis(
        &self,
        meal_id: Uuid,
        result: &AnalysisResult,
    ) -> anyhow::Result<Meal>;
    async fn mark_analysis_failed(&self, meal_id: Uuid) -> anyhow::Result<Meal>;
    async fn get_owned(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Option<Meal>>;
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Meal>>;
    async fn list_by_range(
        &self,
        user_id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<Meal>>;
    async fn list_by_type(&self, user_id: Uuid, meal_type: MealType)
        -> anyhow::Result<Vec<Meal>>;
    async fn update(
        &self,
        user_id: Uuid,
        meal_id: Uuid,
        patch: MealPatch,
    ) -> anyhow::Result<Option<Meal>>;
    async fn delete(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Option<Meal>>;
}

const MEAL_COLUMNS: &str = "id, user_id, meal_time, meal_type, object_name, description, \
                            serving_size, calories, protein_g, fat_g, saturated_fat_g, \
                            carbohydrates_g, fiber_g, sugar_g, sodium_mg, cholesterol_mg, \
                            ingredients, allergens, health_notes, confidence, \
                            analysis_status, created_at";

pub struct PgMealStore {
    pool: PgPool,
}

impl PgMealStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MealStore for PgMealStore {
    async fn insert_pending(&self, new_meal: NewMeal) -> anyhow::Result<Meal> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            INSERT INTO meals (user_id, meal_time, meal_type, object_name, description, analysis_status)
            VALUES ($1, $2, $3, $4, $5, 'PENDING')
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(new_meal.user_id)
        .bind(new_meal.meal_time)
        .bind(new_meal.meal_type)
        .bind(new_meal.object_name)
        .bind(new_meal.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(meal)
    }

    async fn complete_analysis(
        &self,
        meal_id: Uuid,
        result: &AnalysisResult,
    ) -> anyhow::Result<Meal> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            UPDATE meals
            SET serving_size = $2,
                calories = $3,
                protein_g = $4,
                fat_g = $5,
                saturated_fat_g = $6,
                carbohydrates_g = $7,
                fiber_g = $8,
                sugar_g = $9,
                sodium_mg = $10,
                cholesterol_mg = $11,
                ingredients = $12,
                allergens = $13,
                health_notes = $14,
                confidence = $15,
                analysis_status = 'COMPLETED'
            WHERE id = $1
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(meal_id)
        .bind(&result.serving_size)
        .bind(result.calories)
        .bind(result.protein_g)
        .bind(result.fat_g)
        .bind(result.saturated_fat_g)
        .bind(result.carbohydrates_g)
        .bind(result.fiber_g)
        .bind(result.sugar_g)
        .bind(result.sodium_mg)
        .bind(result.cholesterol_mg)
        .bind(Json(result.ingredients.clone()))
        .bind(Json(result.allergens.clone()))
        .bind(&result.health_notes)
        .bind(result.confidence)
        .fetch_one(&self.pool)
        .await?;
        Ok(meal)
    }

    async fn mark_analysis_failed(&self, meal_id: Uuid) -> anyhow::Result<Meal> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            UPDATE meals
            SET analysis_status = 'FAILED'
            WHERE id = $1
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(meal_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(meal)
    }

    async fn get_owned(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Option<Meal>> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
            FROM meals
            WHERE id = $1 AND user_id = $2
            "#
        ))
        .bind(meal_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(meal)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Meal>> {
        let meals = sqlx::query_as::<_, Meal>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
            FROM meals
            WHERE user_id = $1
            ORDER BY meal_time DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(meals)
    }

    async fn list_by_range(
        &self,
        user_id: Uuid,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> anyhow::Result<Vec<Meal>> {
        let meals = sqlx::query_as::<_, Meal>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
            FROM meals
            WHERE user_id = $1 AND meal_time BETWEEN $2 AND $3
            ORDER BY meal_time DESC
            "#
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(meals)
    }

    async fn list_by_type(
        &self,
        user_id: Uuid,
        meal_type: MealType,
    ) -> anyhow::Result<Vec<Meal>> {
        let meals = sqlx::query_as::<_, Meal>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
            FROM meals
            WHERE user_id = $1 AND meal_type = $2
            ORDER BY meal_time DESC
            "#
        ))
        .bind(user_id)
        .bind(meal_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(meals)
    }

    async fn update(
        &self,
        user_id: Uuid,
        meal_id: Uuid,
        patch: MealPatch,
    ) -> anyhow::Result<Option<Meal>> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            UPDATE meals
            SET meal_type = COALESCE($3, meal_type),
                meal_time = COALESCE($4, meal_time),
                description = COALESCE($5, description),
                serving_size = COALESCE($6, serving_size),
                calories = COALESCE($7, calories),
                protein_g = COALESCE($8, protein_g),
                fat_g = COALESCE($9, fat_g),
                saturated_fat_g = COALESCE($10, saturated_fat_g),
                carbohydrates_g = COALESCE($11, carbohydrates_g),
                fiber_g = COALESCE($12, fiber_g),
                sugar_g = COALESCE($13, sugar_g),
                sodium_mg = COALESCE($14, sodium_mg),
                cholesterol_mg = COALESCE($15, cholesterol_mg),
                ingredients = COALESCE($16, ingredients),
                allergens = COALESCE($17, allergens),
                health_notes = COALESCE($18, health_notes)
            WHERE id = $1 AND user_id = $2
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(meal_id)
        .bind(user_id)
        .bind(patch.meal_type)
        .bind(patch.meal_time)
        .bind(patch.description)
        .bind(patch.serving_size)
        .bind(patch.calories)
        .bind(patch.protein_g)
        .bind(patch.fat_g)
        .bind(patch.saturated_fat_g)
        .bind(patch.carbohydrates_g)
        .bind(patch.fiber_g)
        .bind(patch.sugar_g)
        .bind(patch.sodium_mg)
        .bind(patch.cholesterol_mg)
        .bind(patch.ingredients.map(Json))
        .bind(patch.allergens.map(Json))
        .bind(patch.health_notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(meal)
    }

    async fn delete(&self, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<Option<Meal>> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            DELETE FROM meals
            WHERE id = $1 AND user_id = $2
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(meal_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(meal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_type_parses_case_insensitively() {
        assert_eq!("BREAKFAST".parse::<MealType>(), Ok(MealType::Breakfast));
        assert_eq!("lunch".parse::<MealType>(), Ok(MealType::Lunch));
        assert_eq!("Dinner".parse::<MealType>(), Ok(MealType::Dinner));
        assert_eq!("snack".parse::<MealType>(), Ok(MealType::Snack));
        assert!("brunch".parse::<MealType>().is_err());
    }

    #[test]
    fn meal_type_round_trips_through_as_str() {
        for ty in [
            MealType::Breakfast,
            MealType::Lunch,
            MealType::Dinner,
            MealType::Snack,
        ] {
            assert_eq!(ty.as_str().parse::<MealType>(), Ok(ty));
        }
    }
}
