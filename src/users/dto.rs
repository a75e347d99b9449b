use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calories::{ActivityLevel, Sex};
use crate::auth::repo::User;

/// Profile update. All fields are optional; only provided fields change.
#[derive(Debug, Default, Deserialize)]
pub struct UserProfileRequest {
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub sex: Option<Sex>,
    pub activity_level: Option<ActivityLevel>,
}

#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub sex: Option<Sex>,
    pub activity_level: Option<ActivityLevel>,
    pub estimated_daily_calories: Option<i32>,
}

impl From<User> for UserProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            age: user.age,
            height_cm: user.height_cm,
            weight_kg: user.weight_kg,
            sex: user.sex,
            activity_level: user.activity_level,
            estimated_daily_calories: user.estimated_daily_calories,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailyCaloriesResponse {
    pub estimated_daily_calories: i32,
}
