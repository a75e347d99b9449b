use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::calories::{ActivityLevel, Sex};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub sex: Option<Sex>,
    pub activity_level: Option<ActivityLevel>,
    pub estimated_daily_calories: Option<i32>,
    pub created_at: OffsetDateTime,
}

/// Profile attributes written back by a profile update.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub sex: Option<Sex>,
    pub activity_level: Option<ActivityLevel>,
    pub estimated_daily_calories: Option<i32>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            age: self.age,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            sex: self.sex,
            activity_level: self.activity_level,
            estimated_daily_calories: self.estimated_daily_calories,
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<User>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Overwrites the profile columns, returning the updated row.
    async fn save_profile(&self, id: Uuid, profile: &UserProfile)
        -> anyhow::Result<Option<User>>;
}

const USER_COLUMNS: &str = "id, email, password_hash, age, height_cm, weight_kg, \
                            sex, activity_level, estimated_daily_calories, created_at";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = $1
            "#
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn save_profile(
        &self,
        id: Uuid,
        profile: &UserProfile,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET age = $2,
                height_cm = $3,
                weight_kg = $4,
                sex = $5,
                activity_level = $6,
                estimated_daily_calories = $7
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(profile.age)
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.sex)
        .bind(profile.activity_level)
        .bind(profile.estimated_daily_calories)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
