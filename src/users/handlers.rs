use axum::{extract::State, Json};
use tracing::{debug, info, instrument};

use super::calories::estimated_daily_calories;
use super::dto::{DailyCaloriesResponse, UserProfileRequest, UserProfileResponse};
use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProfileResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UserProfileRequest>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    validate(&payload)?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;

    let mut profile = user.profile();
    if let Some(age) = payload.age {
        profile.age = Some(age);
    }
    if let Some(height) = payload.height_cm {
        profile.height_cm = Some(height);
    }
    if let Some(weight) = payload.weight_kg {
        profile.weight_kg = Some(weight);
    }
    if let Some(sex) = payload.sex {
        profile.sex = Some(sex);
    }
    if let Some(level) = payload.activity_level {
        profile.activity_level = Some(level);
    }

    // Recompute the daily estimate once the profile is complete; an
    // incomplete profile keeps whatever estimate was stored before.
    match estimated_daily_calories(
        profile.weight_kg,
        profile.height_cm,
        profile.age,
        profile.sex,
        profile.activity_level,
    ) {
        Some(estimate) => {
            info!(user_id = %user_id, estimate, "updated daily calorie estimate");
            profile.estimated_daily_calories = Some(estimate);
        }
        None => {
            debug!(user_id = %user_id, "profile incomplete, estimate not recomputed");
        }
    }

    let updated = state
        .users
        .save_profile(user_id, &profile)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;
    Ok(Json(updated.into()))
}

#[instrument(skip(state))]
pub async fn daily_calories(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DailyCaloriesResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;

    let estimate = estimated_daily_calories(
        user.weight_kg,
        user.height_cm,
        user.age,
        user.sex,
        user.activity_level,
    )
    .ok_or_else(|| {
        ApiError::IncompleteProfile(
            "weight, height, age, sex and activity level must all be set to calculate daily calories"
                .into(),
        )
    })?;

    Ok(Json(DailyCaloriesResponse {
        estimated_daily_calories: estimate,
    }))
}

fn validate(payload: &UserProfileRequest) -> Result<(), ApiError> {
    if let Some(age) = payload.age {
        if !(10..=150).contains(&age) {
            return Err(ApiError::Validation("age must be between 10 and 150".into()));
        }
    }
    if let Some(height) = payload.height_cm {
        if !(30.0..=300.0).contains(&height) {
            return Err(ApiError::Validation(
                "height must be between 30 and 300 cm".into(),
            ));
        }
    }
    if let Some(weight) = payload.weight_kg {
        if !(1.0..=500.0).contains(&weight) {
            return Err(ApiError::Validation(
                "weight must be between 1 and 500 kg".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_bounds_are_enforced() {
        let ok = UserProfileRequest {
            age: Some(30),
            height_cm: Some(180.0),
            weight_kg: Some(80.0),
            ..Default::default()
        };
        assert!(validate(&ok).is_ok());

        let too_young = UserProfileRequest {
            age: Some(5),
            ..Default::default()
        };
        assert!(matches!(
            validate(&too_young),
            Err(ApiError::Validation(_))
        ));

        let too_tall = UserProfileRequest {
            height_cm: Some(400.0),
            ..Default::default()
        };
        assert!(matches!(validate(&too_tall), Err(ApiError::Validation(_))));

        let empty = UserProfileRequest::default();
        assert!(validate(&empty).is_ok());
    }
}
