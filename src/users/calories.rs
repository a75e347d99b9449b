use serde::{Deserialize, Serialize};

/// Sex for BMR purposes. OTHER averages the MALE and FEMALE formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sex", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    Male,
    Female,
    Other,
}

/// Activity level applied as a multiplier on BMR to estimate TDEE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_level", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

impl ActivityLevel {
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtremelyActive => 1.9,
        }
    }
}

/// Basal metabolic rate per the Mifflin-St Jeor equation.
///
/// men: 10 × weight(kg) + 6.25 × height(cm) − 5 × age + 5
/// women: 10 × weight(kg) + 6.25 × height(cm) − 5 × age − 161
/// other: average of both
pub fn bmr(weight_kg: f64, height_cm: f64, age: i32, sex: Sex) -> i32 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    let value = match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
        Sex::Other => ((base + 5.0) + (base - 161.0)) / 2.0,
    };
    value.round() as i32
}

/// Total daily energy expenditure: BMR scaled by the activity multiplier.
pub fn tdee(bmr: i32, activity: ActivityLevel) -> i32 {
    (f64::from(bmr) * activity.multiplier()).round() as i32
}

/// Daily calorie estimate from a profile; `None` while any field is missing.
pub fn estimated_daily_calories(
    weight_kg: Option<f64>,
    height_cm: Option<f64>,
    age: Option<i32>,
    sex: Option<Sex>,
    activity: Option<ActivityLevel>,
) -> Option<i32> {
    Some(tdee(bmr(weight_kg?, height_cm?, age?, sex?), activity?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmr_male() {
        // 10*80 + 6.25*180 - 5*30 + 5 = 1780
        assert_eq!(bmr(80.0, 180.0, 30, Sex::Male), 1780);
    }

    #[test]
    fn bmr_female() {
        // 10*60 + 6.25*165 - 5*25 - 161 = 1345 (600 + 1031.25 - 125 - 161 = 1345.25)
        assert_eq!(bmr(60.0, 165.0, 25, Sex::Female), 1345);
    }

    #[test]
    fn bmr_other_is_average() {
        let male = bmr(70.0, 175.0, 40, Sex::Male);
        let female = bmr(70.0, 175.0, 40, Sex::Female);
        let other = bmr(70.0, 175.0, 40, Sex::Other);
        assert_eq!(other, ((male + female) as f64 / 2.0).round() as i32);
    }

    #[test]
    fn tdee_applies_multiplier() {
        assert_eq!(tdee(1780, ActivityLevel::Sedentary), 2136);
        assert_eq!(tdee(2000, ActivityLevel::ExtremelyActive), 3800);
    }

    #[test]
    fn estimate_requires_full_profile() {
        assert_eq!(
            estimated_daily_calories(
                Some(80.0),
                Some(180.0),
                Some(30),
                Some(Sex::Male),
                Some(ActivityLevel::Sedentary)
            ),
            Some(2136)
        );
        assert_eq!(
            estimated_daily_calories(
                Some(80.0),
                None,
                Some(30),
                Some(Sex::Male),
                Some(ActivityLevel::Sedentary)
            ),
            None
        );
    }
}
