use serde::Serialize;
use time::Date;

/// Totals for one calendar date. Fields a meal never got (analysis failed
/// or incomplete) count as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyNutritionStats {
    pub date: Date,
    pub total_calories: i64,
    pub total_protein_g: f64,
    pub total_fat_g: f64,
    pub total_saturated_fat_g: f64,
    pub total_carbohydrates_g: f64,
    pub total_fiber_g: f64,
    pub total_sugar_g: f64,
    pub total_sodium_mg: f64,
    pub total_cholesterol_mg: f64,
    pub meal_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealTypeDistribution {
    pub meal_type: String,
    pub count: usize,
    pub percentage: f64,
}

/// Averages are per day with data: days without meals do not appear in the
/// grouping and therefore never dilute the denominator.
#[derive(Debug, Clone, Serialize)]
pub struct NutritionSummary {
    pub total_meals: usize,
    pub avg_calories_per_day: f64,
    pub avg_protein_per_day: f64,
    pub avg_carbs_per_day: f64,
    pub avg_fat_per_day: f64,
    pub daily_stats: Vec<DailyNutritionStats>,
    pub meal_type_distribution: Vec<MealTypeDistribution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodStats {
    pub total_meals: usize,
    pub total_days: u32,
    pub active_days: usize,
    pub avg_calories: f64,
    pub total_calories: f64,
    pub avg_protein: f64,
    pub avg_carbs: f64,
    pub avg_fat: f64,
}

/// One response covering the week / month / six-month convenience views.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodicSummary {
    pub week: PeriodStats,
    pub month: PeriodStats,
    pub six_months: PeriodStats,
}
