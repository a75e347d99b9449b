use std::collections::BTreeMap;

use time::Date;

use super::dto::{DailyNutritionStats, MealTypeDistribution, NutritionSummary, PeriodStats};
use crate::meals::repo::Meal;

/// Groups meals by the calendar date of `meal_time` and sums every
/// nutrition field per day, ordered by date ascending.
pub fn daily_stats(meals: &[Meal]) -> Vec<DailyNutritionStats> {
    let mut by_date: BTreeMap<Date, Vec<&Meal>> = BTreeMap::new();
    for meal in meals {
        by_date.entry(meal.meal_time.date()).or_default().push(meal);
    }
    by_date
        .into_iter()
        .map(|(date, day)| day_totals(date, &day))
        .collect()
}

fn day_totals(date: Date, meals: &[&Meal]) -> DailyNutritionStats {
    DailyNutritionStats {
        date,
        total_calories: meals
            .iter()
            .map(|m| i64::from(m.calories.unwrap_or(0)))
            .sum(),
        total_protein_g: sum(meals, |m| m.protein_g),
        total_fat_g: sum(meals, |m| m.fat_g),
        total_saturated_fat_g: sum(meals, |m| m.saturated_fat_g),
        total_carbohydrates_g: sum(meals, |m| m.carbohydrates_g),
        total_fiber_g: sum(meals, |m| m.fiber_g),
        total_sugar_g: sum(meals, |m| m.sugar_g),
        total_sodium_mg: sum(meals, |m| m.sodium_mg),
        total_cholesterol_mg: sum(meals, |m| m.cholesterol_mg),
        meal_count: meals.len(),
    }
}

fn sum(meals: &[&Meal], field: impl Fn(&Meal) -> Option<f64>) -> f64 {
    meals.iter().map(|m| field(m).unwrap_or(0.0)).sum()
}

/// Counts meals per present meal type; percentage is of all matched meals
/// (typed or not). Sorted by type name.
pub fn meal_type_distribution(meals: &[Meal]) -> Vec<MealTypeDistribution> {
    if meals.is_empty() {
        return Vec::new();
    }
    let total = meals.len() as f64;
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for meal in meals {
        if let Some(ty) = meal.meal_type {
            *counts.entry(ty.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(name, count)| MealTypeDistribution {
            meal_type: name.to_string(),
            count,
            percentage: count as f64 * 100.0 / total,
        })
        .collect()
}

pub fn summary(meals: &[Meal]) -> NutritionSummary {
    let daily = daily_stats(meals);
    if daily.is_empty() {
        return NutritionSummary {
            total_meals: 0,
            avg_calories_per_day: 0.0,
            avg_protein_per_day: 0.0,
            avg_carbs_per_day: 0.0,
            avg_fat_per_day: 0.0,
            daily_stats: Vec::new(),
            meal_type_distribution: Vec::new(),
        };
    }

    let days = daily.len() as f64;
    NutritionSummary {
        total_meals: meals.len(),
        avg_calories_per_day: daily.iter().map(|d| d.total_calories as f64).sum::<f64>() / days,
        avg_protein_per_day: daily.iter().map(|d| d.total_protein_g).sum::<f64>() / days,
        avg_carbs_per_day: daily.iter().map(|d| d.total_carbohydrates_g).sum::<f64>() / days,
        avg_fat_per_day: daily.iter().map(|d| d.total_fat_g).sum::<f64>() / days,
        daily_stats: daily,
        meal_type_distribution: meal_type_distribution(meals),
    }
}

/// Same aggregation over a fixed-length window, also reporting how many of
/// the window's days actually have data.
pub fn period_stats(meals: &[Meal], total_days: u32) -> PeriodStats {
    let daily = daily_stats(meals);
    if daily.is_empty() {
        return PeriodStats {
            total_meals: 0,
            total_days,
            active_days: 0,
            avg_calories: 0.0,
            total_calories: 0.0,
            avg_protein: 0.0,
            avg_carbs: 0.0,
            avg_fat: 0.0,
        };
    }

    let active_days = daily.len();
    let days = active_days as f64;
    PeriodStats {
        total_meals: daily.iter().map(|d| d.meal_count).sum(),
        total_days,
        active_days,
        avg_calories: daily.iter().map(|d| d.total_calories as f64).sum::<f64>() / days,
        total_calories: daily.iter().map(|d| d.total_calories as f64).sum(),
        avg_protein: daily.iter().map(|d| d.total_protein_g).sum::<f64>() / days,
        avg_carbs: daily.iter().map(|d| d.total_carbohydrates_g).sum::<f64>() / days,
        avg_fat: daily.iter().map(|d| d.total_fat_g).sum::<f64>() / days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meals::repo::{AnalysisStatus, MealType};
    use time::macros::datetime;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn meal(
        meal_time: OffsetDateTime,
        meal_type: Option<MealType>,
        calories: Option<i32>,
        protein_g: Option<f64>,
    ) -> Meal {
        Meal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            meal_time,
            meal_type,
            object_name: None,
            description: None,
            serving_size: None,
            calories,
            protein_g,
            fat_g: None,
            saturated_fat_g: None,
            carbohydrates_g: None,
            fiber_g: None,
            sugar_g: None,
            sodium_mg: None,
            cholesterol_mg: None,
            ingredients: None,
            allergens: None,
            health_notes: None,
            confidence: None,
            analysis_status: AnalysisStatus::Completed,
            created_at: meal_time,
        }
    }

    #[test]
    fn daily_sums_match_hand_computed_totals() {
        let meals = vec![
            meal(datetime!(2026-03-01 08:00 UTC), Some(MealType::Breakfast), Some(400), Some(20.0)),
            meal(datetime!(2026-03-01 19:30 UTC), Some(MealType::Dinner), Some(800), Some(35.0)),
            meal(datetime!(2026-03-02 12:15 UTC), Some(MealType::Lunch), Some(600), None),
            meal(datetime!(2026-03-04 07:45 UTC), Some(MealType::Breakfast), Some(300), Some(10.0)),
        ];

        let daily = daily_stats(&meals);
        assert_eq!(daily.len(), 3);

        assert_eq!(daily[0].date, datetime!(2026-03-01 00:00 UTC).date());
        assert_eq!(daily[0].total_calories, 1200);
        assert_eq!(daily[0].total_protein_g, 55.0);
        assert_eq!(daily[0].meal_count, 2);

        assert_eq!(daily[1].total_calories, 600);
        // Absent fields count as zero, never poison the sum.
        assert_eq!(daily[1].total_protein_g, 0.0);

        assert_eq!(daily[2].total_calories, 300);
        assert_eq!(daily[2].meal_count, 1);
    }

    #[test]
    fn summary_averages_over_days_with_data_only() {
        let meals = vec![
            meal(datetime!(2026-03-01 08:00 UTC), None, Some(1200), None),
            meal(datetime!(2026-03-02 08:00 UTC), None, Some(600), None),
            meal(datetime!(2026-03-04 08:00 UTC), None, Some(300), None),
        ];

        let s = summary(&meals);
        assert_eq!(s.total_meals, 3);
        // (1200 + 600 + 300) / 3 days with data — not divided by the span.
        assert_eq!(s.avg_calories_per_day, 700.0);
        assert_eq!(s.daily_stats.len(), 3);
    }

    #[test]
    fn empty_input_yields_zeroed_summary() {
        let s = summary(&[]);
        assert_eq!(s.total_meals, 0);
        assert_eq!(s.avg_calories_per_day, 0.0);
        assert!(s.daily_stats.is_empty());
        assert!(s.meal_type_distribution.is_empty());
    }

    #[test]
    fn distribution_counts_present_types_sorted_by_name() {
        let at = datetime!(2026-03-01 12:00 UTC);
        let meals = vec![
            meal(at, Some(MealType::Lunch), None, None),
            meal(at, Some(MealType::Breakfast), None, None),
            meal(at, Some(MealType::Lunch), None, None),
            meal(at, None, None, None),
        ];

        let dist = meal_type_distribution(&meals);
        assert_eq!(dist.len(), 2);
        assert_eq!(dist[0].meal_type, "BREAKFAST");
        assert_eq!(dist[0].count, 1);
        assert_eq!(dist[0].percentage, 25.0);
        assert_eq!(dist[1].meal_type, "LUNCH");
        assert_eq!(dist[1].count, 2);
        assert_eq!(dist[1].percentage, 50.0);
    }

    #[test]
    fn period_reports_active_days_out_of_total() {
        let meals = vec![
            meal(datetime!(2026-03-01 08:00 UTC), None, Some(500), None),
            meal(datetime!(2026-03-01 13:00 UTC), None, Some(700), None),
            meal(datetime!(2026-03-03 08:00 UTC), None, Some(400), None),
        ];

        let p = period_stats(&meals, 7);
        assert_eq!(p.total_days, 7);
        assert_eq!(p.active_days, 2);
        assert_eq!(p.total_meals, 3);
        assert_eq!(p.total_calories, 1600.0);
        // Average over the 2 active days, not over 7.
        assert_eq!(p.avg_calories, 800.0);
    }

    #[test]
    fn empty_period_keeps_total_days() {
        let p = period_stats(&[], 30);
        assert_eq!(p.total_days, 30);
        assert_eq!(p.active_days, 0);
        assert_eq!(p.avg_calories, 0.0);
    }
}
