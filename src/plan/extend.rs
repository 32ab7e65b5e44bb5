use super::types::{GeneratedPlan, date_for_day};

/// Suffixes appended to the main meals of copied days, cycled by copy index.
pub const VARIATION_LABELS: [&str; 6] = [
    "Variation",
    "Remix",
    "Encore",
    "Revisited",
    "Chef's Choice",
    "Weekly Favorite",
];

/// Cycles through the existing days until the plan holds `target_days` days.
///
/// A plan that is already long enough comes back untouched.
pub fn extend_plan(mut plan: GeneratedPlan, target_days: u32) -> GeneratedPlan {
    let target = target_days as usize;
    let original = plan.days.len();
    if original == 0 || original >= target {
        return plan;
    }

    plan.days.reserve(target - original);
    let mut copies = 0usize;
    while plan.days.len() < target {
        let source = plan.days.len() % original;
        let mut day = plan.days[source].clone();
        let day_number = u32::try_from(plan.days.len() + 1).unwrap_or(u32::MAX);
        let label = VARIATION_LABELS[copies % VARIATION_LABELS.len()];

        day.day_number = day_number;
        day.calendar_date = date_for_day(plan.start_date, day_number);
        for meal in [
            &mut day.meals.breakfast,
            &mut day.meals.lunch,
            &mut day.meals.dinner,
        ] {
            meal.name = format!("{} ({label})", meal.name);
        }

        plan.days.push(day);
        copies += 1;
    }

    tracing::info!(
        generated = original,
        requested = target,
        copies,
        "extended plan by cycling generated days"
    );
    plan.refresh_nutrition_summary();
    plan
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;

    use super::*;
    use crate::plan::types::{DayMeals, DayPlan, MealSlot, NutrientTotals, Provenance};

    fn meal(name: &str) -> MealSlot {
        MealSlot {
            name: name.to_string(),
            calories: 500.0,
            ..MealSlot::default()
        }
    }

    fn plan(days: u32) -> GeneratedPlan {
        let start = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        let days = (1..=days)
            .map(|number| DayPlan {
                day_number: number,
                calendar_date: date_for_day(start, number),
                meals: DayMeals {
                    breakfast: meal(&format!("Breakfast {number}")),
                    lunch: meal(&format!("Lunch {number}")),
                    dinner: meal(&format!("Dinner {number}")),
                    snacks: vec![meal("Apple")],
                },
                totals: NutrientTotals {
                    calories: 2000.0,
                    ..NutrientTotals::default()
                },
            })
            .collect();

        GeneratedPlan {
            name: "Test".to_string(),
            description: String::new(),
            requested_duration_days: 7,
            start_date: start,
            days,
            shopping_list: BTreeSet::new(),
            notes: Vec::new(),
            nutrition_summary: NutrientTotals::default(),
            provenance: Provenance::Strict,
        }
    }

    #[test]
    fn single_day_is_cycled_to_a_week() {
        let extended = extend_plan(plan(1), 7);

        assert_eq!(extended.days.len(), 7);
        for (index, day) in extended.days.iter().enumerate() {
            assert_eq!(day.day_number as usize, index + 1);
        }
        assert_eq!(
            extended.days[6].calendar_date,
            NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
        );
        assert_eq!(extended.days[0].meals.breakfast.name, "Breakfast 1");
        assert_eq!(extended.days[1].meals.breakfast.name, "Breakfast 1 (Variation)");
        assert_eq!(extended.days[2].meals.dinner.name, "Dinner 1 (Remix)");
        assert_eq!(
            extended.days[6].meals.lunch.name,
            "Lunch 1 (Weekly Favorite)"
        );
        assert_eq!(extended.days[3].meals.snacks[0].name, "Apple");
        assert_eq!(extended.nutrition_summary.calories, 2000.0);
    }

    #[test]
    fn copies_cycle_through_original_days() {
        let extended = extend_plan(plan(2), 5);
        let breakfasts: Vec<&str> = extended
            .days
            .iter()
            .map(|day| day.meals.breakfast.name.as_str())
            .collect();
        assert_eq!(
            breakfasts,
            vec![
                "Breakfast 1",
                "Breakfast 2",
                "Breakfast 1 (Variation)",
                "Breakfast 2 (Remix)",
                "Breakfast 1 (Encore)",
            ]
        );
    }

    #[test]
    fn extension_is_idempotent() {
        let once = extend_plan(plan(1), 4);
        let twice = extend_plan(once.clone(), 4);
        assert_eq!(once, twice);
    }

    #[test]
    fn long_enough_plan_is_unchanged() {
        let original = plan(3);
        assert_eq!(extend_plan(original.clone(), 2), original);
        assert_eq!(extend_plan(original.clone(), 3), original);
    }
}
