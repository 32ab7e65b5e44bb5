//! Shape check and lenient conversion of a parsed plan document.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::error::PlanGenerationError;
use super::types::{
    DayMeals, DayPlan, GeneratedPlan, MealSlot, NutrientTotals, PlanRequest, Provenance,
    date_for_day,
};

pub(crate) const REQUIRED_SLOTS: [&str; 3] = ["breakfast", "lunch", "dinner"];

/// True when `day` carries all three mandatory meals as objects.
pub(crate) fn has_required_meals(day: &Value) -> bool {
    day.get("meals").is_some_and(|meals| {
        REQUIRED_SLOTS
            .iter()
            .all(|slot| meals.get(slot).is_some_and(Value::is_object))
    })
}

/// Converts a parsed document into a [`GeneratedPlan`].
///
/// The first missing mandatory item is reported as a path such as
/// `days[1].meals.dinner`. Day numbers and dates are rewritten from the
/// request so they are contiguous whatever the model produced.
pub fn validate_plan(
    value: &Value,
    request: &PlanRequest,
    provenance: Provenance,
) -> Result<GeneratedPlan, PlanGenerationError> {
    let document = value
        .as_object()
        .ok_or_else(|| PlanGenerationError::missing("name"))?;

    let name = document
        .get("name")
        .and_then(text)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| PlanGenerationError::missing("name"))?;

    let raw_days = document
        .get("days")
        .and_then(Value::as_array)
        .filter(|days| !days.is_empty())
        .ok_or_else(|| PlanGenerationError::missing("days"))?;

    let days = raw_days
        .iter()
        .enumerate()
        .map(|(index, day)| day_from_value(index, day, request))
        .collect::<Result<Vec<_>, _>>()?;

    let mut shopping_list: BTreeSet<String> = document
        .get("shopping_list")
        .map(text_list)
        .unwrap_or_default()
        .into_iter()
        .collect();
    if shopping_list.is_empty() {
        shopping_list = days
            .iter()
            .flat_map(|day| day.meals.iter())
            .flat_map(|meal| meal.ingredients.iter().cloned())
            .collect();
    }

    let mut plan = GeneratedPlan {
        name,
        description: document.get("description").and_then(text).unwrap_or_default(),
        requested_duration_days: request.duration_days(),
        start_date: request.start_date(),
        days,
        shopping_list,
        notes: document.get("notes").map(text_list).unwrap_or_default(),
        nutrition_summary: NutrientTotals::default(),
        provenance,
    };
    plan.refresh_nutrition_summary();
    Ok(plan)
}

fn day_from_value(
    index: usize,
    day: &Value,
    request: &PlanRequest,
) -> Result<DayPlan, PlanGenerationError> {
    let slots = day
        .get("meals")
        .and_then(Value::as_object)
        .ok_or_else(|| PlanGenerationError::missing(format!("days[{index}].meals")))?;

    let slot = |slot: &str| -> Result<MealSlot, PlanGenerationError> {
        slots
            .get(slot)
            .and_then(Value::as_object)
            .map(meal_from_object)
            .ok_or_else(|| PlanGenerationError::missing(format!("days[{index}].meals.{slot}")))
    };

    let meals = DayMeals {
        breakfast: slot("breakfast")?,
        lunch: slot("lunch")?,
        dinner: slot("dinner")?,
        snacks: slots.get("snacks").map(snacks_from_value).unwrap_or_default(),
    };

    let per_meal: Vec<NutrientTotals> = meals.iter().map(MealSlot::nutrients).collect();
    let derived = NutrientTotals::sum(&per_meal);
    let totals = match day.get("daily_totals").and_then(Value::as_object) {
        Some(reported) => totals_from_object(reported, derived),
        None => derived,
    };

    let day_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
    Ok(DayPlan {
        day_number,
        calendar_date: date_for_day(request.start_date(), day_number),
        meals,
        totals,
    })
}

fn snacks_from_value(value: &Value) -> Vec<MealSlot> {
    let snack = |item: &Value| match item {
        Value::Object(fields) => Some(meal_from_object(fields)),
        other => text(other)
            .filter(|name| !name.is_empty())
            .map(|name| MealSlot {
                name,
                ..MealSlot::default()
            }),
    };

    match value {
        Value::Array(items) => items.iter().filter_map(snack).collect(),
        other => snack(other).into_iter().collect(),
    }
}

fn meal_from_object(fields: &Map<String, Value>) -> MealSlot {
    let field = |keys: &[&str]| keys.iter().find_map(|key| fields.get(*key));
    let nutrient = |keys: &[&str]| field(keys).map(amount).unwrap_or(0.0);
    let minutes = |keys: &[&str]| field(keys).map(amount).map(to_minutes).unwrap_or(0);

    MealSlot {
        name: field(&["name"]).and_then(text).unwrap_or_default(),
        description: field(&["description"]).and_then(text).unwrap_or_default(),
        calories: nutrient(&["calories", "kcal"]),
        protein_grams: nutrient(&["protein", "protein_grams"]),
        carb_grams: nutrient(&["carbs", "carb_grams", "carbohydrates"]),
        fat_grams: nutrient(&["fat", "fat_grams"]),
        fiber_grams: nutrient(&["fiber", "fiber_grams"]),
        prep_minutes: minutes(&["prep_time", "prep_minutes"]),
        cook_minutes: minutes(&["cook_time", "cook_minutes"]),
        ingredients: field(&["ingredients"]).map(text_list).unwrap_or_default(),
        steps: field(&["instructions", "steps"]).map(text_list).unwrap_or_default(),
        tags: field(&["tags"])
            .map(text_list)
            .unwrap_or_default()
            .into_iter()
            .collect(),
    }
}

/// Reported totals win per field; absent fields fall back to the meal sum.
fn totals_from_object(reported: &Map<String, Value>, derived: NutrientTotals) -> NutrientTotals {
    let pick = |key: &str, fallback: f64| reported.get(key).map(amount).unwrap_or(fallback);
    NutrientTotals {
        calories: pick("calories", derived.calories),
        protein: pick("protein", derived.protein),
        carbs: pick("carbs", derived.carbs),
        fat: pick("fat", derived.fat),
        fiber: pick("fiber", derived.fiber),
    }
}

/// Non-negative quantity from a number or a string such as `"450 kcal"`.
fn amount(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => numeric_prefix(text),
        _ => None,
    };

    match raw {
        Some(quantity) if quantity.is_finite() && quantity > 0.0 => quantity,
        _ => 0.0,
    }
}

fn numeric_prefix(text: &str) -> Option<f64> {
    let text = text.trim();
    let mut end = 0;
    let mut seen_dot = false;
    for (idx, ch) in text.char_indices() {
        match ch {
            '0'..='9' => end = idx + 1,
            '-' | '+' if idx == 0 => {}
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
    }
    text[..end].parse().ok()
}

fn to_minutes(quantity: f64) -> u32 {
    quantity.round().min(f64::from(u32::MAX)) as u32
}

/// Flattens scalars and `{"amount", "item"}`-style objects into display text.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Object(fields) => {
            const ORDERED_KEYS: [&str; 7] =
                ["amount", "quantity", "unit", "item", "ingredient", "name", "step"];

            let mut parts: Vec<String> = ORDERED_KEYS
                .iter()
                .filter_map(|key| fields.get(*key))
                .filter_map(text)
                .filter(|part| !part.is_empty())
                .collect();
            if parts.is_empty() {
                parts = fields
                    .values()
                    .filter_map(|field| field.as_str())
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect();
            }

            (!parts.is_empty()).then(|| parts.join(" "))
        }
        Value::Null | Value::Array(_) => None,
    }
}

fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(text)
            .filter(|item| !item.is_empty())
            .collect(),
        other => text(other)
            .filter(|item| !item.is_empty())
            .into_iter()
            .collect(),
    }
}
