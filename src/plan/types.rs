use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;

use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Immutable input for one generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    prompt_text: Option<String>,
    duration_days: NonZeroU32,
    start_date: NaiveDate,
    target_calories: Option<f64>,
    diet_style: Option<String>,
    restrictions: BTreeSet<String>,
}

impl PlanRequest {
    pub fn new(duration_days: NonZeroU32, start_date: NaiveDate) -> Self {
        Self {
            prompt_text: None,
            duration_days,
            start_date,
            target_calories: None,
            diet_style: None,
            restrictions: BTreeSet::new(),
        }
    }

    /// Uses `text` verbatim as the user prompt instead of rendering one.
    pub fn with_prompt_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.prompt_text = (!text.trim().is_empty()).then_some(text);
        self
    }

    /// Non-positive or non-finite targets are ignored.
    pub fn with_target_calories(mut self, calories: f64) -> Self {
        self.target_calories = (calories.is_finite() && calories > 0.0).then_some(calories);
        self
    }

    pub fn with_diet_style(mut self, style: impl Into<String>) -> Self {
        let style = style.into();
        let style = style.trim();
        self.diet_style = (!style.is_empty()).then(|| style.to_string());
        self
    }

    pub fn with_restriction(mut self, restriction: impl Into<String>) -> Self {
        let restriction = restriction.into();
        let restriction = restriction.trim();
        if !restriction.is_empty() {
            self.restrictions.insert(restriction.to_string());
        }
        self
    }

    pub fn with_restrictions<I, S>(self, restrictions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        restrictions
            .into_iter()
            .fold(self, |request, restriction| request.with_restriction(restriction))
    }

    pub fn prompt_text(&self) -> Option<&str> {
        self.prompt_text.as_deref()
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days.get()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn target_calories(&self) -> Option<f64> {
        self.target_calories
    }

    pub fn diet_style(&self) -> Option<&str> {
        self.diet_style.as_deref()
    }

    pub fn restrictions(&self) -> &BTreeSet<String> {
        &self.restrictions
    }
}

/// Calendar date of the 1-based `day_number` in a plan starting at `start`.
pub fn date_for_day(start: NaiveDate, day_number: u32) -> NaiveDate {
    start
        .checked_add_days(Days::new(u64::from(day_number.saturating_sub(1))))
        .unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MealSlot {
    pub name: String,
    pub description: String,
    pub calories: f64,
    #[serde(rename = "protein")]
    pub protein_grams: f64,
    #[serde(rename = "carbs")]
    pub carb_grams: f64,
    #[serde(rename = "fat")]
    pub fat_grams: f64,
    #[serde(rename = "fiber")]
    pub fiber_grams: f64,
    #[serde(rename = "prep_time")]
    pub prep_minutes: u32,
    #[serde(rename = "cook_time")]
    pub cook_minutes: u32,
    pub ingredients: Vec<String>,
    #[serde(rename = "instructions")]
    pub steps: Vec<String>,
    pub tags: BTreeSet<String>,
}

impl MealSlot {
    pub fn nutrients(&self) -> NutrientTotals {
        NutrientTotals {
            calories: self.calories,
            protein: self.protein_grams,
            carbs: self.carb_grams,
            fat: self.fat_grams,
            fiber: self.fiber_grams,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NutrientTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

impl NutrientTotals {
    pub fn sum<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a NutrientTotals>,
    {
        items
            .into_iter()
            .fold(Self::default(), |acc, item| Self {
                calories: acc.calories + item.calories,
                protein: acc.protein + item.protein,
                carbs: acc.carbs + item.carbs,
                fat: acc.fat + item.fat,
                fiber: acc.fiber + item.fiber,
            })
    }

    /// Per-item average; zero for an empty set.
    pub fn average<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a NutrientTotals>,
    {
        let items: Vec<&NutrientTotals> = items.into_iter().collect();
        if items.is_empty() {
            return Self::default();
        }

        let count = items.len() as f64;
        let total = Self::sum(items);
        Self {
            calories: total.calories / count,
            protein: total.protein / count,
            carbs: total.carbs / count,
            fat: total.fat / count,
            fiber: total.fiber / count,
        }
    }

    pub fn is_non_negative(&self) -> bool {
        [self.calories, self.protein, self.carbs, self.fat, self.fiber]
            .iter()
            .all(|value| *value >= 0.0)
    }
}

/// The mandatory and optional meals of one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayMeals {
    pub breakfast: MealSlot,
    pub lunch: MealSlot,
    pub dinner: MealSlot,
    pub snacks: Vec<MealSlot>,
}

impl DayMeals {
    pub fn iter(&self) -> impl Iterator<Item = &MealSlot> {
        [&self.breakfast, &self.lunch, &self.dinner]
            .into_iter()
            .chain(self.snacks.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    #[serde(rename = "day")]
    pub day_number: u32,
    #[serde(rename = "date")]
    pub calendar_date: NaiveDate,
    pub meals: DayMeals,
    #[serde(rename = "daily_totals")]
    pub totals: NutrientTotals,
}

/// Which pipeline stage produced the parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "strategy", rename_all = "snake_case")]
pub enum Provenance {
    Strict,
    Repaired(RepairStrategyId),
}

impl Provenance {
    /// True when the plan was synthesized from scattered fields.
    pub fn is_approximate(self) -> bool {
        matches!(self, Provenance::Repaired(RepairStrategyId::FieldScavenging))
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Strict => write!(f, "strict parse"),
            Provenance::Repaired(strategy) => write!(f, "repaired ({strategy})"),
        }
    }
}

/// Identifiers of the repair strategies, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStrategyId {
    TrailingCommas,
    QuoteNormalization,
    Truncation,
    FieldScavenging,
}

impl fmt::Display for RepairStrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RepairStrategyId::TrailingCommas => "trailing-commas",
            RepairStrategyId::QuoteNormalization => "quote-normalization",
            RepairStrategyId::Truncation => "truncation",
            RepairStrategyId::FieldScavenging => "field-scavenging",
        };
        write!(f, "{label}")
    }
}

/// A validated plan. `days.len() == duration_days` once returned by the assembler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPlan {
    pub name: String,
    pub description: String,
    #[serde(rename = "duration_days")]
    pub requested_duration_days: u32,
    pub start_date: NaiveDate,
    pub days: Vec<DayPlan>,
    pub shopping_list: BTreeSet<String>,
    pub notes: Vec<String>,
    pub nutrition_summary: NutrientTotals,
    pub provenance: Provenance,
}

impl GeneratedPlan {
    pub fn is_approximate(&self) -> bool {
        self.provenance.is_approximate()
    }

    /// Recomputes the per-day average over the current day list.
    pub(crate) fn refresh_nutrition_summary(&mut self) {
        self.nutrition_summary = NutrientTotals::average(self.days.iter().map(|day| &day.totals));
    }
}
