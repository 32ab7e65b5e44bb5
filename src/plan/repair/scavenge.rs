use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use crate::plan::types::RepairStrategyId;

use super::{RepairOutcome, RepairStrategy};

pub const DEFAULT_FALLBACK_CALORIES: f64 = 2000.0;

pub const RECOVERED_NOTE: &str =
    "Recovered from an incomplete model response; meals and nutrition values are approximate.";

const PLACEHOLDER_INGREDIENT: &str = "Ingredients unavailable; choose items that fit the meal";
const PLACEHOLDER_STEP: &str = "Prepare according to your usual recipe.";

/// Share of the daily calories assigned to each mandatory slot.
const SLOT_SHARES: [(&str, f64); 3] = [("breakfast", 0.25), ("lunch", 0.35), ("dinner", 0.40)];

static DAYS_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""days"\s*:"#).expect("valid days key regex"));
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""name"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("valid name regex")
});
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""description"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("valid description regex")
});
static CALORIES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#""(?:target_calories|calories_per_day|daily_calories|calorie_target)"\s*:\s*"?(\d+(?:\.\d+)?)"#,
    )
    .expect("valid calories regex")
});
static SLOT_NAME_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SLOT_SHARES
        .iter()
        .map(|(slot, _)| {
            Regex::new(&format!(
                r#""{slot}"\s*:\s*\{{[^{{}}]*?"name"\s*:\s*"((?:[^"\\]|\\.)*)""#
            ))
            .expect("valid meal slot regex")
        })
        .collect()
});

/// Scalar fields found anywhere in a broken document.
#[derive(Debug, Default, PartialEq)]
struct ScavengedFields {
    name: Option<String>,
    description: Option<String>,
    target_calories: Option<f64>,
    slot_names: [Option<String>; 3],
}

impl ScavengedFields {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.target_calories.is_none()
            && self.slot_names.iter().all(Option::is_none)
    }
}

fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string())
}

/// First capture of `re` that starts before `limit`, non-empty after trimming.
fn capture_before(re: &Regex, text: &str, limit: usize) -> Option<String> {
    re.captures_iter(text)
        .filter(|caps| caps.get(0).is_some_and(|m| m.start() < limit))
        .filter_map(|caps| caps.get(1).map(|m| unescape(m.as_str())))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn scavenge_fields(text: &str) -> ScavengedFields {
    // Plan-level fields precede the day list; later "name"s belong to meals.
    let plan_limit = DAYS_KEY_RE
        .find(text)
        .map(|m| m.start())
        .unwrap_or(text.len());

    let target_calories = CALORIES_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|calories| *calories > 0.0);

    let mut slot_names: [Option<String>; 3] = Default::default();
    for (slot, re) in slot_names.iter_mut().zip(SLOT_NAME_RES.iter()) {
        *slot = capture_before(re, text, text.len());
    }

    ScavengedFields {
        name: capture_before(&NAME_RE, text, plan_limit),
        description: capture_before(&DESCRIPTION_RE, text, plan_limit),
        target_calories,
        slot_names,
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn placeholder_meal(name: &str, calories: f64) -> Value {
    json!({
        "name": name,
        "description": "Approximate meal recovered from a partial plan.",
        "calories": round_tenth(calories),
        "protein": round_tenth(calories * 0.25 / 4.0),
        "carbs": round_tenth(calories * 0.50 / 4.0),
        "fat": round_tenth(calories * 0.25 / 9.0),
        "fiber": 6.0,
        "prep_time": 10,
        "cook_time": 15,
        "ingredients": [PLACEHOLDER_INGREDIENT],
        "instructions": [PLACEHOLDER_STEP],
        "tags": ["approximate"]
    })
}

/// Last-resort strategy: rebuilds a one-day plan from whatever fields survive.
pub struct FieldScavenging {
    fallback_calories: f64,
}

impl FieldScavenging {
    pub fn new(fallback_calories: f64) -> Self {
        Self { fallback_calories }
    }

    fn synthesize(&self, fields: ScavengedFields) -> Value {
        let daily_calories = fields.target_calories.unwrap_or(self.fallback_calories);

        let mut meals = serde_json::Map::new();
        for ((slot, share), found) in SLOT_SHARES.iter().zip(fields.slot_names) {
            let default_name = format!("Simple {slot}");
            let name = found.unwrap_or(default_name);
            meals.insert(
                (*slot).to_string(),
                placeholder_meal(&name, daily_calories * share),
            );
        }
        meals.insert("snacks".to_string(), json!([]));

        json!({
            "name": fields.name.unwrap_or_else(|| "Recovered meal plan".to_string()),
            "description": fields.description.unwrap_or_else(|| {
                "Approximate plan recovered from an incomplete model response.".to_string()
            }),
            "target_calories": round_tenth(daily_calories),
            "days": [{ "day": 1, "meals": Value::Object(meals) }],
            "notes": [RECOVERED_NOTE]
        })
    }
}

impl Default for FieldScavenging {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_CALORIES)
    }
}

impl RepairStrategy for FieldScavenging {
    fn id(&self) -> RepairStrategyId {
        RepairStrategyId::FieldScavenging
    }

    fn attempt(&self, span: &str) -> RepairOutcome {
        let fields = scavenge_fields(span);
        if fields.is_empty() {
            return RepairOutcome::Inapplicable;
        }

        tracing::warn!(?fields, "falling back to field scavenging; plan will be approximate");
        let value = self.synthesize(fields);
        match serde_json::to_string(&value) {
            Ok(text) => RepairOutcome::Repaired { text, value },
            Err(_) => RepairOutcome::Inapplicable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_name_comes_from_before_the_day_list() {
        let text = r#"{"days": [{"meals": {"breakfast": {"name": "Oat bowl"}}}], "name": "Late"}"#;
        let fields = scavenge_fields(text);
        assert_eq!(fields.name, None);
        assert_eq!(fields.slot_names[0].as_deref(), Some("Oat bowl"));

        let text = r#"{"name": "Harvest \"Week\"", "days": [{"meals": {"lunch": {"calories": 5, "name": "Soup"#;
        let fields = scavenge_fields(text);
        assert_eq!(fields.name.as_deref(), Some("Harvest \"Week\""));
        assert_eq!(fields.slot_names[1], None);
    }

    #[test]
    fn reads_calorie_target_variants() {
        let fields = scavenge_fields(r#"{"calories_per_day": "1850", "days": ["#);
        assert_eq!(fields.target_calories, Some(1850.0));
        assert!(scavenge_fields("nothing useful here").is_empty());
    }

    #[test]
    fn synthesized_meals_split_the_target() {
        let value = FieldScavenging::default().synthesize(ScavengedFields {
            target_calories: Some(1600.0),
            ..ScavengedFields::default()
        });
        let meals = &value["days"][0]["meals"];
        assert_eq!(meals["breakfast"]["calories"], 400.0);
        assert_eq!(meals["lunch"]["calories"], 560.0);
        assert_eq!(meals["dinner"]["calories"], 640.0);
        assert_eq!(meals["dinner"]["name"], "Simple dinner");
        assert_eq!(value["notes"][0], RECOVERED_NOTE);
    }
}
