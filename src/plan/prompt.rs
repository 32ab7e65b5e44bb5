use std::fmt::Write as _;

use super::types::{PlanRequest, date_for_day};

pub const PLANNER_SYSTEM_PROMPT: &str = r#"You are a STRICT JSON meal planner. You turn a dietary brief into a multi-day meal plan document.

OBJECTIVE
- Produce realistic, varied meals that fit the calorie target and every dietary restriction.
- Every day MUST contain breakfast, lunch and dinner. Snacks are optional.

OUTPUT FORMAT (STRICT JSON ONLY)
- Return exactly one JSON object.
- No prose, no markdown, no code fences, no comments, no trailing text.
- Numbers MUST be numbers (not strings). Calories in kcal, macros in grams, times in minutes.
- No trailing commas. Double quotes only.
- Keep descriptions to one sentence and instructions to at most four short steps so the whole document fits in your output budget.

NEGATIVE EXAMPLES (DO NOT DO)
- ```json { "name": ... } ```                // code fences not allowed
- { "name": ... } Hope this helps!          // extra text not allowed
- { "calories": "450 kcal" }                // numbers as strings
- { name: 'Oatmeal' }                       // unquoted keys or single quotes
"#;

/// Days requested from the model in one call.
pub fn batch_days(requested_days: u32, max_batch_days: u32) -> u32 {
    requested_days.min(max_batch_days.max(1))
}

fn meal_skeleton(indent: &str, slot: &str) -> String {
    format!(
        r#"{indent}"{slot}": {{
{indent}  "name": "<meal name>",
{indent}  "description": "<one sentence>",
{indent}  "calories": 0,
{indent}  "protein": 0,
{indent}  "carbs": 0,
{indent}  "fat": 0,
{indent}  "fiber": 0,
{indent}  "prep_time": 0,
{indent}  "cook_time": 0,
{indent}  "ingredients": ["<quantity and ingredient>"],
{indent}  "instructions": ["<step>"],
{indent}  "tags": ["<tag>"]
{indent}}}"#
    )
}

/// Example document with the exact expected shape for `days` days.
pub fn render_skeleton(request: &PlanRequest, days: u32) -> String {
    let day_entries: Vec<String> = (1..=days.max(1))
        .map(|day| {
            let date = date_for_day(request.start_date(), day);
            let meals = ["breakfast", "lunch", "dinner"]
                .iter()
                .map(|slot| meal_skeleton("        ", slot))
                .collect::<Vec<_>>()
                .join(",\n");
            format!(
                r#"    {{
      "day": {day},
      "date": "{date}",
      "meals": {{
{meals},
        "snacks": []
      }},
      "daily_totals": {{ "calories": 0, "protein": 0, "carbs": 0, "fat": 0, "fiber": 0 }}
    }}"#
            )
        })
        .collect();

    let target = request
        .target_calories()
        .map(|calories| format!("{calories:.0}"))
        .unwrap_or_else(|| "0".to_string());

    format!(
        r#"{{
  "name": "<plan name>",
  "description": "<one sentence>",
  "target_calories": {target},
  "days": [
{}
  ],
  "shopping_list": ["<ingredient>"],
  "notes": ["<note>"]
}}"#,
        day_entries.join(",\n")
    )
}

/// User prompt for one model call covering `days` days.
///
/// A pre-filled prompt on the request is used verbatim.
pub fn render_prompt(request: &PlanRequest, days: u32) -> String {
    if let Some(text) = request.prompt_text() {
        return text.to_string();
    }

    let mut prompt = String::new();
    let plural = if days == 1 { "" } else { "s" };
    let _ = writeln!(
        prompt,
        "Create a {days}-day meal plan starting on {}.",
        request.start_date()
    );

    match request.target_calories() {
        Some(calories) => {
            let _ = writeln!(
                prompt,
                "Daily calorie target: {calories:.0} kcal (each day's totals should land within 5% of it)."
            );
        }
        None => {
            let _ = writeln!(prompt, "Daily calorie target: a balanced intake for an adult.");
        }
    }

    if let Some(style) = request.diet_style() {
        let _ = writeln!(prompt, "Diet style: {style}.");
    }

    if !request.restrictions().is_empty() {
        let restrictions = request
            .restrictions()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            prompt,
            "Dietary restrictions (never violate): {restrictions}."
        );
    }

    let _ = writeln!(
        prompt,
        "\nReturn structured data only, no surrounding prose. Use exactly this shape with {days} day{plural} in \"days\":\n{}",
        render_skeleton(request, days)
    );

    prompt
}
