use colored::*;

use mealgen::plan::{GeneratedPlan, MealSlot, PlanGenerationError};

fn meal_line(label: &str, meal: &MealSlot) {
    println!(
        "  {:<10} {} {}",
        format!("{label}:").dimmed(),
        meal.name,
        format!("({:.0} kcal)", meal.calories).dimmed()
    );
}

pub(crate) fn print_plan(plan: &GeneratedPlan) {
    println!("\n🍽️  {}", plan.name.bold().green());
    if !plan.description.is_empty() {
        println!("   {}", plan.description);
    }
    println!(
        "   {} days from {} · {}",
        plan.days.len(),
        plan.start_date,
        plan.provenance
    );

    if plan.is_approximate() {
        println!(
            "{}",
            "⚠️  Recovered from an incomplete response; meals and nutrition values are approximate."
                .yellow()
        );
    }

    for day in &plan.days {
        println!(
            "\n{} {}",
            format!("Day {} ({})", day.day_number, day.calendar_date).bold(),
            format!("{:.0} kcal", day.totals.calories).cyan()
        );
        meal_line("Breakfast", &day.meals.breakfast);
        meal_line("Lunch", &day.meals.lunch);
        meal_line("Dinner", &day.meals.dinner);
        for snack in &day.meals.snacks {
            meal_line("Snack", snack);
        }
    }

    let summary = &plan.nutrition_summary;
    println!("\n{}", "Daily average".bold());
    println!(
        "  {:.0} kcal · protein {:.0} g · carbs {:.0} g · fat {:.0} g · fiber {:.0} g",
        summary.calories, summary.protein, summary.carbs, summary.fat, summary.fiber
    );

    if !plan.shopping_list.is_empty() {
        println!(
            "\n{} ({} items)",
            "Shopping list".bold(),
            plan.shopping_list.len()
        );
        for item in &plan.shopping_list {
            println!("  • {item}");
        }
    }

    if !plan.notes.is_empty() {
        println!("\n{}", "Notes".bold());
        for note in &plan.notes {
            println!("  • {note}");
        }
    }
}

/// Prints the follow-up hint; the error itself is reported by `main`.
pub(crate) fn print_failure(error: &PlanGenerationError) {
    eprintln!(
        "{} {}",
        "❌ Plan generation failed.".bold().red(),
        error.suggested_action().yellow()
    );
}
