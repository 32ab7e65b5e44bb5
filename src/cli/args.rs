use std::num::NonZeroU32;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use mealgen::plan::PlanRequest;

use super::commands;

/// Entry point for the `mealgen` command-line interface.
#[derive(Debug, Parser)]
#[command(
    name = "mealgen",
    about = "Multi-day meal plans from a generative model",
    version,
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging of the model call and the recovery pipeline
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a meal plan (or replay a saved model response).
    Generate(GenerateArgs),
    /// Print the system and user prompt that would be sent to the model.
    Prompt(PlanArgs),
    /// Show or change the stored configuration.
    Config(ConfigArgs),
}

/// What the plan should look like.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Number of days to plan
    #[arg(short = 'd', long, default_value = "7")]
    pub days: NonZeroU32,

    /// Date of day 1 (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Daily calorie target in kcal
    #[arg(long)]
    pub calories: Option<f64>,

    /// Diet style, e.g. mediterranean or vegan
    #[arg(long)]
    pub diet: Option<String>,

    /// Dietary restriction; repeat for several
    #[arg(long = "restrict")]
    pub restrictions: Vec<String>,

    /// Send this prompt verbatim instead of rendering one
    #[arg(long)]
    pub prompt: Option<String>,
}

impl PlanArgs {
    pub fn to_request(&self) -> PlanRequest {
        let start = self.start.unwrap_or_else(|| Local::now().date_naive());
        let mut request =
            PlanRequest::new(self.days, start).with_restrictions(self.restrictions.iter().cloned());

        if let Some(calories) = self.calories {
            request = request.with_target_calories(calories);
        }
        if let Some(ref diet) = self.diet {
            request = request.with_diet_style(diet.clone());
        }
        if let Some(ref prompt) = self.prompt {
            request = request.with_prompt_text(prompt.clone());
        }
        request
    }
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Override the configured model
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Override the context token budget
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Assemble a plan from a saved model response instead of calling the model
    #[arg(long)]
    pub from_file: Option<PathBuf>,

    /// Print the plan document as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// LLM provider (openrouter or cerebras)
    #[arg(long)]
    pub provider: Option<String>,

    /// Set the API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Set timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Set the context token budget
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Set the model
    #[arg(long)]
    pub model: Option<String>,

    /// Set the sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Set the largest number of days requested in one call
    #[arg(long)]
    pub max_batch_days: Option<u32>,
}

impl ConfigArgs {
    pub fn has_changes(&self) -> bool {
        self.provider.is_some()
            || self.api_key.is_some()
            || self.timeout.is_some()
            || self.max_tokens.is_some()
            || self.model.is_some()
            || self.temperature.is_some()
            || self.max_batch_days.is_some()
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        commands::run(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_arguments_build_a_request() {
        let cli = Cli::try_parse_from([
            "mealgen",
            "generate",
            "--days",
            "5",
            "--start",
            "2026-06-01",
            "--calories",
            "2100",
            "--diet",
            "vegetarian",
            "--restrict",
            "nut-free",
            "--restrict",
            "gluten-free",
            "--json",
        ])
        .unwrap();

        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert!(args.json);

        let request = args.plan.to_request();
        assert_eq!(request.duration_days(), 5);
        assert_eq!(
            request.start_date(),
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
        );
        assert_eq!(request.target_calories(), Some(2100.0));
        assert_eq!(request.diet_style(), Some("vegetarian"));
        assert_eq!(request.restrictions().len(), 2);
    }

    #[test]
    fn zero_days_is_rejected() {
        assert!(Cli::try_parse_from(["mealgen", "prompt", "--days", "0"]).is_err());
    }

    #[test]
    fn config_without_flags_has_no_changes() {
        let cli = Cli::try_parse_from(["mealgen", "config"]).unwrap();
        let Command::Config(args) = cli.command else {
            panic!("expected config");
        };
        assert!(!args.has_changes());
    }
}
