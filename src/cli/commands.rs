use std::fs;

use anyhow::{Context, Result};
use colored::*;

use mealgen::client::AIClient;
use mealgen::config::Config;
use mealgen::plan::{
    GeneratedPlan, PLANNER_SYSTEM_PROMPT, PlanGenerationError, PlanGenerator, assemble_plan,
    batch_days, render_prompt,
};

use super::args::{Cli, Command, GenerateArgs, PlanArgs};
use super::config_cmd;
use super::render;

pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate(args) => handle_generate(args).await,
        Command::Prompt(args) => handle_prompt(&args),
        Command::Config(args) => config_cmd::handle_config(&args),
    }
}

async fn handle_generate(args: GenerateArgs) -> Result<()> {
    let request = args.plan.to_request();

    let result: Result<GeneratedPlan, PlanGenerationError> = match args.from_file {
        Some(ref path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read model response from {}", path.display()))?;
            assemble_plan(&raw, &request)
        }
        None => {
            let mut config = Config::load()?;
            if let Some(model) = args.model {
                config.models.model = model;
            }
            if let Some(max_tokens) = args.max_tokens {
                config.models.max_tokens = max_tokens;
            }

            let client = AIClient::shared(&config.llm)?;
            PlanGenerator::new(client, &config).generate(&request).await
        }
    };

    match result {
        Ok(plan) if args.json => {
            let document =
                serde_json::to_string_pretty(&plan).context("Failed to serialize meal plan")?;
            println!("{document}");
            Ok(())
        }
        Ok(plan) => {
            render::print_plan(&plan);
            Ok(())
        }
        Err(error) => {
            render::print_failure(&error);
            Err(error.into())
        }
    }
}

fn handle_prompt(args: &PlanArgs) -> Result<()> {
    let config = Config::load_unvalidated()?;
    let request = args.to_request();
    let days = batch_days(request.duration_days(), config.generation.max_batch_days);

    println!("{}", "System prompt".bold().cyan());
    println!("{PLANNER_SYSTEM_PROMPT}");
    println!(
        "{}",
        format!(
            "User prompt ({days} of {} days per call)",
            request.duration_days()
        )
        .bold()
        .cyan()
    );
    println!("{}", render_prompt(&request, days));
    Ok(())
}
