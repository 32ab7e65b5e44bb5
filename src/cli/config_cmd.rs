use anyhow::{Context, Result, bail};

use mealgen::config::{Config, LlmProvider};

use super::args::ConfigArgs;
use super::util::mask_api_key;

pub(crate) fn handle_config(args: &ConfigArgs) -> Result<()> {
    let mut config = Config::load_unvalidated()?;

    if !args.has_changes() {
        print_config(&config)?;
        return Ok(());
    }

    apply_changes(args, &mut config)?;
    config.save()?;

    println!(
        "✅ Configuration saved to {}",
        Config::config_path()?.display()
    );
    print_config(&config)
}

fn apply_changes(args: &ConfigArgs, config: &mut Config) -> Result<()> {
    if let Some(ref provider) = args.provider {
        let provider: LlmProvider = provider.parse().context("Invalid --provider")?;
        config.llm.switch_provider(provider);
    }

    if let Some(ref api_key) = args.api_key {
        config.llm.api_key = api_key.trim().to_string();
    }

    if let Some(timeout) = args.timeout {
        config.llm.timeout_secs = timeout;
    }

    if let Some(max_tokens) = args.max_tokens {
        config.models.max_tokens = max_tokens;
    }

    if let Some(ref model) = args.model {
        config.models.model = model.clone();
    }

    if let Some(temperature) = args.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            bail!("Temperature must be between 0 and 2 (got {temperature})");
        }
        config.models.temperature = temperature;
    }

    if let Some(max_batch_days) = args.max_batch_days {
        if max_batch_days == 0 {
            bail!("Batch size must be at least 1 day");
        }
        config.generation.max_batch_days = max_batch_days;
    }

    Ok(())
}

fn print_config(config: &Config) -> Result<()> {
    println!("📋 Current configuration:");
    println!(
        "   Provider: {} ({})",
        config.llm.provider,
        config.llm.provider.display_name()
    );
    println!("   API Key: {}", mask_api_key(&config.llm.api_key));
    println!("   Base URL: {}", config.llm.base_url);
    println!("   Timeout: {}s", config.llm.timeout_secs);
    println!("   Model: {}", config.models.model);
    println!("   Max Tokens: {}", config.models.max_tokens);
    println!("   Temperature: {}", config.models.temperature);
    println!("   Days per call: {}", config.generation.max_batch_days);
    println!("   Config file: {}", Config::config_path()?.display());
    Ok(())
}
