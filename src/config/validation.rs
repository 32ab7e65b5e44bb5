use anyhow::{Result, anyhow};

use super::types::Config;

pub fn validate(config: &Config) -> Result<()> {
    if config.llm.api_key.trim().is_empty() {
        let provider = config.llm.provider;
        return Err(anyhow!(
            "{} API key not found. Set {} or add it to {}",
            provider.display_name(),
            provider.api_key_env_var(),
            Config::config_path()?.display()
        ));
    }

    if config.generation.max_batch_days == 0 {
        return Err(anyhow!("generation.max_batch_days must be at least 1"));
    }

    if !(0.0..=2.0).contains(&config.models.temperature) {
        return Err(anyhow!(
            "models.temperature must be between 0 and 2 (got {})",
            config.models.temperature
        ));
    }

    Ok(())
}
