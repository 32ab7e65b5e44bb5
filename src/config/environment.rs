use anyhow::{Context, Result, anyhow};
use std::env;

use super::builder::ConfigBuilder;
use super::types::LlmProvider;

pub fn apply_env_overrides(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    if let Some(provider_raw) = env_string("MEALGEN_PROVIDER")? {
        let provider = provider_raw
            .parse::<LlmProvider>()
            .with_context(|| format!("Failed to parse MEALGEN_PROVIDER value '{provider_raw}'"))?;
        builder = builder.with_provider(provider);
    }

    if let Some(base_url) = env_string("MEALGEN_LLM_BASE_URL")? {
        builder = builder.with_llm(|llm| llm.base_url = base_url);
    }

    if let Some(api_key) = env_string("OPENROUTER_API_KEY")? {
        builder = builder.with_llm(|llm| {
            if llm.provider == LlmProvider::OpenRouter {
                llm.api_key = api_key;
            }
        });
    }

    if let Some(api_key) = env_string("CEREBRAS_API_KEY")? {
        builder = builder.with_llm(|llm| {
            if llm.provider == LlmProvider::Cerebras {
                llm.api_key = api_key;
            }
        });
    }

    if let Some(timeout) = env_u64("MEALGEN_TIMEOUT_SECS")? {
        builder = builder.with_llm(|llm| llm.timeout_secs = timeout);
    }

    if let Some(max_tokens) = env_u32("MEALGEN_MAX_TOKENS")? {
        builder = builder.with_models(|models| models.max_tokens = max_tokens);
    }

    if let Some(model) = env_string("MEALGEN_MODEL")? {
        builder = builder.with_models(|models| models.model = model);
    }

    if let Some(temperature) = env_f32("MEALGEN_TEMPERATURE")? {
        builder = builder.with_models(|models| models.temperature = temperature);
    }

    if let Some(max_batch_days) = env_u32("MEALGEN_MAX_BATCH_DAYS")? {
        builder = builder.with_max_batch_days(max_batch_days);
    }

    Ok(builder)
}

pub fn env_string(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(anyhow!("{key} contains invalid UTF-8")),
    }
}

pub fn env_u64(key: &str) -> Result<Option<u64>> {
    env_string(key)?
        .map(|value| {
            value
                .parse::<u64>()
                .with_context(|| format!("Failed to parse {key} as u64"))
        })
        .transpose()
}

pub fn env_u32(key: &str) -> Result<Option<u32>> {
    env_string(key)?
        .map(|value| {
            value
                .parse::<u32>()
                .with_context(|| format!("Failed to parse {key} as u32"))
        })
        .transpose()
}

pub fn env_f32(key: &str) -> Result<Option<f32>> {
    env_string(key)?
        .map(|value| {
            value
                .parse::<f32>()
                .with_context(|| format!("Failed to parse {key} as a number"))
        })
        .transpose()
}
