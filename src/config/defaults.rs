use super::constants::*;
use super::types::{GenerationSettings, LlmProvider, LlmSettings, ModelSettings};

pub fn default_user_agent() -> String {
    format!("mealgen/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for LlmSettings {
    fn default() -> Self {
        let provider = LlmProvider::OpenRouter;
        Self {
            provider,
            api_key: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: provider.default_base_url().to_string(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_batch_days: DEFAULT_MAX_BATCH_DAYS,
        }
    }
}
