use anyhow::anyhow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_CEREBRAS_BASE_URL, DEFAULT_OPENROUTER_BASE_URL};

/// Effective settings for one `mealgen` run: defaults, then
/// `~/.mealgen/config`, then `MEALGEN_*` environment overrides.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmSettings,
    pub models: ModelSettings,
    pub generation: GenerationSettings,
}

/// Where plan requests are sent.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: String,
    pub timeout_secs: u64,
    /// OpenAI-compatible root; `/chat/completions` is appended.
    pub base_url: String,
    pub user_agent: String,
}

impl LlmSettings {
    /// Moves to `provider`, pointing `base_url` at its endpoint.
    ///
    /// A custom base URL is only kept when the provider does not change.
    pub fn switch_provider(&mut self, provider: LlmProvider) -> bool {
        if self.provider == provider {
            return false;
        }
        self.provider = provider;
        self.base_url = provider.default_base_url().to_string();
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenRouter,
    Cerebras,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::OpenRouter => write!(f, "openrouter"),
            LlmProvider::Cerebras => write!(f, "cerebras"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LlmProvider::ALL
            .into_iter()
            .find(|provider| provider.to_string().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known = LlmProvider::ALL.map(|provider| provider.to_string()).join(", ");
                anyhow!("Unknown LLM provider '{wanted}' (expected one of: {known})")
            })
    }
}

impl LlmProvider {
    pub const ALL: [LlmProvider; 2] = [LlmProvider::OpenRouter, LlmProvider::Cerebras];

    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => DEFAULT_OPENROUTER_BASE_URL,
            LlmProvider::Cerebras => DEFAULT_CEREBRAS_BASE_URL,
        }
    }

    pub fn api_key_env_var(self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
            LlmProvider::Cerebras => "CEREBRAS_API_KEY",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => "OpenRouter",
            LlmProvider::Cerebras => "Cerebras",
        }
    }
}

/// Model and sampling for the planner call.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    /// Context window budget shared by the prompt and the completion.
    pub max_tokens: u32,
    /// Kept in `0.0..=2.0`; low values keep the document shape stable.
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Largest number of days requested from the model in one call.
    pub max_batch_days: u32,
}

// On-disk shape: every field optional, unknown sections ignored.
#[derive(Debug, Default, Deserialize)]
pub(super) struct FileConfig {
    #[serde(default)]
    pub llm: Option<FileLlmSettings>,
    #[serde(default)]
    pub models: Option<FileModelSettings>,
    #[serde(default)]
    pub generation: Option<FileGenerationSettings>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FileLlmSettings {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FileModelSettings {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FileGenerationSettings {
    pub max_batch_days: Option<u32>,
}

// Borrowed view written by `Config::save`.
#[derive(Serialize)]
pub(super) struct PersistedConfig<'a> {
    pub llm: PersistedLlm<'a>,
    pub models: PersistedModels<'a>,
    pub generation: PersistedGeneration,
}

#[derive(Serialize)]
pub(super) struct PersistedLlm<'a> {
    pub provider: LlmProvider,
    pub api_key: &'a str,
    pub timeout_secs: u64,
    pub base_url: &'a str,
    pub user_agent: &'a str,
}

#[derive(Serialize)]
pub(super) struct PersistedModels<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Serialize)]
pub(super) struct PersistedGeneration {
    pub max_batch_days: u32,
}

impl<'a> From<&'a Config> for PersistedConfig<'a> {
    fn from(config: &'a Config) -> Self {
        PersistedConfig {
            llm: PersistedLlm {
                provider: config.llm.provider,
                api_key: &config.llm.api_key,
                timeout_secs: config.llm.timeout_secs,
                base_url: &config.llm.base_url,
                user_agent: &config.llm.user_agent,
            },
            models: PersistedModels {
                model: &config.models.model,
                max_tokens: config.models.max_tokens,
                temperature: config.models.temperature,
            },
            generation: PersistedGeneration {
                max_batch_days: config.generation.max_batch_days,
            },
        }
    }
}
