use anyhow::Result;

use super::types::{Config, GenerationSettings, LlmProvider, LlmSettings, ModelSettings};

/// Accumulates the configuration layers before they become a [`Config`].
///
/// Each layer edits the section it knows about through a `with_*` closure;
/// validation happens in `Config::load`, not here, so a half-configured
/// builder (no API key yet) still builds.
#[derive(Debug)]
pub struct ConfigBuilder {
    pub(super) llm: LlmSettings,
    pub(super) models: ModelSettings,
    pub(super) generation: GenerationSettings,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            llm: LlmSettings::default(),
            models: ModelSettings::default(),
            generation: GenerationSettings::default(),
        }
    }

    pub fn with_llm<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut LlmSettings),
    {
        update(&mut self.llm);
        self
    }

    pub fn with_models<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut ModelSettings),
    {
        update(&mut self.models);
        self
    }

    pub fn with_generation<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut GenerationSettings),
    {
        update(&mut self.generation);
        self
    }

    pub fn with_provider(self, provider: LlmProvider) -> Self {
        self.with_llm(|llm| {
            llm.switch_provider(provider);
        })
    }

    /// Caps how many days one model call may ask for.
    pub fn with_max_batch_days(self, days: u32) -> Self {
        self.with_generation(|generation| generation.max_batch_days = days)
    }

    pub fn build(self) -> Result<Config> {
        Ok(Config {
            llm: self.llm,
            models: self.models,
            generation: self.generation,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
