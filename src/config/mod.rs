//! Configuration for the mealgen CLI and plan generator.
//!
//! Settings are layered in this order:
//! - Built-in defaults
//! - JSON file at `~/.mealgen/config`
//! - Environment variable overrides
//!
//! Validation (API key, sane batch size) runs only when a model call needs it.

mod builder;
mod constants;
mod defaults;
mod environment;
mod loader;
mod types;
mod validation;

pub use builder::ConfigBuilder;
pub use constants::{
    DEFAULT_CEREBRAS_BASE_URL, DEFAULT_MAX_BATCH_DAYS, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_OPENROUTER_BASE_URL,
};
pub use types::{Config, GenerationSettings, LlmProvider, LlmSettings, ModelSettings};

#[cfg(test)]
mod tests;
