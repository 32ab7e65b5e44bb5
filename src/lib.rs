//! Meal plan generation from a generative text model, with recovery of
//! truncated or malformed responses into a complete typed plan.

pub mod client;
pub mod config;
pub mod plan;
pub mod tokens;
