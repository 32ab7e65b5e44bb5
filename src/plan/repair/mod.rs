//! Ordered fallback strategies for documents that fail the strict parse.
//!
//! Every strategy sees the original span, never another strategy's output.
//! The first one that yields a parseable value wins.

mod scavenge;
mod strategies;

use serde_json::Value;

use super::error::PlanGenerationError;
use super::types::RepairStrategyId;

pub use scavenge::FieldScavenging;
pub use strategies::{QuoteNormalization, TrailingCommaRemoval, TruncationRepair};

/// Result of applying one strategy to a span.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    Repaired { text: String, value: Value },
    Inapplicable,
}

impl RepairOutcome {
    /// Parses `text`, treating a parse failure as inapplicable.
    pub(crate) fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => Self::Repaired { text, value },
            Err(_) => Self::Inapplicable,
        }
    }
}

pub trait RepairStrategy: Send + Sync {
    fn id(&self) -> RepairStrategyId;

    fn attempt(&self, span: &str) -> RepairOutcome;
}

/// Record of one strategy run, kept only for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairAttempt {
    pub strategy: RepairStrategyId,
    pub succeeded: bool,
    pub produced: Option<Value>,
}

/// The winning strategy and what it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairSuccess {
    pub strategy: RepairStrategyId,
    pub text: String,
    pub value: Value,
}

pub struct RepairChain {
    strategies: Vec<Box<dyn RepairStrategy>>,
}

impl RepairChain {
    pub fn new(strategies: Vec<Box<dyn RepairStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn builder() -> RepairChainBuilder {
        RepairChainBuilder::new()
    }

    pub fn strategy_ids(&self) -> Vec<RepairStrategyId> {
        self.strategies.iter().map(|strategy| strategy.id()).collect()
    }

    pub fn run(&self, span: &str) -> Result<RepairSuccess, PlanGenerationError> {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let id = strategy.id();
            match strategy.attempt(span) {
                RepairOutcome::Repaired { text, value } => {
                    attempts.push(RepairAttempt {
                        strategy: id,
                        succeeded: true,
                        produced: Some(value.clone()),
                    });
                    tracing::debug!(?attempts, "repair chain trace");
                    tracing::info!(strategy = %id, "repaired malformed plan document");
                    return Ok(RepairSuccess {
                        strategy: id,
                        text,
                        value,
                    });
                }
                RepairOutcome::Inapplicable => {
                    tracing::debug!(strategy = %id, "repair strategy inapplicable");
                    attempts.push(RepairAttempt {
                        strategy: id,
                        succeeded: false,
                        produced: None,
                    });
                }
            }
        }

        tracing::warn!(?attempts, "every repair strategy failed on the plan document");
        Err(PlanGenerationError::UnrecoverableMalformedResponse)
    }
}

impl Default for RepairChain {
    fn default() -> Self {
        RepairChainBuilder::new().with_default_strategies().build()
    }
}

pub struct RepairChainBuilder {
    strategies: Vec<Box<dyn RepairStrategy>>,
}

impl RepairChainBuilder {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn add_strategy<S>(mut self, strategy: S) -> Self
    where
        S: RepairStrategy + 'static,
    {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn with_default_strategies(self) -> Self {
        self.add_strategy(TrailingCommaRemoval)
            .add_strategy(QuoteNormalization)
            .add_strategy(TruncationRepair::default())
            .add_strategy(FieldScavenging::default())
    }

    pub fn build(self) -> RepairChain {
        RepairChain::new(self.strategies)
    }
}

impl Default for RepairChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
