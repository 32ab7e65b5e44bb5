//! Meal plan generation and recovery of malformed model output.
//!
//! Stages run strictly in order: prompt, model call, extraction, strict
//! parse, repair chain (only on parse failure), structural validation and
//! cyclic extension to the requested length.

mod error;
mod extend;
mod parsing;
mod prompt;
pub mod repair;
pub(crate) mod scan;
mod transport;
mod types;
pub(crate) mod validate;

use std::sync::Arc;

use crate::client::DynLlmClient;
use crate::config::{Config, GenerationSettings, ModelSettings};
use crate::tokens::estimate_plan_output_tokens;

pub use error::PlanGenerationError;
pub use extend::{VARIATION_LABELS, extend_plan};
pub use parsing::{ParseFailure, extract_candidate, strict_parse};
pub use prompt::{PLANNER_SYSTEM_PROMPT, batch_days, render_prompt, render_skeleton};
pub use repair::{RepairChain, RepairChainBuilder, RepairOutcome, RepairStrategy};
pub use types::{
    DayMeals, DayPlan, GeneratedPlan, MealSlot, NutrientTotals, PlanRequest, Provenance,
    RepairStrategyId, date_for_day,
};
pub use validate::validate_plan;

use repair::RepairSuccess;

/// Turns raw model text into a plan of the requested length.
///
/// Holds no state besides its repair chain, so one assembler can serve any
/// number of requests.
#[derive(Default)]
pub struct PlanAssembler {
    chain: RepairChain,
}

impl PlanAssembler {
    pub fn new(chain: RepairChain) -> Self {
        Self { chain }
    }

    pub fn assemble(
        &self,
        raw: &str,
        request: &PlanRequest,
    ) -> Result<GeneratedPlan, PlanGenerationError> {
        let span =
            extract_candidate(raw).ok_or(PlanGenerationError::EmptyOrNonStructuredResponse)?;

        let (value, provenance) = match strict_parse(&span) {
            Ok(value) => (value, Provenance::Strict),
            Err(failure) => {
                tracing::debug!(
                    offset = failure.offset,
                    line = failure.line,
                    column = failure.column,
                    error = %failure.message,
                    "strict parse failed; running repair chain"
                );
                let RepairSuccess {
                    strategy, value, ..
                } = self.chain.run(&span)?;
                (value, Provenance::Repaired(strategy))
            }
        };

        let plan = validate_plan(&value, request, provenance)?;
        if plan.is_approximate() {
            tracing::warn!(name = %plan.name, "plan was scavenged from a broken response and is approximate");
        }

        let requested = request.duration_days();
        let mut plan = extend_plan(plan, requested);
        if plan.days.len() > requested as usize {
            tracing::debug!(
                generated = plan.days.len(),
                requested,
                "dropping surplus days"
            );
            plan.days.truncate(requested as usize);
            plan.refresh_nutrition_summary();
        }

        Ok(plan)
    }
}

/// Runs the pipeline on already obtained model text with the default chain.
pub fn assemble_plan(raw: &str, request: &PlanRequest) -> Result<GeneratedPlan, PlanGenerationError> {
    PlanAssembler::default().assemble(raw, request)
}

/// Requests a plan from the model and assembles the answer.
pub struct PlanGenerator {
    client: Arc<DynLlmClient>,
    models: ModelSettings,
    generation: GenerationSettings,
    assembler: PlanAssembler,
}

impl PlanGenerator {
    pub fn new(client: Arc<DynLlmClient>, config: &Config) -> Self {
        Self {
            client,
            models: config.models.clone(),
            generation: config.generation.clone(),
            assembler: PlanAssembler::default(),
        }
    }

    pub fn with_assembler(mut self, assembler: PlanAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Days asked of the model in a single call for `request`.
    ///
    /// Starts from the configured batch cap and shrinks until the expected
    /// document fits the completion budget left by the prompt. Never below 1.
    pub fn batch_days_for(&self, request: &PlanRequest) -> u32 {
        let mut days = batch_days(request.duration_days(), self.generation.max_batch_days);
        while days > 1 {
            let prompt = render_prompt(request, days);
            let budget = transport::completion_budget_for(&self.models, &prompt);
            if estimate_plan_output_tokens(days) <= budget {
                break;
            }
            tracing::debug!(days, budget, "batch does not fit the completion budget, shrinking");
            days -= 1;
        }
        days
    }

    pub async fn generate(
        &self,
        request: &PlanRequest,
    ) -> Result<GeneratedPlan, PlanGenerationError> {
        let days = self.batch_days_for(request);
        let prompt = render_prompt(request, days);

        tracing::info!(
            model = %self.models.model,
            requested = request.duration_days(),
            days,
            "requesting meal plan"
        );
        let raw = transport::send_prompt(self.client.as_ref(), &self.models, &prompt, days).await?;

        self.assembler.assemble(&raw, request)
    }
}
