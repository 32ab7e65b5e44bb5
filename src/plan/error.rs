use thiserror::Error;

/// Terminal failures of the plan generation pipeline.
///
/// Repairs that succeed never surface here; only the final outcome does.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanGenerationError {
    #[error("model call failed: {message}")]
    Transport { message: String },

    #[error("model response did not contain a structured document")]
    EmptyOrNonStructuredResponse,

    #[error("model response could not be repaired into a structured document")]
    UnrecoverableMalformedResponse,

    #[error("model response is missing required field `{missing_field}`")]
    StructuralValidation { missing_field: String },
}

impl PlanGenerationError {
    pub fn transport(error: &anyhow::Error) -> Self {
        Self::Transport {
            message: format!("{error:#}"),
        }
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::StructuralValidation {
            missing_field: field.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// What a user-facing caller should offer next.
    pub fn suggested_action(&self) -> &'static str {
        if self.is_transport() {
            "Try again in a moment."
        } else {
            "Regenerate the plan with a new request."
        }
    }
}
