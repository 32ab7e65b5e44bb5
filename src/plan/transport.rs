use crate::client::{ChatCompletionRequest, ChatMessage, ChatMessageRole, DynLlmClient};
use crate::config::ModelSettings;
use crate::tokens::{compute_completion_token_budget, estimate_plan_output_tokens};

use super::error::PlanGenerationError;
use super::prompt::PLANNER_SYSTEM_PROMPT;

pub(crate) fn planner_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: ChatMessageRole::System,
            content: PLANNER_SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: ChatMessageRole::User,
            content: prompt.to_string(),
        },
    ]
}

/// Completion budget left for `prompt` under the configured context limit.
pub(crate) fn completion_budget_for(models: &ModelSettings, prompt: &str) -> u32 {
    compute_completion_token_budget(models.max_tokens, &planner_messages(prompt))
}

/// Sends one planner prompt and returns the raw text of the first choice.
pub(crate) async fn send_prompt(
    client: &DynLlmClient,
    models: &ModelSettings,
    prompt: &str,
    batch_days: u32,
) -> Result<String, PlanGenerationError> {
    let messages = planner_messages(prompt);

    let completion_budget = compute_completion_token_budget(models.max_tokens, &messages);
    let expected_output = estimate_plan_output_tokens(batch_days);
    if expected_output > completion_budget {
        tracing::warn!(
            days = batch_days,
            expected_output,
            completion_budget,
            "plan batch will probably exceed the completion budget"
        );
    }

    let request = ChatCompletionRequest {
        model: models.model.clone(),
        messages,
        max_tokens: Some(completion_budget),
        temperature: Some(models.temperature),
    };

    let response = client
        .chat_completion(request)
        .await
        .map_err(|error| PlanGenerationError::transport(&error.context("planner call failed")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(PlanGenerationError::EmptyOrNonStructuredResponse)?;

    if choice.finish_reason.as_deref() == Some("length") {
        tracing::warn!(
            model = %models.model,
            completion_budget,
            "model output hit the token limit; the plan document is probably truncated"
        );
    }

    Ok(choice.message.content)
}
