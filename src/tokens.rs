use crate::client::ChatMessage;

/// Conservative estimate of token usage for a single message content.
fn estimate_token_count(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }

    let char_count = text.chars().count();
    let word_count = text.split_whitespace().count();

    // Pick the larger approximation to stay conservative.
    let approx_from_chars = char_count.div_ceil(3); // ~3 chars per token
    let approx_from_words = word_count;

    approx_from_chars.max(approx_from_words) as u32
}

/// Estimate the total tokens contributed by a sequence of chat messages.
pub fn estimate_prompt_tokens(messages: &[ChatMessage]) -> u32 {
    messages
        .iter()
        .map(|message| estimate_token_count(&message.content) + 4) // per-message metadata
        .sum()
}

/// Safety margin reserved so prompt estimates that run low do not overflow the context.
pub const REQUEST_COMPLETION_SAFETY_MARGIN_TOKENS: u32 = 256;

/// Minimum completion tokens to request to avoid overly truncated answers when possible.
pub const MIN_COMPLETION_TOKENS: u32 = 32;

/// Rough size of one fully populated day in the plan document.
pub const ESTIMATED_TOKENS_PER_DAY: u32 = 900;

/// Fixed overhead of the plan document outside the day list.
pub const ESTIMATED_PLAN_ENVELOPE_TOKENS: u32 = 300;

/// Derive a completion token budget given a context limit and prepared prompt messages.
pub fn compute_completion_token_budget(max_context_tokens: u32, messages: &[ChatMessage]) -> u32 {
    let prompt_tokens = estimate_prompt_tokens(messages);
    let max_possible_completion = max_context_tokens.saturating_sub(prompt_tokens);

    if max_possible_completion == 0 {
        return 1;
    }

    let available = max_possible_completion.saturating_sub(REQUEST_COMPLETION_SAFETY_MARGIN_TOKENS);
    let desired = available.max(MIN_COMPLETION_TOKENS);

    desired.min(max_possible_completion).max(1)
}

/// Expected completion size for a plan document covering `days` days.
pub fn estimate_plan_output_tokens(days: u32) -> u32 {
    ESTIMATED_PLAN_ENVELOPE_TOKENS.saturating_add(days.saturating_mul(ESTIMATED_TOKENS_PER_DAY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessageRole;

    fn message(content: &str) -> ChatMessage {
        ChatMessage {
            role: ChatMessageRole::User,
            content: content.to_string(),
        }
    }

    #[test]
    fn estimate_counts_metadata_for_empty_messages() {
        assert_eq!(estimate_prompt_tokens(&[message("")]), 4);
        assert_eq!(estimate_prompt_tokens(&[message("abcdef")]), 6);
    }

    #[test]
    fn budget_reserves_safety_margin() {
        let messages = vec![message("abcdef")]; // 6 tokens with metadata
        assert_eq!(
            compute_completion_token_budget(4096, &messages),
            4096 - 6 - REQUEST_COMPLETION_SAFETY_MARGIN_TOKENS
        );
    }

    #[test]
    fn budget_keeps_minimum_when_margin_would_consume_everything() {
        let messages = vec![message("abcdef")];
        assert_eq!(compute_completion_token_budget(100, &messages), MIN_COMPLETION_TOKENS);
        assert_eq!(compute_completion_token_budget(20, &messages), 14);
    }

    #[test]
    fn budget_never_drops_to_zero() {
        let messages = vec![message(&"word ".repeat(500))];
        assert_eq!(compute_completion_token_budget(10, &messages), 1);
    }

    #[test]
    fn plan_output_estimate_grows_per_day() {
        assert_eq!(estimate_plan_output_tokens(0), ESTIMATED_PLAN_ENVELOPE_TOKENS);
        assert_eq!(
            estimate_plan_output_tokens(3) - estimate_plan_output_tokens(2),
            ESTIMATED_TOKENS_PER_DAY
        );
    }
}
