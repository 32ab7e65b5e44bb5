use serde_json::Value;

use super::scan::{TokenKind, scan};

const FENCE_MARKERS: [&str; 3] = ["```json", "```JSON", "```"];

/// Why the strict parse rejected a span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

fn strip_think_blocks(input: &str) -> String {
    let mut cleaned = input.to_string();

    while let Some(think_start) = cleaned.find("<think>") {
        match cleaned[think_start..].find("</think>") {
            Some(think_end_pos) => {
                let absolute_end = think_start + think_end_pos + "</think>".len();
                cleaned.replace_range(think_start..absolute_end, "");
            }
            None => {
                // Unclosed block: the model never got past its reasoning.
                cleaned.truncate(think_start);
                break;
            }
        }
    }

    cleaned
}

/// Isolates the substring most likely to be the plan document.
///
/// The span starts at the first `{` and ends at the brace that balances it.
/// Truncated output never balances, so the span then runs to the end.
pub fn extract_candidate(raw: &str) -> Option<String> {
    let mut cleaned = strip_think_blocks(raw);
    for marker in FENCE_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }

    let trimmed = cleaned.trim();
    let start = trimmed.find('{')?;
    let body = &trimmed[start..];

    let mut depth = 0usize;
    for token in scan(body).tokens {
        match token.kind {
            TokenKind::OpenBrace | TokenKind::OpenBracket => depth += 1,
            TokenKind::CloseBrace | TokenKind::CloseBracket => {
                depth = depth.saturating_sub(1);
                if depth == 0 && token.kind == TokenKind::CloseBrace {
                    return Some(body[..token.end].to_string());
                }
            }
            _ => {}
        }
    }

    Some(body.trim_end().to_string())
}

/// Single parse attempt with no leniency.
pub fn strict_parse(span: &str) -> Result<Value, ParseFailure> {
    serde_json::from_str(span).map_err(|error| ParseFailure {
        offset: byte_offset(span, error.line(), error.column()),
        line: error.line(),
        column: error.column(),
        message: error.to_string(),
    })
}

/// Converts serde_json's 1-based line/column into a byte offset.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_from_fenced_prose() {
        let raw = "Here is your plan:\n```json\n{\"name\": \"Week\", \"days\": []}\n```\nEnjoy!";
        assert_eq!(
            extract_candidate(raw).as_deref(),
            Some("{\"name\": \"Week\", \"days\": []}")
        );
    }

    #[test]
    fn ignores_braces_inside_strings_and_trailing_prose() {
        let raw = r#"{"name": "curly } plan", "days": []} and {"extra": true}"#;
        assert_eq!(
            extract_candidate(raw).as_deref(),
            Some(r#"{"name": "curly } plan", "days": []}"#)
        );
    }

    #[test]
    fn stray_closing_brace_after_document_is_excluded() {
        let raw = "```json\n{\"name\": \"Week\", \"days\": []}\n```\nHope that helps :} }";
        let span = extract_candidate(raw).unwrap();
        assert_eq!(span, r#"{"name": "Week", "days": []}"#);
        assert!(strict_parse(&span).is_ok());
    }

    #[test]
    fn truncated_document_runs_to_end_of_text() {
        let raw = "```json\n{\"name\": \"Week\", \"days\": [{\"day\": 1}, {\"day\": 2, \"meals\": {\"breakfast\": {\"name\": \"Oat";
        let span = extract_candidate(raw).unwrap();
        assert!(span.starts_with("{\"name\""));
        assert!(span.ends_with("\"Oat"));
    }

    #[test]
    fn strips_reasoning_blocks_before_extracting() {
        let raw = "<think>maybe {\"draft\": 1}</think>{\"name\": \"Final\"}";
        assert_eq!(
            extract_candidate(raw).as_deref(),
            Some("{\"name\": \"Final\"}")
        );
        assert_eq!(extract_candidate("<think>{\"never\": \"closed\""), None);
    }

    #[test]
    fn prose_without_braces_has_no_candidate() {
        assert_eq!(extract_candidate("Sorry, I cannot help with that."), None);
        assert_eq!(extract_candidate(""), None);
    }

    #[test]
    fn strict_parse_reports_byte_offset() {
        let span = "{\n  \"a\": 1,\n  \"b\": ,\n}";
        let failure = strict_parse(span).unwrap_err();
        assert_eq!(failure.line, 3);
        assert_eq!(&span[failure.offset..failure.offset + 1], ",");
    }

    #[test]
    fn strict_parse_accepts_clean_document() {
        let value = strict_parse(r#"{"name": "Week", "days": [1, 2]}"#).unwrap();
        assert_eq!(value["days"].as_array().map(Vec::len), Some(2));
    }
}
