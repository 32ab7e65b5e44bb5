use serde_json::Value;

use crate::plan::scan::{Token, TokenKind, open_containers, scan};
use crate::plan::types::RepairStrategyId;
use crate::plan::validate::{REQUIRED_SLOTS, has_required_meals};

use super::{RepairOutcome, RepairStrategy};

/// Upper bound on closers of each kind appended by [`TruncationRepair`].
pub const MAX_AUTO_CLOSERS: usize = 5;

/// Deletes commas that directly precede `}` or `]`.
pub struct TrailingCommaRemoval;

impl RepairStrategy for TrailingCommaRemoval {
    fn id(&self) -> RepairStrategyId {
        RepairStrategyId::TrailingCommas
    }

    fn attempt(&self, span: &str) -> RepairOutcome {
        let tokens = scan(span).tokens;
        let dangling: Vec<&Token> = tokens
            .windows(2)
            .filter(|pair| pair[0].kind == TokenKind::Comma && pair[1].kind.is_closer())
            .map(|pair| &pair[0])
            .collect();

        if dangling.is_empty() {
            return RepairOutcome::Inapplicable;
        }

        let mut repaired = String::with_capacity(span.len());
        let mut cursor = 0;
        for comma in dangling {
            repaired.push_str(&span[cursor..comma.start]);
            cursor = comma.end;
        }
        repaired.push_str(&span[cursor..]);

        RepairOutcome::parse(repaired)
    }
}

/// Quotes bare object keys and rewrites single-quoted strings.
pub struct QuoteNormalization;

impl QuoteNormalization {
    fn normalize(span: &str) -> Option<String> {
        let chars: Vec<char> = span.chars().collect();
        let mut out = String::with_capacity(span.len() + 16);
        let mut changed = false;
        let mut last_significant: Option<char> = None;
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            match ch {
                '"' => {
                    let end = closing_quote(&chars, i, '"')?;
                    out.extend(&chars[i..=end]);
                    i = end + 1;
                    last_significant = Some('"');
                }
                '\'' => {
                    let end = closing_quote(&chars, i, '\'')?;
                    out.push('"');
                    let mut escaped = false;
                    for &inner in &chars[i + 1..end] {
                        if escaped {
                            if inner != '\'' {
                                out.push('\\');
                            }
                            out.push(inner);
                            escaped = false;
                        } else if inner == '\\' {
                            escaped = true;
                        } else if inner == '"' {
                            out.push_str("\\\"");
                        } else {
                            out.push(inner);
                        }
                    }
                    out.push('"');
                    changed = true;
                    i = end + 1;
                    last_significant = Some('"');
                }
                c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                    let start = i;
                    while i < chars.len()
                        && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                    {
                        i += 1;
                    }
                    let ident: String = chars[start..i].iter().collect();

                    let mut lookahead = i;
                    while lookahead < chars.len() && chars[lookahead].is_whitespace() {
                        lookahead += 1;
                    }
                    let is_key = chars.get(lookahead) == Some(&':')
                        && matches!(last_significant, Some('{') | Some(','));

                    if is_key {
                        out.push('"');
                        out.push_str(&ident);
                        out.push('"');
                        changed = true;
                    } else {
                        out.push_str(&ident);
                    }
                    last_significant = ident.chars().last();
                }
                c => {
                    out.push(c);
                    if !c.is_whitespace() {
                        last_significant = Some(c);
                    }
                    i += 1;
                }
            }
        }

        changed.then_some(out)
    }
}

/// Index of the quote closing the literal opened at `open`.
fn closing_quote(chars: &[char], open: usize, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (idx, &ch) in chars.iter().enumerate().skip(open + 1) {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            return Some(idx);
        }
    }
    None
}

impl RepairStrategy for QuoteNormalization {
    fn id(&self) -> RepairStrategyId {
        RepairStrategyId::QuoteNormalization
    }

    fn attempt(&self, span: &str) -> RepairOutcome {
        match Self::normalize(span) {
            Some(normalized) => RepairOutcome::parse(normalized),
            None => RepairOutcome::Inapplicable,
        }
    }
}

/// Cuts a document back to its last complete token and closes what is open.
pub struct TruncationRepair {
    max_closers: usize,
}

impl TruncationRepair {
    pub fn new(max_closers: usize) -> Self {
        Self { max_closers }
    }

    fn repair(&self, span: &str) -> Option<String> {
        let mut text = span.trim_end().to_string();
        let initial = scan(&text);

        match initial.unterminated_string {
            Some(open) => {
                let preceding = initial
                    .tokens
                    .iter()
                    .rev()
                    .find(|token| token.end <= open)
                    .copied();
                match preceding.map(|token| (token.kind, token.start)) {
                    // Dangling comma before a partial string.
                    Some((TokenKind::Comma, comma)) => text.truncate(comma),
                    // Colon before a partial string value.
                    Some((TokenKind::Colon, _)) => {
                        text.truncate(open);
                        text.push_str("null");
                    }
                    _ => text.truncate(open),
                }
            }
            None => {
                let open = open_containers(&initial.tokens)?;
                if open.is_empty() {
                    return None;
                }
            }
        }

        trim_dangling(&mut text);

        let tokens = scan(&text).tokens;
        let open = open_containers(&tokens)?;
        let braces = open.iter().filter(|kind| **kind == TokenKind::OpenBrace).count();
        let brackets = open.len() - braces;
        if braces > self.max_closers || brackets > self.max_closers {
            return None;
        }

        text.extend(open.iter().rev().map(|kind| match kind {
            TokenKind::OpenBrace => '}',
            _ => ']',
        }));

        Some(text)
    }
}

impl Default for TruncationRepair {
    fn default() -> Self {
        Self::new(MAX_AUTO_CLOSERS)
    }
}

fn is_complete_scalar(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

/// True when the last token is an object key with no colon yet.
fn ends_with_dangling_key(tokens: &[Token]) -> bool {
    let Some((last, rest)) = tokens.split_last() else {
        return false;
    };
    if last.kind != TokenKind::Str {
        return false;
    }

    let inside_object = open_containers(rest)
        .and_then(|open| open.last().copied())
        .is_some_and(|kind| kind == TokenKind::OpenBrace);
    let after_separator = rest
        .last()
        .is_some_and(|token| matches!(token.kind, TokenKind::OpenBrace | TokenKind::Comma));

    inside_object && after_separator
}

/// Strips trailing commas, dangling keys, partial scalars and empty open containers.
fn trim_dangling(text: &mut String) {
    loop {
        let trimmed_len = text.trim_end().len();
        text.truncate(trimmed_len);

        let tokens = scan(text.as_str()).tokens;
        let Some(last) = tokens.last().copied() else {
            return;
        };

        match last.kind {
            TokenKind::Comma | TokenKind::OpenBrace | TokenKind::OpenBracket => {
                text.truncate(last.start)
            }
            TokenKind::Colon => {
                text.push_str(" null");
                return;
            }
            TokenKind::Scalar if !is_complete_scalar(&text[last.start..last.end]) => {
                text.truncate(last.start)
            }
            TokenKind::Str if ends_with_dangling_key(&tokens) => text.truncate(last.start),
            _ => return,
        }
    }
}

/// A day survives the cut only if every mandatory meal kept its name.
fn is_complete_day(day: &Value) -> bool {
    has_required_meals(day)
        && REQUIRED_SLOTS.iter().all(|slot| {
            day["meals"][slot]["name"]
                .as_str()
                .is_some_and(|name| !name.trim().is_empty())
        })
}

/// Drops a final day that lost a mandatory meal to the cut.
fn drop_incomplete_trailing_day(value: &mut Value) -> bool {
    let Some(days) = value.get_mut("days").and_then(Value::as_array_mut) else {
        return false;
    };

    let incomplete = days.len() > 1 && days.last().is_some_and(|day| !is_complete_day(day));
    if incomplete {
        days.pop();
    }
    incomplete
}

impl RepairStrategy for TruncationRepair {
    fn id(&self) -> RepairStrategyId {
        RepairStrategyId::Truncation
    }

    fn attempt(&self, span: &str) -> RepairOutcome {
        let Some(text) = self.repair(span) else {
            return RepairOutcome::Inapplicable;
        };

        match RepairOutcome::parse(text) {
            RepairOutcome::Repaired { text, mut value } => {
                if !drop_incomplete_trailing_day(&mut value) {
                    return RepairOutcome::Repaired { text, value };
                }

                tracing::debug!("dropped incomplete trailing day after truncation repair");
                match serde_json::to_string(&value) {
                    Ok(text) => RepairOutcome::Repaired { text, value },
                    Err(_) => RepairOutcome::Inapplicable,
                }
            }
            RepairOutcome::Inapplicable => RepairOutcome::Inapplicable,
        }
    }
}
