//! Lenient lexical scan of JSON-like text.
//!
//! Produces byte ranges for punctuation, double-quoted strings and bare
//! scalars without judging validity, so repair strategies can reason about
//! structure even when the text does not parse.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Colon,
    Comma,
    Str,
    Scalar,
}

impl TokenKind {
    pub(crate) fn is_closer(self) -> bool {
        matches!(self, TokenKind::CloseBrace | TokenKind::CloseBracket)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Scan {
    pub tokens: Vec<Token>,
    /// Byte offset of a string literal still open at end of input.
    pub unterminated_string: Option<usize>,
}

fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '{' | '}' | '[' | ']' | ':' | ',' | '"')
}

pub(crate) fn scan(text: &str) -> Scan {
    let mut result = Scan::default();
    let mut chars = text.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        let punct = match ch {
            '{' => Some(TokenKind::OpenBrace),
            '}' => Some(TokenKind::CloseBrace),
            '[' => Some(TokenKind::OpenBracket),
            ']' => Some(TokenKind::CloseBracket),
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };

        if let Some(kind) = punct {
            result.tokens.push(Token {
                kind,
                start,
                end: start + 1,
            });
            continue;
        }

        if ch.is_whitespace() {
            continue;
        }

        if ch == '"' {
            let mut escaped = false;
            let mut end = None;
            for (idx, inner) in chars.by_ref() {
                if escaped {
                    escaped = false;
                } else if inner == '\\' {
                    escaped = true;
                } else if inner == '"' {
                    end = Some(idx + 1);
                    break;
                }
            }

            match end {
                Some(end) => result.tokens.push(Token {
                    kind: TokenKind::Str,
                    start,
                    end,
                }),
                None => {
                    result.unterminated_string = Some(start);
                    break;
                }
            }
            continue;
        }

        let mut end = start + ch.len_utf8();
        while let Some(&(idx, next)) = chars.peek() {
            if is_delimiter(next) {
                break;
            }
            end = idx + next.len_utf8();
            chars.next();
        }
        result.tokens.push(Token {
            kind: TokenKind::Scalar,
            start,
            end,
        });
    }

    result
}

/// Containers still open after `tokens`, outermost first.
///
/// Returns `None` when a closer does not match the innermost open container.
pub(crate) fn open_containers(tokens: &[Token]) -> Option<Vec<TokenKind>> {
    let mut stack = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::OpenBrace | TokenKind::OpenBracket => stack.push(token.kind),
            TokenKind::CloseBrace => {
                if stack.pop() != Some(TokenKind::OpenBrace) {
                    return None;
                }
            }
            TokenKind::CloseBracket => {
                if stack.pop() != Some(TokenKind::OpenBracket) {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some(stack)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        scan(text).tokens.iter().map(|token| token.kind).collect()
    }

    #[test]
    fn scans_punctuation_strings_and_scalars() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#"{"a": [1, true], "b": "x{y"}"#),
            vec![
                OpenBrace, Str, Colon, OpenBracket, Scalar, Comma, Scalar, CloseBracket, Comma,
                Str, Colon, Str, CloseBrace
            ]
        );
    }

    #[test]
    fn escaped_quotes_stay_inside_string() {
        let result = scan(r#"["say \"hi\"", 2]"#);
        assert_eq!(result.tokens[1].kind, TokenKind::Str);
        assert_eq!(result.tokens[1].end, 13);
        assert!(result.unterminated_string.is_none());
    }

    #[test]
    fn reports_unterminated_string_offset() {
        let result = scan(r#"{"name": "Overnight oa"#);
        assert_eq!(result.unterminated_string, Some(9));
        assert_eq!(result.tokens.last().map(|t| t.kind), Some(TokenKind::Colon));
    }

    #[test]
    fn open_containers_tracks_nesting() {
        let result = scan(r#"{"days": [{"meals": {"#);
        assert_eq!(
            open_containers(&result.tokens),
            Some(vec![
                TokenKind::OpenBrace,
                TokenKind::OpenBracket,
                TokenKind::OpenBrace,
                TokenKind::OpenBrace
            ])
        );
        assert_eq!(open_containers(&scan("{]").tokens), None);
    }
}
