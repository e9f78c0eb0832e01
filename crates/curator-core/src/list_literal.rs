//! Parser and formatter for list-of-strings literals such as `['a', "b's"]`.
//!
//! Language models and the persisted topic CSVs both exchange keyword lists
//! in this shape. The parser accepts exactly that shape and nothing else: a
//! bracketed, comma-separated sequence of single- or double-quoted strings
//! with an optional trailing comma.

use thiserror::Error;

/// Why a list literal was rejected. Positions are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListLiteralError {
    #[error("expected '[' at position {position}")]
    ExpectedOpenBracket { position: usize },

    #[error("expected a quoted string at position {position}, found {found:?}")]
    ExpectedString { position: usize, found: char },

    #[error("expected ',' or ']' at position {position}, found {found:?}")]
    ExpectedSeparator { position: usize, found: char },

    #[error("unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected content after the closing ']' at position {position}")]
    TrailingContent { position: usize },
}

/// Parse a list-of-strings literal.
pub fn parse_string_list(text: &str) -> Result<Vec<String>, ListLiteralError> {
    let mut parser = Parser::new(text);
    parser.skip_whitespace();
    parser.expect_open()?;

    let mut items = Vec::new();
    loop {
        parser.skip_whitespace();
        match parser.peek() {
            None => return Err(ListLiteralError::UnexpectedEnd),
            Some((_, ']')) => {
                parser.bump();
                break;
            }
            Some((_, '\'')) | Some((_, '"')) => {
                items.push(parser.string()?);
                parser.skip_whitespace();
                match parser.peek() {
                    None => return Err(ListLiteralError::UnexpectedEnd),
                    Some((_, ',')) => {
                        parser.bump();
                    }
                    Some((_, ']')) => {
                        parser.bump();
                        break;
                    }
                    Some((position, found)) => {
                        return Err(ListLiteralError::ExpectedSeparator { position, found })
                    }
                }
            }
            Some((position, found)) => {
                return Err(ListLiteralError::ExpectedString { position, found })
            }
        }
    }

    parser.skip_whitespace();
    if let Some((position, _)) = parser.peek() {
        return Err(ListLiteralError::TrailingContent { position });
    }
    Ok(items)
}

/// Render strings as a list literal that [`parse_string_list`] reads back.
///
/// Items are single-quoted unless they contain `'` but no `"`, in which case
/// double quotes are used.
pub fn format_string_list<S: AsRef<str>>(items: &[S]) -> String {
    let rendered: Vec<String> = items.iter().map(|s| quote(s.as_ref())).collect();
    format!("[{}]", rendered.join(", "))
}

fn quote(item: &str) -> String {
    let delimiter = if item.contains('\'') && !item.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(item.len() + 2);
    out.push(delimiter);
    for c in item.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some((_, c)) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn expect_open(&mut self) -> Result<(), ListLiteralError> {
        match self.bump() {
            Some((_, '[')) => Ok(()),
            Some((position, _)) => Err(ListLiteralError::ExpectedOpenBracket { position }),
            None => Err(ListLiteralError::UnexpectedEnd),
        }
    }

    fn string(&mut self) -> Result<String, ListLiteralError> {
        let (start, delimiter) = self.bump().ok_or(ListLiteralError::UnexpectedEnd)?;
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(ListLiteralError::UnterminatedString { position: start }),
                Some((_, c)) if c == delimiter => return Ok(value),
                Some((_, '\\')) => match self.bump() {
                    None => {
                        return Err(ListLiteralError::UnterminatedString { position: start })
                    }
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, c @ ('\\' | '\'' | '"'))) => value.push(c),
                    Some((_, other)) => {
                        // unknown escapes are kept verbatim
                        value.push('\\');
                        value.push(other);
                    }
                },
                Some((_, c)) => value.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_quoted() {
        assert_eq!(
            parse_string_list("['htlc', 'routing']").unwrap(),
            vec!["htlc", "routing"]
        );
    }

    #[test]
    fn test_parse_double_quoted_and_mixed() {
        assert_eq!(
            parse_string_list(r#"["Schnorr's signatures", 'taproot']"#).unwrap(),
            vec!["Schnorr's signatures", "taproot"]
        );
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse_string_list("[]").unwrap().is_empty());
        assert!(parse_string_list("  [ ]  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_trailing_comma() {
        assert_eq!(parse_string_list("['a',]").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_parse_escapes() {
        assert_eq!(
            parse_string_list(r"['don\'t', 'back\\slash', 'odd\d']").unwrap(),
            vec!["don't", "back\\slash", "odd\\d"]
        );
    }

    #[test]
    fn test_reject_code() {
        let err = parse_string_list("__import__('os').system('ls')").unwrap_err();
        assert_eq!(err, ListLiteralError::ExpectedOpenBracket { position: 0 });
    }

    #[test]
    fn test_reject_non_string_items() {
        let err = parse_string_list("['a', 1]").unwrap_err();
        assert_eq!(
            err,
            ListLiteralError::ExpectedString {
                position: 6,
                found: '1'
            }
        );
    }

    #[test]
    fn test_reject_missing_separator() {
        let err = parse_string_list("['a' 'b']").unwrap_err();
        assert!(matches!(err, ListLiteralError::ExpectedSeparator { .. }));
    }

    #[test]
    fn test_reject_unterminated() {
        let err = parse_string_list("['htlc', 'rout").unwrap_err();
        assert_eq!(err, ListLiteralError::UnterminatedString { position: 9 });
    }

    #[test]
    fn test_reject_missing_close() {
        assert_eq!(
            parse_string_list("['a',").unwrap_err(),
            ListLiteralError::UnexpectedEnd
        );
    }

    #[test]
    fn test_reject_trailing_content() {
        let err = parse_string_list("['a'] and more").unwrap_err();
        assert_eq!(err, ListLiteralError::TrailingContent { position: 6 });
    }

    #[test]
    fn test_format_prefers_single_quotes() {
        assert_eq!(format_string_list(&["a", "b"]), "['a', 'b']");
        assert_eq!(format_string_list::<&str>(&[]), "[]");
    }

    #[test]
    fn test_format_switches_to_double_quotes() {
        assert_eq!(format_string_list(&["Schnorr's"]), r#"["Schnorr's"]"#);
    }

    #[test]
    fn test_format_escapes_when_both_quotes_present() {
        let items = vec![r#"it's "quoted""#.to_string(), "line\nbreak".to_string()];
        let rendered = format_string_list(&items);
        assert_eq!(rendered, r#"['it\'s "quoted"', 'line\nbreak']"#);
        assert_eq!(parse_string_list(&rendered).unwrap(), items);
    }
}
