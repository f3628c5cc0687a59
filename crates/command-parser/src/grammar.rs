//! Command text grammar.
//!
//! ```text
//! command   := prefix (ws+ action body?)?
//! action    := [^ws [ " ' {]+
//! body      := bracketed | quoted | structured | bare     (first match wins)
//! bracketed := "[" ... "]" (ws* (bracketed | word))*      nested [] allowed
//! quoted    := quote ... quote (ws* (quoted | word))*     " or ', \ escapes
//! structured:= JSON object
//! bare      := anything, split on whitespace
//! ```

use serde_json::{Map, Value};

use crate::errors::ParseError;

/// Argument syntaxes in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Bracket,
    Quoted,
    Structured,
    Bare,
}

impl Syntax {
    pub const PRECEDENCE: [Syntax; 4] = [
        Syntax::Bracket,
        Syntax::Quoted,
        Syntax::Structured,
        Syntax::Bare,
    ];
}

/// One positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Unquoted word, e.g. a keyword like `in` or `to`.
    Word(String),
    /// Bracketed or quoted value, taken verbatim.
    Value(String),
}

impl Part {
    pub fn text(&self) -> &str {
        match self {
            Part::Word(text) | Part::Value(text) => text,
        }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Part::Word(word) if word.eq_ignore_ascii_case(keyword))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arguments {
    Delimited { syntax: Syntax, parts: Vec<Part> },
    Structured(Map<String, Value>),
    /// Trimmed argument text.
    Bare(String),
}

/// Splits `text` after `prefix`. `None` unless `text` starts with the prefix
/// followed by whitespace or the end of the text.
pub fn strip_prefix<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(prefix)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest.trim_start()),
        Some(_) => None,
    }
}

/// Splits the action token from its argument body.
pub fn split_action(remainder: &str) -> Option<(String, &str)> {
    let remainder = remainder.trim();
    let end = remainder
        .find(|c: char| c.is_whitespace() || matches!(c, '[' | '"' | '\'' | '{'))
        .unwrap_or(remainder.len());
    if end == 0 {
        return None;
    }
    let (action, body) = remainder.split_at(end);
    Some((action.to_lowercase(), body.trim()))
}

/// Matches `body` against every syntax in precedence order.
pub fn parse_arguments(body: &str) -> Result<Arguments, ParseError> {
    for syntax in Syntax::PRECEDENCE {
        if let Some(arguments) = try_syntax(syntax, body)? {
            return Ok(arguments);
        }
    }
    Ok(Arguments::Bare(body.trim().to_string()))
}

fn try_syntax(syntax: Syntax, body: &str) -> Result<Option<Arguments>, ParseError> {
    let body = body.trim();
    match syntax {
        Syntax::Bracket if body.starts_with('[') => {
            Ok(delimited(body, syntax).map(|parts| Arguments::Delimited { syntax, parts }))
        }
        Syntax::Quoted if body.starts_with('"') || body.starts_with('\'') => {
            Ok(delimited(body, syntax).map(|parts| Arguments::Delimited { syntax, parts }))
        }
        Syntax::Structured if body.starts_with('{') => {
            match serde_json::from_str::<Map<String, Value>>(body) {
                Ok(map) => Ok(Some(Arguments::Structured(map))),
                Err(err) => Err(ParseError::MalformedJson(err.to_string())),
            }
        }
        Syntax::Bare => Ok(Some(Arguments::Bare(body.to_string()))),
        _ => Ok(None),
    }
}

/// Tokenizes a bracket or quote body. `None` when a group is unterminated.
fn delimited(body: &str, syntax: Syntax) -> Option<Vec<Part>> {
    let chars: Vec<char> = body.chars().collect();
    let mut parts = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }
        let group = match syntax {
            Syntax::Bracket if c == '[' => Some(bracket_group(&chars, pos)?),
            Syntax::Quoted if c == '"' || c == '\'' => Some(quoted_group(&chars, pos)?),
            _ => None,
        };
        match group {
            Some((value, next)) => {
                parts.push(Part::Value(value));
                pos = next;
            }
            None => {
                let start = pos;
                while pos < chars.len() && !chars[pos].is_whitespace() && !opens_group(syntax, chars[pos]) {
                    pos += 1;
                }
                parts.push(Part::Word(chars[start..pos].iter().collect()));
            }
        }
    }
    Some(parts)
}

fn opens_group(syntax: Syntax, c: char) -> bool {
    match syntax {
        Syntax::Bracket => c == '[',
        Syntax::Quoted => c == '"' || c == '\'',
        _ => false,
    }
}

fn bracket_group(chars: &[char], open: usize) -> Option<(String, usize)> {
    let mut depth = 0usize;
    for (index, &c) in chars.iter().enumerate().skip(open) {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let value: String = chars[open + 1..index].iter().collect();
                    return Some((value.trim().to_string(), index + 1));
                }
            }
            _ => {}
        }
    }
    None
}

fn quoted_group(chars: &[char], open: usize) -> Option<(String, usize)> {
    let quote = chars[open];
    let mut value = String::new();
    let mut pos = open + 1;
    while pos < chars.len() {
        match chars[pos] {
            '\\' if pos + 1 < chars.len() && (chars[pos + 1] == quote || chars[pos + 1] == '\\') => {
                value.push(chars[pos + 1]);
                pos += 2;
            }
            c if c == quote => return Some((value, pos + 1)),
            c => {
                value.push(c);
                pos += 1;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn value(text: &str) -> Part {
        Part::Value(text.to_string())
    }

    fn word(text: &str) -> Part {
        Part::Word(text.to_string())
    }

    #[test]
    fn prefix_needs_a_boundary() {
        assert_eq!(strip_prefix("/taxy click a", "/taxy"), Some("click a"));
        assert_eq!(strip_prefix("/taxy", "/taxy"), Some(""));
        assert_eq!(strip_prefix("/taxyclick", "/taxy"), None);
        assert_eq!(strip_prefix("hello /taxy", "/taxy"), None);
    }

    #[test]
    fn action_token_stops_at_delimiters() {
        assert_eq!(
            split_action("Click[#a]"),
            Some(("click".to_string(), "[#a]"))
        );
        assert_eq!(split_action("   "), None);
    }

    #[test]
    fn bracket_groups_nest() {
        let args = parse_arguments("[input[name=q]] in [form]").unwrap();
        assert_eq!(
            args,
            Arguments::Delimited {
                syntax: Syntax::Bracket,
                parts: vec![value("input[name=q]"), word("in"), value("form")]
            }
        );
    }

    #[test]
    fn quoted_groups_keep_escapes() {
        let args = parse_arguments(r#""say \"hi\"" in '#box'"#).unwrap();
        assert_eq!(
            args,
            Arguments::Delimited {
                syntax: Syntax::Quoted,
                parts: vec![value("say \"hi\""), word("in"), value("#box")]
            }
        );
    }

    #[test]
    fn unterminated_groups_fall_back_to_bare() {
        assert_eq!(
            parse_arguments("[#a to #b").unwrap(),
            Arguments::Bare("[#a to #b".to_string())
        );
        assert_eq!(
            parse_arguments("\"#a").unwrap(),
            Arguments::Bare("\"#a".to_string())
        );
    }

    #[test]
    fn structured_body_must_be_valid_json() {
        assert!(matches!(
            parse_arguments(r##"{"selector": "#a"}"##).unwrap(),
            Arguments::Structured(_)
        ));
        assert!(matches!(
            parse_arguments("{selector: }"),
            Err(ParseError::MalformedJson(_))
        ));
    }

    #[test]
    fn bracket_wins_over_later_syntaxes() {
        assert!(matches!(
            parse_arguments(r#"["quoted" inside]"#).unwrap(),
            Arguments::Delimited {
                syntax: Syntax::Bracket,
                ..
            }
        ));
    }
}
