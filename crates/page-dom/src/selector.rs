//! CSS selector subset used by the page port.
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! selectors with `= ~= ^= $= *= |=` (optionally `i`), `:first-child`,
//! `:last-child`, `:nth-child(n)`, descendant and child combinators and
//! comma-separated lists. Anything else is rejected as invalid.

use crate::errors::DomError;
use crate::types::NodeId;

/// Tree access needed to evaluate selectors against a document.
pub trait SelectorTree {
    fn tag_name(&self, node: NodeId) -> Option<&str>;
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;
    fn parent_element(&self, node: NodeId) -> Option<NodeId>;
    /// 1-based position among element siblings, and the sibling count.
    fn sibling_position(&self, node: NodeId) -> Option<(usize, usize)>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Id(String),
    Class(String),
    Attribute {
        name: String,
        test: Option<AttributeTest>,
    },
    NthChild(usize),
    FirstChild,
    LastChild,
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeTest {
    op: AttributeOp,
    value: String,
    ignore_case: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AttributeOp {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
    DashMatch,
}

impl SelectorList {
    pub fn parse(source: &str) -> Result<Self, DomError> {
        Parser::new(source).parse_list()
    }

    pub fn matches<T: SelectorTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|selector| match_complex(tree, selector, selector.compounds.len() - 1, node))
    }
}

fn match_complex<T: SelectorTree + ?Sized>(
    tree: &T,
    selector: &ComplexSelector,
    index: usize,
    node: NodeId,
) -> bool {
    if !match_compound(tree, &selector.compounds[index], node) {
        return false;
    }
    if index == 0 {
        return true;
    }
    match selector.combinators[index - 1] {
        Combinator::Child => tree
            .parent_element(node)
            .map_or(false, |parent| match_complex(tree, selector, index - 1, parent)),
        Combinator::Descendant => {
            let mut current = tree.parent_element(node);
            while let Some(ancestor) = current {
                if match_complex(tree, selector, index - 1, ancestor) {
                    return true;
                }
                current = tree.parent_element(ancestor);
            }
            false
        }
    }
}

fn match_compound<T: SelectorTree + ?Sized>(tree: &T, compound: &Compound, node: NodeId) -> bool {
    let Some(tag) = tree.tag_name(node) else {
        return false;
    };
    if let Some(expected) = &compound.tag {
        if !tag.eq_ignore_ascii_case(expected) {
            return false;
        }
    }
    compound.conditions.iter().all(|condition| match condition {
        Condition::Id(id) => tree.attribute(node, "id") == Some(id.as_str()),
        Condition::Class(class) => tree
            .attribute(node, "class")
            .map_or(false, |value| value.split_whitespace().any(|c| c == class)),
        Condition::Attribute { name, test } => match (tree.attribute(node, name), test) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(actual), Some(test)) => test.matches(actual),
        },
        Condition::NthChild(n) => tree
            .sibling_position(node)
            .map_or(false, |(position, _)| position == *n),
        Condition::FirstChild => tree
            .sibling_position(node)
            .map_or(false, |(position, _)| position == 1),
        Condition::LastChild => tree
            .sibling_position(node)
            .map_or(false, |(position, count)| position == count),
    })
}

impl AttributeTest {
    fn matches(&self, actual: &str) -> bool {
        let (actual, expected) = if self.ignore_case {
            (actual.to_lowercase(), self.value.to_lowercase())
        } else {
            (actual.to_string(), self.value.clone())
        };
        match self.op {
            AttributeOp::Equals => actual == expected,
            AttributeOp::Includes => actual.split_whitespace().any(|word| word == expected),
            AttributeOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttributeOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttributeOp::Substring => !expected.is_empty() && actual.contains(&expected),
            AttributeOp::DashMatch => {
                actual == expected || actual.starts_with(&format!("{expected}-"))
            }
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> DomError {
        DomError::invalid_selector(self.source, reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().map_or(false, char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(mut self) -> Result<SelectorList, DomError> {
        let mut selectors = Vec::new();
        self.skip_whitespace();
        loop {
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.bump() {
                None => break,
                Some(',') => self.skip_whitespace(),
                Some(other) => return Err(self.error(format!("unexpected '{other}'"))),
            };
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, DomError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_space => combinators.push(Combinator::Descendant),
                Some(other) => return Err(self.error(format!("unexpected '{other}'"))),
            }
            compounds.push(self.parse_compound()?);
        }
        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, DomError> {
        let mut tag = None;
        let mut universal = false;
        if self.eat('*') {
            universal = true;
        } else if self.at_ident_start() {
            tag = Some(self.parse_ident()?.to_ascii_lowercase());
        }

        let mut conditions = Vec::new();
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    conditions.push(Condition::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.pos += 1;
                    conditions.push(Condition::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    conditions.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    conditions.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }

        if tag.is_none() && !universal && conditions.is_empty() {
            return Err(match self.peek() {
                Some(other) => self.error(format!("expected a selector, found '{other}'")),
                None => self.error("expected a selector"),
            });
        }
        Ok(Compound { tag, conditions })
    }

    fn parse_attribute(&mut self) -> Result<Condition, DomError> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        if self.eat(']') {
            return Ok(Condition::Attribute { name, test: None });
        }
        let op = match self.bump() {
            Some('=') => AttributeOp::Equals,
            Some(prefix @ ('~' | '^' | '$' | '*' | '|')) => {
                if !self.eat('=') {
                    return Err(self.error("expected '=' in attribute selector"));
                }
                match prefix {
                    '~' => AttributeOp::Includes,
                    '^' => AttributeOp::Prefix,
                    '$' => AttributeOp::Suffix,
                    '*' => AttributeOp::Substring,
                    _ => AttributeOp::DashMatch,
                }
            }
            _ => return Err(self.error("malformed attribute selector")),
        };
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                self.parse_string(quote)?
            }
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();
        let mut ignore_case = false;
        if matches!(self.peek(), Some('i' | 'I')) {
            self.pos += 1;
            ignore_case = true;
            self.skip_whitespace();
        } else if matches!(self.peek(), Some('s' | 'S')) {
            self.pos += 1;
            self.skip_whitespace();
        }
        if !self.eat(']') {
            return Err(self.error("unterminated attribute selector"));
        }
        Ok(Condition::Attribute {
            name,
            test: Some(AttributeTest {
                op,
                value,
                ignore_case,
            }),
        })
    }

    fn parse_pseudo(&mut self) -> Result<Condition, DomError> {
        let name = self.parse_ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => Ok(Condition::FirstChild),
            "last-child" => Ok(Condition::LastChild),
            "nth-child" => {
                if !self.eat('(') {
                    return Err(self.error("expected '(' after :nth-child"));
                }
                self.skip_whitespace();
                let start = self.pos;
                while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| self.error("expected an index in :nth-child()"))?;
                self.skip_whitespace();
                if !self.eat(')') {
                    return Err(self.error("unterminated :nth-child()"));
                }
                Ok(Condition::NthChild(index))
            }
            other => Err(self.error(format!("unsupported pseudo-class ':{other}'"))),
        }
    }

    fn at_ident_start(&self) -> bool {
        match self.peek() {
            Some(c) => c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii(),
            None => false,
        }
    }

    fn parse_ident(&mut self) -> Result<String, DomError> {
        if !self.at_ident_start() {
            return Err(match self.peek() {
                Some(other) => self.error(format!("expected an identifier, found '{other}'")),
                None => self.error("expected an identifier"),
            });
        }
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                ident.push(self.parse_escape()?);
            } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii() {
                self.pos += 1;
                ident.push(c);
            } else {
                break;
            }
        }
        Ok(ident)
    }

    fn parse_string(&mut self, quote: char) -> Result<String, DomError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(value),
                Some('\\') => value.push(self.parse_escape()?),
                Some(c) => value.push(c),
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char, DomError> {
        let first = self
            .bump()
            .ok_or_else(|| self.error("dangling escape"))?;
        if !first.is_ascii_hexdigit() {
            return Ok(first);
        }
        let mut hex = String::from(first);
        while hex.len() < 6 && self.peek().map_or(false, |c| c.is_ascii_hexdigit()) {
            hex.push(self.chars[self.pos]);
            self.pos += 1;
        }
        if self.peek().map_or(false, char::is_whitespace) {
            self.pos += 1;
        }
        let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
        Ok(char::from_u32(code)
            .filter(|c| *c != '\0')
            .unwrap_or('\u{FFFD}'))
    }
}

/// Escapes `value` for use as an identifier in `#id` or `.class` position.
pub fn escape_identifier(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let chars: Vec<char> = value.chars().collect();
    if chars.as_slice() == ['-'] {
        return "\\-".to_string();
    }
    for (index, &c) in chars.iter().enumerate() {
        let leading_digit =
            c.is_ascii_digit() && (index == 0 || (index == 1 && chars[0] == '-'));
        if leading_digit {
            escaped.push_str(&format!("\\{:x} ", c as u32));
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii() {
            escaped.push(c);
        } else {
            escaped.push('\\');
            escaped.push(c);
        }
    }
    escaped
}

/// Escapes `value` for use inside a double-quoted attribute value.
pub fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_lists() {
        let list = SelectorList::parse("div.card > button#go[type=\"submit\"], a:nth-child(2)")
            .unwrap();
        assert_eq!(list.selectors.len(), 2);
        assert_eq!(list.selectors[0].compounds.len(), 2);
        assert_eq!(list.selectors[0].combinators, vec![Combinator::Child]);
    }

    #[test]
    fn rejects_garbage() {
        for source in ["", "Log in!", "div >", "[data-x", "a:hover", "#", "p,"] {
            assert!(
                SelectorList::parse(source).is_err(),
                "expected '{source}' to be rejected"
            );
        }
    }

    #[test]
    fn plain_words_parse_as_descendant_types() {
        let list = SelectorList::parse("Submit button").unwrap();
        assert_eq!(list.selectors[0].compounds.len(), 2);
    }

    #[test]
    fn escaped_identifiers_parse_back() {
        for raw in ["a.b", "1st", "with space", "x:y", "-2"] {
            let source = format!("#{}", escape_identifier(raw));
            let list = SelectorList::parse(&source).unwrap();
            assert_eq!(
                list.selectors[0].compounds[0].conditions,
                vec![Condition::Id(raw.to_string())],
                "round trip of {raw}"
            );
        }
    }
}
