//! Maps parsed arguments onto action fields.

use action_primitives::{Action, ScrollDirection, ScrollTarget};
use serde_json::{Map, Value};

use crate::errors::ParseError;
use crate::grammar::{Arguments, Part};

/// Default distance for `scroll up|down|left|right` without an amount.
pub const DEFAULT_SCROLL_AMOUNT: f64 = 300.0;

pub fn click(args: &Arguments) -> Result<Action, ParseError> {
    Ok(Action::Click {
        selector: single("click", "selector", args)?,
    })
}

pub fn test_selector(args: &Arguments) -> Result<Action, ParseError> {
    Ok(Action::TestSelector {
        selector: single("test-selector", "selector", args)?,
    })
}

pub fn navigate(args: &Arguments) -> Result<Action, ParseError> {
    Ok(Action::Navigate {
        url: single("navigate", "url", args)?,
    })
}

pub fn automate(args: &Arguments) -> Result<Action, ParseError> {
    Ok(Action::Automate {
        instruction: single("automate", "instruction", args)?,
    })
}

pub fn screenshot(args: &Arguments) -> Result<Action, ParseError> {
    let selector = match args {
        Arguments::Structured(map) => optional_string(map, &["selector"]),
        _ => Some(joined(args)).filter(|text| !text.is_empty()),
    };
    Ok(Action::Screenshot { selector })
}

/// `type selector text...`, `type "text" in "selector"`, `type [selector] [text]`.
pub fn type_text(args: &Arguments) -> Result<Action, ParseError> {
    let (selector, text) = match args {
        Arguments::Structured(map) => (
            required_string("type", map, &["selector"])?,
            required_string("type", map, &["text", "value"])?,
        ),
        Arguments::Bare(raw) => {
            let (selector, text) = split_first_word(raw);
            (selector.to_string(), text.to_string())
        }
        Arguments::Delimited { parts, .. } => {
            match parts.iter().position(|part| part.is_keyword("in") || part.is_keyword("into")) {
                Some(index) => (join_parts(&parts[index + 1..]), join_parts(&parts[..index])),
                None => match parts.split_first() {
                    Some((first, rest)) => (first.text().to_string(), join_parts(rest)),
                    None => (String::new(), String::new()),
                },
            }
        }
    };
    if selector.trim().is_empty() {
        return Err(ParseError::invalid("type", "a target selector is required"));
    }
    if text.is_empty() {
        return Err(ParseError::invalid("type", "text to type is required"));
    }
    Ok(Action::Type { selector, text })
}

/// `drag source|target`, `drag source to target`.
pub fn drag(args: &Arguments) -> Result<Action, ParseError> {
    let (source, target) = match args {
        Arguments::Structured(map) => (
            required_string("drag", map, &["sourceSelector", "source"])?,
            required_string("drag", map, &["targetSelector", "target"])?,
        ),
        _ => {
            let parts = parts_of(args);
            if let Some(index) = parts.iter().position(|part| part.is_keyword("to")) {
                (join_parts(&parts[..index]), join_parts(&parts[index + 1..]))
            } else if parts.len() == 2 {
                (parts[0].text().to_string(), parts[1].text().to_string())
            } else {
                let text = join_parts(&parts);
                match text.split_once('|') {
                    Some((source, target)) => (source.trim().to_string(), target.trim().to_string()),
                    None => (text, String::new()),
                }
            }
        }
    };
    if source.is_empty() {
        return Err(ParseError::invalid("drag", "a source selector is required"));
    }
    if target.is_empty() {
        return Err(ParseError::invalid("drag", "a target selector is required"));
    }
    Ok(Action::Drag {
        source_selector: source,
        target_selector: target,
    })
}

/// `wait 500` or `wait 500ms`.
pub fn wait(args: &Arguments) -> Result<Action, ParseError> {
    let duration_ms = match args {
        Arguments::Structured(map) => match lookup(map, &["durationMs", "ms", "duration"]) {
            Some(Value::Number(number)) => number
                .as_u64()
                .ok_or_else(|| ParseError::invalid("wait", "duration must be a whole number of milliseconds"))?,
            Some(Value::String(text)) => parse_millis(text)?,
            _ => return Err(ParseError::invalid("wait", "a duration is required")),
        },
        _ => parse_millis(&joined(args))?,
    };
    Ok(Action::Wait { duration_ms })
}

fn parse_millis(text: &str) -> Result<u64, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::invalid("wait", "a duration is required"));
    }
    let digits = text
        .strip_suffix("ms")
        .map(str::trim_end)
        .unwrap_or(text);
    digits
        .parse::<u64>()
        .map_err(|_| ParseError::invalid("wait", format!("'{text}' is not a number of milliseconds")))
}

/// `scroll top|bottom`, `scroll x,y`, `scroll x y`, `scroll to selector`,
/// `scroll up|down|left|right [amount]`.
pub fn scroll(args: &Arguments) -> Result<Action, ParseError> {
    let target = match args {
        Arguments::Structured(map) => scroll_from_map(map)?,
        _ => scroll_from_parts(&parts_of(args))?,
    };
    Ok(Action::Scroll { target })
}

fn scroll_from_parts(parts: &[Part]) -> Result<ScrollTarget, ParseError> {
    let Some((first, rest)) = parts.split_first() else {
        return Err(ParseError::invalid("scroll", "a scroll target is required"));
    };
    if first.is_keyword("to") {
        let selector = join_parts(rest);
        if selector.is_empty() {
            return Err(ParseError::invalid("scroll", "a selector is required after 'to'"));
        }
        return Ok(ScrollTarget::Element { selector });
    }
    if rest.is_empty() && first.is_keyword("top") {
        return Ok(ScrollTarget::Top);
    }
    if rest.is_empty() && first.is_keyword("bottom") {
        return Ok(ScrollTarget::Bottom);
    }
    if let Some(direction) = ScrollDirection::parse(first.text()) {
        let amount = match rest {
            [] => DEFAULT_SCROLL_AMOUNT,
            [amount] => parse_number(amount.text())?,
            _ => return Err(ParseError::invalid("scroll", "expected a single amount")),
        };
        return Ok(ScrollTarget::Relative { direction, amount });
    }

    let coordinates: Vec<&str> = parts
        .iter()
        .flat_map(|part| part.text().split(|c: char| c == ',' || c.is_whitespace()))
        .filter(|piece| !piece.is_empty())
        .collect();
    match coordinates.as_slice() {
        [x, y] => Ok(ScrollTarget::Position {
            x: parse_number(x)?,
            y: parse_number(y)?,
        }),
        _ => Err(ParseError::invalid(
            "scroll",
            format!("unrecognised scroll target '{}'", join_parts(parts)),
        )),
    }
}

fn scroll_from_map(map: &Map<String, Value>) -> Result<ScrollTarget, ParseError> {
    if let (Some(x), Some(y)) = (map.get("x"), map.get("y")) {
        return Ok(ScrollTarget::Position {
            x: json_number(x)?,
            y: json_number(y)?,
        });
    }
    if let Some(selector) = optional_string(map, &["selector"]) {
        return Ok(ScrollTarget::Element { selector });
    }
    if let Some(direction) = optional_string(map, &["direction"]) {
        let direction = ScrollDirection::parse(&direction).ok_or_else(|| {
            ParseError::invalid("scroll", format!("unknown direction '{direction}'"))
        })?;
        let amount = match map.get("amount") {
            Some(amount) => json_number(amount)?,
            None => DEFAULT_SCROLL_AMOUNT,
        };
        return Ok(ScrollTarget::Relative { direction, amount });
    }
    match optional_string(map, &["position"]).as_deref() {
        Some("top") => Ok(ScrollTarget::Top),
        Some("bottom") => Ok(ScrollTarget::Bottom),
        _ => Err(ParseError::invalid("scroll", "a scroll target is required")),
    }
}

fn parse_number(text: &str) -> Result<f64, ParseError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseError::invalid("scroll", format!("'{text}' is not a number")))
}

fn json_number(value: &Value) -> Result<f64, ParseError> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| ParseError::invalid("scroll", "coordinates must be numbers")),
        Value::String(text) => parse_number(text),
        _ => Err(ParseError::invalid("scroll", "coordinates must be numbers")),
    }
}

/// The whole argument as one value.
fn single(action: &str, field: &str, args: &Arguments) -> Result<String, ParseError> {
    let value = match args {
        Arguments::Structured(map) => optional_string(map, &[field]).unwrap_or_default(),
        Arguments::Delimited { parts, .. } => match parts.iter().find(|part| matches!(part, Part::Value(_))) {
            Some(Part::Value(value)) if parts.len() == 1 => value.clone(),
            _ => join_parts(parts),
        },
        Arguments::Bare(raw) => raw.clone(),
    };
    if value.trim().is_empty() {
        return Err(ParseError::invalid(action, format!("a {field} is required")));
    }
    Ok(value)
}

fn parts_of(args: &Arguments) -> Vec<Part> {
    match args {
        Arguments::Delimited { parts, .. } => parts.clone(),
        Arguments::Bare(raw) => raw
            .split_whitespace()
            .map(|word| Part::Word(word.to_string()))
            .collect(),
        Arguments::Structured(_) => Vec::new(),
    }
}

fn joined(args: &Arguments) -> String {
    match args {
        Arguments::Bare(raw) => raw.clone(),
        other => join_parts(&parts_of(other)),
    }
}

fn join_parts(parts: &[Part]) -> String {
    parts.iter().map(Part::text).collect::<Vec<_>>().join(" ")
}

fn split_first_word(raw: &str) -> (&str, &str) {
    let raw = raw.trim();
    match raw.find(char::is_whitespace) {
        Some(index) => (&raw[..index], raw[index..].trim_start()),
        None => (raw, ""),
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key))
}

fn optional_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match lookup(map, keys)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn required_string(action: &str, map: &Map<String, Value>, keys: &[&str]) -> Result<String, ParseError> {
    optional_string(map, keys)
        .ok_or_else(|| ParseError::invalid(action, format!("'{}' is required", keys[0])))
}
