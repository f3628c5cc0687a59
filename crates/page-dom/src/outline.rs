//! Compact text rendering of a document for action planning.

use crate::{Dom, NodeId};

const OUTLINE_TAGS: &[&str] = &[
    "a", "button", "input", "textarea", "select", "label", "h1", "h2", "h3", "form",
];
const OUTLINE_ATTRIBUTES: &[&str] = &["id", "class", "name", "type", "placeholder", "aria-label", "role", "href"];
const MAX_TEXT: usize = 80;

/// One line per interactive or heading element, at most `limit` lines.
pub fn page_outline(dom: &dyn Dom, limit: usize) -> String {
    let mut lines = Vec::new();
    let mut stack = vec![dom.root()];
    while let Some(node) = stack.pop() {
        if lines.len() >= limit {
            break;
        }
        if let Some(line) = describe(dom, node) {
            lines.push(line);
        }
        let mut children = dom.children(node);
        children.reverse();
        stack.extend(children);
    }
    lines.join("\n")
}

fn describe(dom: &dyn Dom, node: NodeId) -> Option<String> {
    let info = dom.element(node)?;
    let interesting = OUTLINE_TAGS.contains(&info.tag.as_str())
        || info.attribute("role") == Some("button")
        || info.attribute("contenteditable").is_some();
    if !interesting {
        return None;
    }
    let mut line = format!("<{}", info.tag);
    for name in OUTLINE_ATTRIBUTES {
        if let Some(value) = info.attribute(name) {
            line.push_str(&format!(" {name}=\"{value}\""));
        }
    }
    for (name, value) in &info.attributes {
        if name.starts_with("data-") {
            line.push_str(&format!(" {name}=\"{value}\""));
        }
    }
    let text: String = info.text.split_whitespace().collect::<Vec<_>>().join(" ");
    let text: String = text.chars().take(MAX_TEXT).collect();
    line.push('>');
    line.push_str(&text);
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementSpec, MemoryDom};

    #[test]
    fn lists_interactive_elements_only() {
        let dom = MemoryDom::new();
        let body = dom.body();
        let div = dom.append(body, ElementSpec::new("div").text("noise"));
        dom.append(div, ElementSpec::new("button").id("go").text("  Go   now "));
        dom.append(body, ElementSpec::new("a").attr("href", "/help").text("Help"));
        let outline = page_outline(&dom, 10);
        assert_eq!(
            outline,
            "<button id=\"go\">Go now\n<a href=\"/help\">Help"
        );
    }

    #[test]
    fn respects_limit() {
        let dom = MemoryDom::new();
        for i in 0..5 {
            dom.append(dom.body(), ElementSpec::new("button").text(format!("b{i}")));
        }
        assert_eq!(page_outline(&dom, 2).lines().count(), 2);
    }
}
