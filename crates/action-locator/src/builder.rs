//! Selector construction for a chosen element.
//!
//! Rules, first applicable wins: `#id`, first `data-*` attribute, first
//! class, `tag:nth-child(n)`.

use page_dom::{escape_identifier, escape_string, Dom, NodeId};

/// Builds a selector for `node`, or `None` when the node is gone.
pub fn build_selector(dom: &dyn Dom, node: NodeId) -> Option<String> {
    let info = dom.element(node)?;

    if let Some(id) = info.id() {
        return Some(format!("#{}", escape_identifier(id)));
    }

    if let Some((name, value)) = info
        .attributes
        .iter()
        .find(|(name, _)| name.starts_with("data-") && name.len() > "data-".len())
    {
        return Some(format!(
            "{}[{}=\"{}\"]",
            info.tag,
            escape_identifier(name),
            escape_string(value)
        ));
    }

    if let Some(class) = info.classes().next() {
        return Some(format!(".{}", escape_identifier(class)));
    }

    let position = match dom.parent(node) {
        Some(parent) => dom.children(parent).iter().position(|child| *child == node)? + 1,
        None => 1,
    };
    Some(format!("{}:nth-child({})", info.tag, position))
}
