//! Declarative page description loaded from YAML or JSON.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::DomError;
use crate::memory::{ElementSpec, MemoryDom};
use crate::types::{NodeId, Rect};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PageFixture {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub viewport: Option<(f64, f64)>,
    #[serde(default)]
    pub body: Vec<NodeFixture>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeFixture {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub children: Vec<NodeFixture>,
}

impl PageFixture {
    /// Parses YAML; JSON documents are accepted as well.
    pub fn from_yaml(source: &str) -> Result<Self, DomError> {
        serde_yaml::from_str(source).map_err(|err| DomError::Fixture(err.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self, DomError> {
        let source = std::fs::read_to_string(path)
            .map_err(|err| DomError::Fixture(format!("{}: {err}", path.display())))?;
        Self::from_yaml(&source)
    }

    pub fn build(&self) -> MemoryDom {
        let dom = MemoryDom::with_location(self.url.as_deref().unwrap_or("about:blank"));
        if let Some((width, height)) = self.viewport {
            dom.set_viewport(width, height);
        }
        let body = dom.body();
        for node in &self.body {
            append_fixture(&dom, body, node);
        }
        dom
    }
}

fn append_fixture(dom: &MemoryDom, parent: NodeId, fixture: &NodeFixture) {
    let mut spec = ElementSpec::new(&fixture.tag);
    if let Some(id) = &fixture.id {
        spec = spec.id(id);
    }
    if let Some(class) = &fixture.class {
        spec = spec.class(class);
    }
    for (name, value) in &fixture.attributes {
        spec = spec.attr(name, value);
    }
    if let Some(text) = &fixture.text {
        spec = spec.text(text);
    }
    if let Some(value) = &fixture.value {
        spec = spec.value(value);
    }
    if let Some(rect) = fixture.rect {
        spec = spec.rect(rect);
    }
    let node = dom.append(parent, spec);
    for child in &fixture.children {
        append_fixture(dom, node, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dom;

    #[test]
    fn builds_nested_fixture() {
        let fixture = PageFixture::from_yaml(
            r#"
url: https://claude.ai/chat
body:
  - tag: div
    class: composer
    children:
      - tag: div
        attributes:
          contenteditable: "true"
      - tag: button
        id: send
        text: Send
"#,
        )
        .unwrap();
        let dom = fixture.build();
        assert_eq!(dom.hostname().as_deref(), Some("claude.ai"));
        let send = dom.query_selector("div.composer > #send").unwrap();
        assert!(send.is_some());
        let editable = dom.query_selector("[contenteditable=\"true\"]").unwrap();
        assert_eq!(dom.value(editable.unwrap()).as_deref(), Some(""));
    }

    #[test]
    fn json_fixtures_are_accepted() {
        let fixture =
            PageFixture::from_yaml(r#"{"body": [{"tag": "a", "text": "Home"}]}"#).unwrap();
        let dom = fixture.build();
        assert_eq!(dom.query_selector_all("a").unwrap().len(), 1);
    }

    #[test]
    fn malformed_fixture_is_an_error() {
        assert!(matches!(
            PageFixture::from_yaml("body: [ {tag: "),
            Err(DomError::Fixture(_))
        ));
    }
}
