//! In-memory document with an event log.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::errors::DomError;
use crate::selector::{SelectorList, SelectorTree};
use crate::types::{
    DomEvent, ElementInfo, EventKind, EventListener, ListenerId, NodeId, Rect, ScrollBehavior,
};
use crate::Dom;

const ROW_HEIGHT: f64 = 24.0;
const DEFAULT_VIEWPORT: (f64, f64) = (1280.0, 800.0);
const TEXT_INPUT_TYPES: &[&str] = &["", "text", "search", "email", "password", "url", "tel", "number"];

/// Event observed by the document, in dispatch order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordedEvent {
    pub target: NodeId,
    pub kind: EventKind,
    pub bubbles: bool,
    pub cancelable: bool,
    pub client_x: Option<f64>,
    pub client_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// A listener prevented the default action.
    pub default_prevented: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScrollRecord {
    pub x: f64,
    pub y: f64,
    pub behavior: ScrollBehavior,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HighlightRecord {
    pub nodes: Vec<NodeId>,
    pub duration_ms: u64,
}

/// Description of an element to append.
#[derive(Clone, Debug, Default)]
pub struct ElementSpec {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    value: Option<String>,
    rect: Option<Rect>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }
}

#[derive(Debug)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    value: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Rect,
    attached: bool,
}

struct Registration {
    kind: EventKind,
    listener: EventListener,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("kind", &self.kind).finish()
    }
}

#[derive(Debug)]
struct PageState {
    nodes: Vec<NodeData>,
    body: NodeId,
    location: String,
    scroll: (f64, f64),
    viewport: (f64, f64),
    focused: Option<NodeId>,
    events: Vec<RecordedEvent>,
    scrolls: Vec<ScrollRecord>,
    navigations: Vec<String>,
    listeners: BTreeMap<ListenerId, Registration>,
    next_listener: u64,
    cursor: Option<String>,
    overlay: Option<Rect>,
    banner: Option<String>,
    highlights: Vec<HighlightRecord>,
}

pub struct MemoryDom {
    state: Mutex<PageState>,
}

impl MemoryDom {
    /// Empty `html > body` document at `about:blank`.
    pub fn new() -> Self {
        Self::with_location("about:blank")
    }

    pub fn with_location(location: impl Into<String>) -> Self {
        let mut state = PageState {
            nodes: Vec::new(),
            body: NodeId(1),
            location: location.into(),
            scroll: (0.0, 0.0),
            viewport: DEFAULT_VIEWPORT,
            focused: None,
            events: Vec::new(),
            scrolls: Vec::new(),
            navigations: Vec::new(),
            listeners: BTreeMap::new(),
            next_listener: 1,
            cursor: None,
            overlay: None,
            banner: None,
            highlights: Vec::new(),
        };
        let root = state.insert(None, ElementSpec::new("html"));
        state.body = state.insert(Some(root), ElementSpec::new("body"));
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn body(&self) -> NodeId {
        self.state.lock().body
    }

    pub fn append(&self, parent: NodeId, spec: ElementSpec) -> NodeId {
        self.state.lock().insert(Some(parent), spec)
    }

    /// Detaches `node` and its subtree. Existing handles become stale.
    pub fn remove(&self, node: NodeId) {
        let mut state = self.state.lock();
        if let Some(parent) = state.nodes.get(node.0).and_then(|data| data.parent) {
            state.nodes[parent.0].children.retain(|child| *child != node);
        }
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            if let Some(data) = state.nodes.get_mut(current.0) {
                data.attached = false;
                pending.extend(data.children.iter().copied());
            }
        }
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut state = self.state.lock();
        if let Some(data) = state.nodes.get_mut(node.0) {
            let name = name.to_ascii_lowercase();
            match data.attributes.iter_mut().find(|(key, _)| *key == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => data.attributes.push((name, value.to_string())),
            }
        }
    }

    pub fn set_viewport(&self, width: f64, height: f64) {
        self.state.lock().viewport = (width, height);
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.state.lock().events.clone()
    }

    /// Kinds of the events dispatched on `node`, in order.
    pub fn events_on(&self, node: NodeId) -> Vec<EventKind> {
        self.state
            .lock()
            .events
            .iter()
            .filter(|event| event.target == node)
            .map(|event| event.kind)
            .collect()
    }

    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().navigations.clone()
    }

    pub fn scrolls(&self) -> Vec<ScrollRecord> {
        self.state.lock().scrolls.clone()
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.state.lock().focused
    }

    pub fn cursor(&self) -> Option<String> {
        self.state.lock().cursor.clone()
    }

    pub fn overlay(&self) -> Option<Rect> {
        self.state.lock().overlay
    }

    pub fn banner(&self) -> Option<String> {
        self.state.lock().banner.clone()
    }

    pub fn highlights(&self) -> Vec<HighlightRecord> {
        self.state.lock().highlights.clone()
    }

    pub fn text_content(&self, node: NodeId) -> Option<String> {
        let state = self.state.lock();
        state.is_attached(node).then(|| state.text_content(node))
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl PageState {
    fn insert(&mut self, parent: Option<NodeId>, spec: ElementSpec) -> NodeId {
        let id = NodeId(self.nodes.len());
        let rect = spec
            .rect
            .unwrap_or_else(|| Rect::new(0.0, ROW_HEIGHT * id.0 as f64, 200.0, ROW_HEIGHT));
        let attached = parent.map_or(true, |parent| self.is_attached(parent));
        self.nodes.push(NodeData {
            tag: spec.tag,
            attributes: spec.attributes,
            text: spec.text,
            value: spec.value,
            parent,
            children: Vec::new(),
            rect,
            attached,
        });
        if let Some(parent) = parent {
            if let Some(data) = self.nodes.get_mut(parent.0) {
                data.children.push(id);
            }
        }
        id
    }

    fn node(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0).filter(|data| data.attached)
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(node, &mut text);
        text
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        if let Some(data) = self.node(node) {
            out.push_str(&data.text);
            for child in &data.children {
                self.collect_text(*child, out);
            }
        }
    }

    fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId(0)];
        while let Some(node) = stack.pop() {
            if let Some(data) = self.node(node) {
                order.push(node);
                stack.extend(data.children.iter().rev().copied());
            }
        }
        order
    }

    fn attribute_of(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).and_then(|data| {
            data.attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        })
    }

    fn is_text_control(&self, node: NodeId) -> bool {
        match self.node(node).map(|data| data.tag.as_str()) {
            Some("textarea") => true,
            Some("input") => {
                let kind = self
                    .attribute_of(node, "type")
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                TEXT_INPUT_TYPES.contains(&kind.as_str())
            }
            _ => false,
        }
    }

    fn is_editable(&self, node: NodeId) -> bool {
        self.attribute_of(node, "contenteditable")
            .map_or(false, |value| value.is_empty() || value.eq_ignore_ascii_case("true"))
    }

    fn document_size(&self) -> (f64, f64) {
        self.document_order()
            .into_iter()
            .filter_map(|node| self.node(node))
            .fold(self.viewport, |(width, height), data| {
                (width.max(data.rect.right()), height.max(data.rect.bottom()))
            })
    }

    fn record_scroll(&mut self, x: f64, y: f64, behavior: ScrollBehavior) {
        let (width, height) = self.document_size();
        let max_x = (width - self.viewport.0).max(0.0);
        let max_y = (height - self.viewport.1).max(0.0);
        self.scroll = (x.clamp(0.0, max_x), y.clamp(0.0, max_y));
        self.scrolls.push(ScrollRecord {
            x: self.scroll.0,
            y: self.scroll.1,
            behavior,
        });
    }
}

impl SelectorTree for PageState {
    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|data| data.tag.as_str())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attribute_of(node, name)
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|data| data.parent)
    }

    fn sibling_position(&self, node: NodeId) -> Option<(usize, usize)> {
        match self.node(node)?.parent {
            Some(parent) => {
                let siblings = &self.node(parent)?.children;
                let index = siblings.iter().position(|child| *child == node)?;
                Some((index + 1, siblings.len()))
            }
            None => Some((1, 1)),
        }
    }
}

impl Dom for MemoryDom {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let list = SelectorList::parse(selector)?;
        let state = self.state.lock();
        Ok(state
            .document_order()
            .into_iter()
            .filter(|node| list.matches(&*state, *node))
            .collect())
    }

    fn element(&self, node: NodeId) -> Option<ElementInfo> {
        let state = self.state.lock();
        let data = state.node(node)?;
        Some(ElementInfo {
            node,
            tag: data.tag.clone(),
            attributes: data.attributes.clone(),
            text: state.text_content(node),
            rect: data.rect,
        })
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.lock().parent_element(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .lock()
            .node(node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn dispatch_event(&self, node: NodeId, event: DomEvent) -> Result<bool, DomError> {
        let listeners: Vec<(ListenerId, EventListener)> = {
            let state = self.state.lock();
            if !state.is_attached(node) {
                return Err(DomError::NodeNotFound(node));
            }
            state
                .listeners
                .iter()
                .filter(|(_, registration)| registration.kind == event.kind)
                .map(|(id, registration)| (*id, registration.listener.clone()))
                .collect()
        };
        debug!(target_node = %node, kind = %event.kind, listeners = listeners.len(), "dispatching event");

        let mut prevented = false;
        for (id, listener) in listeners {
            // Removed by an earlier listener of this dispatch.
            if !self.state.lock().listeners.contains_key(&id) {
                continue;
            }
            if listener(node, &event) && event.cancelable {
                prevented = true;
            }
        }

        self.state.lock().events.push(RecordedEvent {
            target: node,
            kind: event.kind,
            bubbles: event.bubbles,
            cancelable: event.cancelable,
            client_x: event.client_x,
            client_y: event.client_y,
            key: event.key,
            default_prevented: prevented,
        });
        Ok(!prevented)
    }

    fn focus(&self, node: NodeId) -> Result<(), DomError> {
        let mut state = self.state.lock();
        if !state.is_attached(node) {
            return Err(DomError::NodeNotFound(node));
        }
        state.focused = Some(node);
        Ok(())
    }

    fn is_text_control(&self, node: NodeId) -> bool {
        self.state.lock().is_text_control(node)
    }

    fn value(&self, node: NodeId) -> Option<String> {
        let state = self.state.lock();
        let data = state.node(node)?;
        if state.is_text_control(node) || data.tag == "select" {
            Some(
                data.value
                    .clone()
                    .or_else(|| state.attribute_of(node, "value").map(str::to_string))
                    .unwrap_or_default(),
            )
        } else if state.is_editable(node) {
            Some(state.text_content(node))
        } else {
            None
        }
    }

    fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError> {
        let mut state = self.state.lock();
        let Some(tag) = state.node(node).map(|data| data.tag.clone()) else {
            return Err(DomError::NodeNotFound(node));
        };
        if state.is_text_control(node) {
            state.nodes[node.0].value = Some(value.to_string());
            Ok(())
        } else if state.is_editable(node) {
            let children = std::mem::take(&mut state.nodes[node.0].children);
            for child in children {
                state.nodes[child.0].attached = false;
            }
            state.nodes[node.0].text = value.to_string();
            Ok(())
        } else {
            Err(DomError::NotTextControl(tag))
        }
    }

    fn scroll_to(&self, x: f64, y: f64, behavior: ScrollBehavior) {
        self.state.lock().record_scroll(x, y, behavior);
    }

    fn scroll_by(&self, dx: f64, dy: f64, behavior: ScrollBehavior) {
        let mut state = self.state.lock();
        let (x, y) = state.scroll;
        state.record_scroll(x + dx, y + dy, behavior);
    }

    fn scroll_into_view(&self, node: NodeId, behavior: ScrollBehavior) -> Result<(), DomError> {
        let mut state = self.state.lock();
        let rect = state
            .node(node)
            .map(|data| data.rect)
            .ok_or(DomError::NodeNotFound(node))?;
        let x = state.scroll.0;
        state.record_scroll(x, rect.y, behavior);
        Ok(())
    }

    fn scroll_position(&self) -> (f64, f64) {
        self.state.lock().scroll
    }

    fn document_size(&self) -> (f64, f64) {
        self.state.lock().document_size()
    }

    fn location(&self) -> String {
        self.state.lock().location.clone()
    }

    fn set_location(&self, url: &str) {
        let mut state = self.state.lock();
        state.location = url.to_string();
        state.navigations.push(url.to_string());
    }

    fn add_event_listener(&self, kind: EventKind, listener: EventListener) -> ListenerId {
        let mut state = self.state.lock();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.insert(id, Registration { kind, listener });
        id
    }

    fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.state.lock().listeners.remove(&id).is_some()
    }

    fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    fn set_cursor(&self, cursor: Option<&str>) {
        self.state.lock().cursor = cursor.map(str::to_string);
    }

    fn show_overlay(&self, rect: Rect) {
        self.state.lock().overlay = Some(rect);
    }

    fn hide_overlay(&self) {
        self.state.lock().overlay = None;
    }

    fn show_banner(&self, text: &str) {
        self.state.lock().banner = Some(text.to_string());
    }

    fn hide_banner(&self) {
        self.state.lock().banner = None;
    }

    fn highlight(&self, nodes: &[NodeId], duration: Duration) {
        self.state.lock().highlights.push(HighlightRecord {
            nodes: nodes.to_vec(),
            duration_ms: duration.as_millis() as u64,
        });
    }
}
