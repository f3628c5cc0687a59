use std::sync::{Arc, Mutex};

use area_selection::{SelectedArea, SelectionManager, SelectionSink, SelectionState};
use page_dom::{Dom, DomEvent, ElementSpec, EventKind, MemoryDom, NodeId, Rect};
use pretty_assertions::assert_eq;
use taxy_core_types::{Locale, SelectionType};

#[derive(Default)]
struct RecordingSink {
    areas: Mutex<Vec<SelectedArea>>,
}

impl SelectionSink for RecordingSink {
    fn area_selected(&self, area: &SelectedArea) {
        self.areas.lock().unwrap().push(area.clone());
    }
}

struct Fixture {
    dom: Arc<MemoryDom>,
    sink: Arc<RecordingSink>,
    manager: Arc<SelectionManager>,
    prompt: NodeId,
    answer: NodeId,
}

impl Fixture {
    fn hover(&self, node: NodeId) {
        self.dom
            .dispatch_event(node, DomEvent::new(EventKind::MouseOver))
            .unwrap();
    }

    /// Whether the page's default click handling survives.
    fn click(&self, node: NodeId) -> bool {
        self.dom
            .dispatch_event(node, DomEvent::new(EventKind::Click))
            .unwrap()
    }

    fn key(&self, key: &str) -> bool {
        self.dom
            .dispatch_event(self.prompt, DomEvent::key_down(key))
            .unwrap()
    }
}

fn fixture() -> Fixture {
    let dom = Arc::new(MemoryDom::with_location("https://chat.openai.com/"));
    let body = dom.body();
    let prompt = dom.append(
        body,
        ElementSpec::new("textarea")
            .id("prompt")
            .rect(Rect::new(0.0, 700.0, 600.0, 40.0)),
    );
    let answer = dom.append(body, ElementSpec::new("div").class("answer"));
    let sink = Arc::new(RecordingSink::default());
    let manager = Arc::new(SelectionManager::new(dom.clone(), sink.clone()));
    Fixture {
        dom,
        sink,
        manager,
        prompt,
        answer,
    }
}

#[test]
fn click_commits_once_and_leaves_no_listeners() {
    let f = fixture();
    let baseline = f.dom.listener_count();

    let token = f.manager.start(SelectionType::Input);
    assert_eq!(
        f.manager.state(),
        SelectionState::Selecting {
            token,
            selection_type: SelectionType::Input
        }
    );
    assert_eq!(f.dom.listener_count(), baseline + 3);
    assert_eq!(f.dom.cursor().as_deref(), Some("crosshair"));
    assert!(f.dom.banner().is_some());

    f.hover(f.prompt);
    assert_eq!(f.dom.overlay(), Some(Rect::new(0.0, 700.0, 600.0, 40.0)));
    assert_eq!(f.manager.hovered(), Some(f.prompt));

    assert!(!f.click(f.prompt), "the committing click is prevented");
    let area = f.manager.selected_area(SelectionType::Input).unwrap();
    assert_eq!(area.selector, "#prompt");
    assert_eq!(area.name, "Message input area");

    assert_eq!(f.manager.state(), SelectionState::Idle);
    assert_eq!(f.dom.listener_count(), baseline);
    assert_eq!(f.dom.cursor(), None);
    assert_eq!(f.dom.overlay(), None);
    assert_eq!(f.dom.banner(), None);
    assert_eq!(*f.sink.areas.lock().unwrap(), vec![area]);

    // A second click after commit is ordinary page traffic.
    assert!(f.click(f.answer));
    assert_eq!(f.sink.areas.lock().unwrap().len(), 1);
}

#[test]
fn escape_cancels_and_later_clicks_pass_through() {
    let f = fixture();
    let baseline = f.dom.listener_count();

    f.manager.start(SelectionType::Output);
    f.hover(f.answer);
    assert!(f.key("Enter"));
    assert!(f.manager.is_selecting());
    assert!(!f.key("Escape"));

    assert_eq!(f.manager.state(), SelectionState::Idle);
    assert_eq!(f.dom.listener_count(), baseline);
    assert_eq!(f.dom.overlay(), None);

    assert!(f.click(f.answer));
    assert_eq!(f.manager.state(), SelectionState::Idle);
    assert!(f.sink.areas.lock().unwrap().is_empty());
    assert_eq!(f.manager.selected_area(SelectionType::Output), None);
}

#[test]
fn restart_cancels_the_previous_session() {
    let f = fixture();
    let baseline = f.dom.listener_count();

    let first = f.manager.start(SelectionType::Input);
    let second = f.manager.start(SelectionType::Output);
    assert_ne!(first, second);
    assert_eq!(f.dom.listener_count(), baseline + 3);
    assert!(f.sink.areas.lock().unwrap().is_empty());

    assert!(!f.manager.stop(first), "stale token must be ignored");
    assert!(f.manager.is_selecting());

    assert!(!f.click(f.answer));
    let areas = f.sink.areas.lock().unwrap().clone();
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0].selection_type, SelectionType::Output);
    assert_eq!(areas[0].selector, ".answer");
    assert_eq!(f.dom.listener_count(), baseline);
}

#[test]
fn stop_with_current_token_tears_down() {
    let f = fixture();
    let baseline = f.dom.listener_count();
    let token = f.manager.start(SelectionType::Input);
    assert!(f.manager.stop(token));
    assert!(!f.manager.stop(token));
    assert_eq!(f.dom.listener_count(), baseline);
    assert_eq!(f.dom.cursor(), None);
    assert!(f.click(f.prompt));
    assert!(f.sink.areas.lock().unwrap().is_empty());
}

#[test]
fn events_outside_a_session_are_ignored() {
    let f = fixture();
    f.hover(f.prompt);
    assert!(f.click(f.prompt));
    assert!(f.key("Escape"));
    assert_eq!(f.dom.overlay(), None);
    assert!(f.sink.areas.lock().unwrap().is_empty());
}

#[test]
fn removed_hover_target_is_not_reported() {
    let f = fixture();
    f.manager.start(SelectionType::Output);
    f.hover(f.answer);
    f.dom.remove(f.answer);
    assert_eq!(f.manager.hovered(), None);
    assert!(f.manager.on_click(f.answer).is_none());
    assert!(f.manager.is_selecting(), "a click on a detached node does not commit");
    assert!(!f.key("Escape"));
    assert_eq!(f.manager.state(), SelectionState::Idle);
}

#[test]
fn dropping_the_manager_detaches_its_listeners() {
    let f = fixture();
    let baseline = f.dom.listener_count();
    f.manager.start(SelectionType::Input);
    drop(f.manager);
    assert_eq!(f.dom.listener_count(), baseline);
    assert_eq!(f.dom.cursor(), None);
    assert!(f.dom.dispatch_event(f.prompt, DomEvent::new(EventKind::Click)).unwrap());
}

#[test]
fn polish_names_and_clearing() {
    let f = fixture();
    let manager =
        Arc::new(SelectionManager::new(f.dom.clone(), f.sink.clone()).with_locale(Locale::Pl));
    manager.start(SelectionType::Output);
    assert!(f.dom.banner().unwrap().contains("odbierania"));
    assert!(!f.click(f.answer));
    let area = manager.selected_area(SelectionType::Output).unwrap();
    assert_eq!(area.name, "Obszar odbierania wiadomości");

    manager.clear_selections();
    assert_eq!(manager.selected_area(SelectionType::Output), None);
}
