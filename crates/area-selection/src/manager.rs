use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use action_locator::build_selector;
use page_dom::{Dom, DomEvent, EventKind, EventListener, ListenerId, NodeId};
use parking_lot::Mutex;
use taxy_core_types::{Locale, SelectionType};
use tracing::{debug, info};

use crate::types::{area_name, banner_text, SelectedArea, SelectionSink, SelectionState, SessionToken};

const CROSSHAIR: &str = "crosshair";
const SESSION_EVENTS: [EventKind; 3] = [EventKind::MouseOver, EventKind::Click, EventKind::KeyDown];

#[derive(Debug)]
struct ActiveSession {
    token: SessionToken,
    selection_type: SelectionType,
    listeners: Vec<ListenerId>,
    hovered: Option<NodeId>,
}

pub struct SelectionManager {
    dom: Arc<dyn Dom>,
    sink: Arc<dyn SelectionSink>,
    locale: Locale,
    session: Mutex<Option<ActiveSession>>,
    selected: Mutex<HashMap<SelectionType, SelectedArea>>,
    next_token: AtomicU64,
}

impl SelectionManager {
    pub fn new(dom: Arc<dyn Dom>, sink: Arc<dyn SelectionSink>) -> Self {
        Self {
            dom,
            sink,
            locale: Locale::default(),
            session: Mutex::new(None),
            selected: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn state(&self) -> SelectionState {
        match self.session.lock().as_ref() {
            Some(session) => SelectionState::Selecting {
                token: session.token,
                selection_type: session.selection_type,
            },
            None => SelectionState::Idle,
        }
    }

    pub fn is_selecting(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Enters selection mode. A session already running is cancelled first,
    /// without emitting anything. Page events reach the session through
    /// listeners registered on the document; clicks on the page are
    /// prevented while it runs.
    pub fn start(self: &Arc<Self>, selection_type: SelectionType) -> SessionToken {
        let token = SessionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let mut slot = self.session.lock();
        if let Some(previous) = slot.take() {
            info!(token = %previous.token, "selection restarted, cancelling previous session");
            self.teardown(previous);
        }

        let listeners = SESSION_EVENTS
            .iter()
            .map(|kind| self.dom.add_event_listener(*kind, self.listener(*kind)))
            .collect();
        self.dom.set_cursor(Some(CROSSHAIR));
        self.dom.show_banner(banner_text(selection_type, self.locale));
        *slot = Some(ActiveSession {
            token,
            selection_type,
            listeners,
            hovered: None,
        });
        info!(%token, selection_type = selection_type.as_str(), "selection started");
        token
    }

    fn listener(self: &Arc<Self>, kind: EventKind) -> EventListener {
        let manager: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |node: NodeId, event: &DomEvent| {
            let Some(manager) = manager.upgrade() else {
                return false;
            };
            match kind {
                EventKind::MouseOver => {
                    manager.on_mouse_over(node);
                    false
                }
                EventKind::Click => {
                    let selecting = manager.is_selecting();
                    manager.on_click(node);
                    selecting
                }
                EventKind::KeyDown => manager.on_key_down(event.key.as_deref().unwrap_or_default()),
                _ => false,
            }
        })
    }

    /// Ends the session owned by `token`. Returns `false` for a stale token.
    pub fn stop(&self, token: SessionToken) -> bool {
        let mut slot = self.session.lock();
        match slot.as_ref() {
            Some(session) if session.token == token => {
                if let Some(session) = slot.take() {
                    self.teardown(session);
                }
                debug!(%token, "selection stopped");
                true
            }
            _ => {
                debug!(%token, "ignoring stop for a stale selection token");
                false
            }
        }
    }

    /// Moves the highlight overlay to `node`. Ignored outside a session.
    pub fn on_mouse_over(&self, node: NodeId) -> bool {
        let mut slot = self.session.lock();
        let Some(session) = slot.as_mut() else {
            return false;
        };
        match self.dom.bounding_rect(node) {
            Some(rect) => {
                session.hovered = Some(node);
                self.dom.show_overlay(rect);
                true
            }
            None => {
                session.hovered = None;
                self.dom.hide_overlay();
                false
            }
        }
    }

    /// Element currently outlined, if it is still in the document.
    pub fn hovered(&self) -> Option<NodeId> {
        let node = self.session.lock().as_ref()?.hovered?;
        self.dom.element(node).map(|_| node)
    }

    /// Commits `node`. Returns the selected area when a session consumed the
    /// click.
    pub fn on_click(&self, node: NodeId) -> Option<SelectedArea> {
        let area = {
            let mut slot = self.session.lock();
            let session = slot.as_ref()?;
            let selector = build_selector(self.dom.as_ref(), node)?;
            let selection_type = session.selection_type;
            if let Some(session) = slot.take() {
                self.teardown(session);
            }
            SelectedArea {
                selection_type,
                selector,
                name: area_name(selection_type, self.locale).to_string(),
                node,
            }
        };

        info!(
            selection_type = area.selection_type.as_str(),
            selector = %area.selector,
            "area selected"
        );
        self.selected
            .lock()
            .insert(area.selection_type, area.clone());
        self.sink.area_selected(&area);
        Some(area)
    }

    /// Escape cancels the running session. Returns whether it did.
    pub fn on_key_down(&self, key: &str) -> bool {
        if key != "Escape" {
            return false;
        }
        let Some(session) = self.session.lock().take() else {
            return false;
        };
        info!(token = %session.token, "selection cancelled");
        self.teardown(session);
        true
    }

    pub fn selected_area(&self, selection_type: SelectionType) -> Option<SelectedArea> {
        self.selected.lock().get(&selection_type).cloned()
    }

    pub fn clear_selections(&self) {
        self.selected.lock().clear();
    }

    fn teardown(&self, session: ActiveSession) {
        for listener in session.listeners {
            self.dom.remove_event_listener(listener);
        }
        self.dom.set_cursor(None);
        self.dom.hide_overlay();
        self.dom.hide_banner();
    }
}

impl Drop for SelectionManager {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            self.teardown(session);
        }
    }
}
