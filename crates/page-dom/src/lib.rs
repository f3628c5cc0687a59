//! Document port for the page context.
//!
//! Everything that touches the live document goes through [`Dom`]. The crate
//! ships [`MemoryDom`], an in-memory document used by the CLI and the tests,
//! together with the selector engine it evaluates queries with.

pub mod errors;
pub mod fixture;
pub mod memory;
pub mod outline;
pub mod selector;
pub mod types;

use std::time::Duration;

pub use errors::DomError;
pub use fixture::{NodeFixture, PageFixture};
pub use memory::{ElementSpec, HighlightRecord, MemoryDom, RecordedEvent, ScrollRecord};
pub use outline::page_outline;
pub use selector::{escape_identifier, escape_string, SelectorList};
pub use types::{
    DomEvent, ElementInfo, EventKind, EventListener, ListenerId, NodeId, Rect, ScrollBehavior,
};

/// Synchronous access to the document of one page context.
///
/// Implementations must be cheap to call from async code: no method blocks on
/// I/O, and none is called while another one is running on the same context.
pub trait Dom: Send + Sync {
    fn root(&self) -> NodeId;

    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError>;

    fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    fn element(&self, node: NodeId) -> Option<ElementInfo>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.element(node).map(|info| info.rect)
    }

    /// Dispatches `event` on `node`, running the listeners registered for its
    /// kind. Returns `false` when one of them prevented the default action.
    fn dispatch_event(&self, node: NodeId, event: DomEvent) -> Result<bool, DomError>;

    fn focus(&self, node: NodeId) -> Result<(), DomError>;

    /// `input` of a text-like type or `textarea`.
    fn is_text_control(&self, node: NodeId) -> bool;

    /// Current value of a form control, or the text of an editable region.
    fn value(&self, node: NodeId) -> Option<String>;

    fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError>;

    fn scroll_to(&self, x: f64, y: f64, behavior: ScrollBehavior);

    fn scroll_by(&self, dx: f64, dy: f64, behavior: ScrollBehavior);

    fn scroll_into_view(&self, node: NodeId, behavior: ScrollBehavior) -> Result<(), DomError>;

    fn scroll_position(&self) -> (f64, f64);

    /// Full scrollable size of the document.
    fn document_size(&self) -> (f64, f64);

    fn location(&self) -> String;

    fn set_location(&self, url: &str);

    fn hostname(&self) -> Option<String> {
        url::Url::parse(&self.location())
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }

    /// Registers a document-level listener for `kind`. Listeners are called
    /// without any internal lock held, so they may call back into the
    /// document.
    fn add_event_listener(&self, kind: EventKind, listener: EventListener) -> ListenerId;

    fn remove_event_listener(&self, id: ListenerId) -> bool;

    fn listener_count(&self) -> usize;

    fn set_cursor(&self, cursor: Option<&str>);

    fn show_overlay(&self, rect: Rect);

    fn hide_overlay(&self);

    fn show_banner(&self, text: &str);

    fn hide_banner(&self);

    fn highlight(&self, nodes: &[NodeId], duration: Duration);
}
