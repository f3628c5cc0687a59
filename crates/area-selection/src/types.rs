use std::fmt;

use page_dom::NodeId;
use serde::{Deserialize, Serialize};
use taxy_core_types::{Locale, SelectionType};

/// Identifies one selection session. Stale tokens are ignored.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub u64);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "selection-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SelectionState {
    Idle,
    Selecting {
        token: SessionToken,
        selection_type: SelectionType,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedArea {
    pub selection_type: SelectionType,
    pub selector: String,
    pub name: String,
    /// Element the selector was built from; may be gone by now.
    pub node: NodeId,
}

/// Receives committed selections (the page side forwards them as
/// `AREA_SELECTED`).
pub trait SelectionSink: Send + Sync {
    fn area_selected(&self, area: &SelectedArea);
}

pub(crate) fn area_name(selection_type: SelectionType, locale: Locale) -> &'static str {
    match (locale, selection_type) {
        (Locale::En, SelectionType::Input) => "Message input area",
        (Locale::En, SelectionType::Output) => "Message output area",
        (Locale::Pl, SelectionType::Input) => "Obszar wysyłania wiadomości",
        (Locale::Pl, SelectionType::Output) => "Obszar odbierania wiadomości",
    }
}

pub(crate) fn banner_text(selection_type: SelectionType, locale: Locale) -> &'static str {
    match (locale, selection_type) {
        (Locale::En, SelectionType::Input) => {
            "Select the area where messages are typed. Click an element, Esc cancels."
        }
        (Locale::En, SelectionType::Output) => {
            "Select the area where replies appear. Click an element, Esc cancels."
        }
        (Locale::Pl, SelectionType::Input) => {
            "Wybierz obszar do wysyłania wiadomości. Kliknij na element."
        }
        (Locale::Pl, SelectionType::Output) => {
            "Wybierz obszar do odbierania wiadomości. Kliknij na element."
        }
    }
}
