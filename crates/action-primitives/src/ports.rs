//! Collaborators the executor reports to or delegates to.

use async_trait::async_trait;
use page_dom::Rect;
use serde::Serialize;
use taxy_core_types::{Locale, SelectionType};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::errors::ActionError;
use crate::types::ActionKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Warning,
    Info,
}

/// Event for the user-facing notification surface.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Notification {
    ActionStarted {
        kind: ActionKind,
        label: String,
    },
    ActionCompleted {
        kind: ActionKind,
        label: String,
    },
    ActionFailed {
        kind: ActionKind,
        label: String,
        error: String,
    },
    AreaSelected {
        selection_type: SelectionType,
        selector: String,
    },
    Message {
        level: NotificationLevel,
        text: String,
    },
}

impl Notification {
    pub fn started(kind: ActionKind, locale: Locale) -> Self {
        Notification::ActionStarted {
            kind,
            label: kind.label(locale).to_string(),
        }
    }

    pub fn completed(kind: ActionKind, locale: Locale) -> Self {
        Notification::ActionCompleted {
            kind,
            label: kind.label(locale).to_string(),
        }
    }

    pub fn failed(kind: ActionKind, locale: Locale, error: impl Into<String>) -> Self {
        Notification::ActionFailed {
            kind,
            label: kind.label(locale).to_string(),
            error: error.into(),
        }
    }

    pub fn level(&self) -> NotificationLevel {
        match self {
            Notification::ActionStarted { .. } => NotificationLevel::Info,
            Notification::ActionCompleted { .. } | Notification::AreaSelected { .. } => {
                NotificationLevel::Success
            }
            Notification::ActionFailed { .. } => NotificationLevel::Error,
            Notification::Message { level, .. } => *level,
        }
    }

    /// Text shown to the user.
    pub fn render(&self, locale: Locale) -> String {
        match (self, locale) {
            (Notification::ActionStarted { label, .. }, Locale::En) => format!("Started: {label}"),
            (Notification::ActionStarted { label, .. }, Locale::Pl) => {
                format!("Rozpoczęto: {label}")
            }
            (Notification::ActionCompleted { label, .. }, Locale::En) => {
                format!("Completed: {label}")
            }
            (Notification::ActionCompleted { label, .. }, Locale::Pl) => {
                format!("Zakończono: {label}")
            }
            (Notification::ActionFailed { label, error, .. }, Locale::En) => {
                format!("Failed: {label} - {error}")
            }
            (Notification::ActionFailed { label, error, .. }, Locale::Pl) => {
                format!("Niepowodzenie: {label} - {error}")
            }
            (
                Notification::AreaSelected {
                    selection_type,
                    selector,
                },
                Locale::En,
            ) => format!("{} area selected: {selector}", selection_type.as_str()),
            (
                Notification::AreaSelected {
                    selection_type,
                    selector,
                },
                Locale::Pl,
            ) => format!("Wybrano obszar {}: {selector}", selection_type.as_str()),
            (Notification::Message { text, .. }, _) => text.clone(),
        }
    }
}

/// User-facing notification sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Drops every notification.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct TracingNotifier {
    locale: Locale,
}

impl TracingNotifier {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let text = notification.render(self.locale);
        match notification.level() {
            NotificationLevel::Error => error!(target: "taxy::notify", "{text}"),
            NotificationLevel::Warning => warn!(target: "taxy::notify", "{text}"),
            _ => info!(target: "taxy::notify", "{text}"),
        }
    }
}

/// Fans notifications out to subscribers; notifications sent with no
/// subscriber are dropped.
#[derive(Clone, Debug)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}

/// Screen capture performed outside the page, usually by the host.
#[async_trait]
pub trait CapturePort: Send + Sync {
    /// Captures the visible tab, cropped to `region` when given. Returns the
    /// image as a data URI when the host hands it back.
    async fn capture(&self, region: Option<Rect>) -> Result<Option<String>, ActionError>;
}

/// Capture port for contexts with no capture support.
#[derive(Debug, Default)]
pub struct NoCapture;

#[async_trait]
impl CapturePort for NoCapture {
    async fn capture(&self, _region: Option<Rect>) -> Result<Option<String>, ActionError> {
        Err(ActionError::Capture(
            "screen capture is not available in this context".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_localized_templates() {
        let failed = Notification::failed(ActionKind::Click, Locale::En, "Element not found: #x");
        assert_eq!(
            failed.render(Locale::En),
            "Failed: Clicking element - Element not found: #x"
        );
        assert_eq!(failed.level(), NotificationLevel::Error);
        let started = Notification::started(ActionKind::Type, Locale::Pl);
        assert_eq!(started.render(Locale::Pl), "Rozpoczęto: Wpisywanie tekstu");
    }

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let notifier = BroadcastNotifier::new(4);
        let mut rx = notifier.subscribe();
        notifier.notify(Notification::completed(ActionKind::Wait, Locale::En));
        assert_eq!(
            rx.recv().await.unwrap(),
            Notification::completed(ActionKind::Wait, Locale::En)
        );
    }
}
