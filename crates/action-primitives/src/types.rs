//! Core data types for action primitives

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use taxy_core_types::{ActionId, Locale};
use tokio_util::sync::CancellationToken;

use crate::errors::ActionError;

/// Execution context for action primitives
///
/// Carries the action id used for tracing and the cancellation token
/// checked before work starts and during waits.
#[derive(Clone, Debug)]
pub struct ExecCtx {
    /// Cancellation token for cooperative cancellation
    pub cancel_token: CancellationToken,

    /// Unique identifier for this action
    pub action_id: ActionId,
}

impl ExecCtx {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            action_id: ActionId::new(),
        }
    }

    /// Check if this context has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Default for ExecCtx {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "up" => Some(ScrollDirection::Up),
            "down" => Some(ScrollDirection::Down),
            "left" => Some(ScrollDirection::Left),
            "right" => Some(ScrollDirection::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }

    /// Signed offset for scrolling `amount` pixels in this direction.
    pub fn offset(self, amount: f64) -> (f64, f64) {
        match self {
            ScrollDirection::Up => (0.0, -amount),
            ScrollDirection::Down => (0.0, amount),
            ScrollDirection::Left => (-amount, 0.0),
            ScrollDirection::Right => (amount, 0.0),
        }
    }
}

/// Where a scroll action goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScrollTarget {
    Top,
    Bottom,
    Position { x: f64, y: f64 },
    Element { selector: String },
    Relative { direction: ScrollDirection, amount: f64 },
}

/// One browser automation action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    Click {
        selector: String,
    },
    Type {
        selector: String,
        text: String,
    },
    Navigate {
        url: String,
    },
    Scroll {
        target: ScrollTarget,
    },
    Drag {
        #[serde(rename = "sourceSelector")]
        source_selector: String,
        #[serde(rename = "targetSelector")]
        target_selector: String,
    },
    Wait {
        #[serde(rename = "durationMs")]
        duration_ms: u64,
    },
    Screenshot {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },
    Automate {
        instruction: String,
    },
    TestSelector {
        selector: String,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Click { .. } => ActionKind::Click,
            Action::Type { .. } => ActionKind::Type,
            Action::Navigate { .. } => ActionKind::Navigate,
            Action::Scroll { .. } => ActionKind::Scroll,
            Action::Drag { .. } => ActionKind::Drag,
            Action::Wait { .. } => ActionKind::Wait,
            Action::Screenshot { .. } => ActionKind::Screenshot,
            Action::Automate { .. } => ActionKind::Automate,
            Action::TestSelector { .. } => ActionKind::TestSelector,
        }
    }

    /// Rejects actions whose required fields are blank.
    pub fn validate(&self) -> Result<(), ActionError> {
        fn required(field: &str, value: &str) -> Result<(), ActionError> {
            if value.trim().is_empty() {
                Err(ActionError::InvalidAction(format!("'{field}' is required")))
            } else {
                Ok(())
            }
        }

        match self {
            Action::Click { selector } | Action::TestSelector { selector } => {
                required("selector", selector)
            }
            Action::Type { selector, .. } => required("selector", selector),
            Action::Navigate { url } => required("url", url),
            Action::Scroll { target } => match target {
                ScrollTarget::Element { selector } => required("selector", selector),
                ScrollTarget::Position { x, y } if !x.is_finite() || !y.is_finite() => Err(
                    ActionError::InvalidAction("scroll position must be finite".to_string()),
                ),
                ScrollTarget::Relative { amount, .. } if !amount.is_finite() || *amount < 0.0 => {
                    Err(ActionError::InvalidAction(
                        "scroll amount must be a non-negative number".to_string(),
                    ))
                }
                _ => Ok(()),
            },
            Action::Drag {
                source_selector,
                target_selector,
            } => {
                required("sourceSelector", source_selector)?;
                required("targetSelector", target_selector)
            }
            Action::Wait { .. } => Ok(()),
            Action::Screenshot { selector } => match selector {
                Some(selector) => required("selector", selector),
                None => Ok(()),
            },
            Action::Automate { instruction } => required("instruction", instruction),
        }
    }

    /// Time the action takes by itself, independent of the page.
    pub fn intrinsic_duration(&self) -> Duration {
        match self {
            Action::Wait { duration_ms } => Duration::from_millis(*duration_ms),
            _ => Duration::ZERO,
        }
    }
}

/// History form, e.g. `click("#btn")`.
impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Click { selector } => write!(f, "click({selector:?})"),
            Action::Type { selector, text } => write!(f, "type({selector:?}, {text:?})"),
            Action::Navigate { url } => write!(f, "navigate({url:?})"),
            Action::Scroll { target } => match target {
                ScrollTarget::Top => write!(f, "scroll(\"top\")"),
                ScrollTarget::Bottom => write!(f, "scroll(\"bottom\")"),
                ScrollTarget::Position { x, y } => write!(f, "scroll({x}, {y})"),
                ScrollTarget::Element { selector } => write!(f, "scroll(\"to\", {selector:?})"),
                ScrollTarget::Relative { direction, amount } => {
                    write!(f, "scroll({:?}, {amount})", direction.as_str())
                }
            },
            Action::Drag {
                source_selector,
                target_selector,
            } => write!(f, "drag({source_selector:?}, {target_selector:?})"),
            Action::Wait { duration_ms } => write!(f, "wait({duration_ms})"),
            Action::Screenshot { selector: Some(selector) } => {
                write!(f, "screenshot({selector:?})")
            }
            Action::Screenshot { selector: None } => write!(f, "screenshot()"),
            Action::Automate { instruction } => write!(f, "automate({instruction:?})"),
            Action::TestSelector { selector } => write!(f, "test-selector({selector:?})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Click,
    Type,
    Navigate,
    Scroll,
    Drag,
    Wait,
    Screenshot,
    Automate,
    TestSelector,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::Navigate => "navigate",
            ActionKind::Scroll => "scroll",
            ActionKind::Drag => "drag",
            ActionKind::Wait => "wait",
            ActionKind::Screenshot => "screenshot",
            ActionKind::Automate => "automate",
            ActionKind::TestSelector => "test-selector",
        }
    }

    /// User-facing name of the action.
    pub fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, ActionKind::Click) => "Clicking element",
            (Locale::En, ActionKind::Type) => "Typing text",
            (Locale::En, ActionKind::Navigate) => "Navigating to page",
            (Locale::En, ActionKind::Scroll) => "Scrolling page",
            (Locale::En, ActionKind::Drag) => "Dragging element",
            (Locale::En, ActionKind::Wait) => "Waiting",
            (Locale::En, ActionKind::Screenshot) => "Screenshot",
            (Locale::En, ActionKind::Automate) => "Automation",
            (Locale::En, ActionKind::TestSelector) => "Testing selector",
            (Locale::Pl, ActionKind::Click) => "Klikanie elementu",
            (Locale::Pl, ActionKind::Type) => "Wpisywanie tekstu",
            (Locale::Pl, ActionKind::Navigate) => "Przechodzenie do strony",
            (Locale::Pl, ActionKind::Scroll) => "Przewijanie strony",
            (Locale::Pl, ActionKind::Drag) => "Przeciąganie elementu",
            (Locale::Pl, ActionKind::Wait) => "Oczekiwanie",
            (Locale::Pl, ActionKind::Screenshot) => "Zrzut ekranu",
            (Locale::Pl, ActionKind::Automate) => "Automatyzacja",
            (Locale::Pl, ActionKind::TestSelector) => "Testowanie selektora",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action execution report produced by a primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReport {
    /// Whether the action succeeded
    pub ok: bool,

    /// When the action started
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    /// When the action finished
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,

    /// Total latency in milliseconds
    pub latency_ms: u64,

    /// Primitive-specific output
    pub data: Option<Value>,

    /// Error details (if failed)
    pub error: Option<String>,
}

impl ActionReport {
    /// Create a successful action report
    pub fn success(started_at: DateTime<Utc>, latency_ms: u64) -> Self {
        Self {
            ok: true,
            started_at,
            finished_at: Utc::now(),
            latency_ms,
            data: None,
            error: None,
        }
    }

    /// Create a failed action report
    pub fn failure(started_at: DateTime<Utc>, latency_ms: u64, error: &ActionError) -> Self {
        Self {
            ok: false,
            started_at,
            finished_at: Utc::now(),
            latency_ms,
            data: None,
            error: Some(error.to_string()),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Failure taxonomy shared by every stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Parse,
    Invalid,
    Resolution,
    UnsupportedElement,
    Dispatch,
    Timeout,
    Capture,
    Interrupted,
    Internal,
}

/// Wire-level outcome of one command: `{success, error?, errorKind?, data?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ActionResult {
    pub fn ok(data: Option<Value>) -> Self {
        Self {
            success: true,
            error: None,
            error_kind: None,
            data,
        }
    }

    pub fn failed(kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            error_kind: Some(kind),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<ActionReport> for ActionResult {
    fn from(report: ActionReport) -> Self {
        if report.ok {
            ActionResult::ok(report.data)
        } else {
            ActionResult {
                success: false,
                error: report.error,
                error_kind: Some(FailureKind::Internal),
                data: report.data,
            }
        }
    }
}

impl From<&ActionError> for ActionResult {
    fn from(error: &ActionError) -> Self {
        ActionResult::failed(error.failure_kind(), error.to_string())
    }
}
