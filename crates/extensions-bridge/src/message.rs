//! Messages exchanged between the background and page contexts.

use std::fmt;

use action_primitives::Action;
use page_dom::Rect;
use serde::{Deserialize, Serialize};
use taxy_core_types::{ChatPlatform, SelectionType};

/// `{type, payload}` envelope body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandMessage {
    /// A parsed chat command, page -> background.
    ChatCommand {
        action: Action,
        #[serde(default)]
        source: ChatPlatform,
    },
    /// Run one action in the page, background -> page.
    ExecuteAction(Action),
    StartAreaSelection {
        #[serde(rename = "selectionType")]
        selection_type: SelectionType,
    },
    AreaSelected {
        #[serde(rename = "selectionType")]
        selection_type: SelectionType,
        selector: String,
        name: String,
    },
    TakeScreenshot {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<Rect>,
    },
    ExecuteAutomation {
        instruction: String,
    },
    GetPageDom,
}

impl CommandMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            CommandMessage::ChatCommand { .. } => MessageKind::ChatCommand,
            CommandMessage::ExecuteAction(_) => MessageKind::ExecuteAction,
            CommandMessage::StartAreaSelection { .. } => MessageKind::StartAreaSelection,
            CommandMessage::AreaSelected { .. } => MessageKind::AreaSelected,
            CommandMessage::TakeScreenshot { .. } => MessageKind::TakeScreenshot,
            CommandMessage::ExecuteAutomation { .. } => MessageKind::ExecuteAutomation,
            CommandMessage::GetPageDom => MessageKind::GetPageDom,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    ChatCommand,
    ExecuteAction,
    StartAreaSelection,
    AreaSelected,
    TakeScreenshot,
    ExecuteAutomation,
    GetPageDom,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::ChatCommand => "CHAT_COMMAND",
            MessageKind::ExecuteAction => "EXECUTE_ACTION",
            MessageKind::StartAreaSelection => "START_AREA_SELECTION",
            MessageKind::AreaSelected => "AREA_SELECTED",
            MessageKind::TakeScreenshot => "TAKE_SCREENSHOT",
            MessageKind::ExecuteAutomation => "EXECUTE_AUTOMATION",
            MessageKind::GetPageDom => "GET_PAGE_DOM",
        }
    }

    /// Whether the sender waits for a reply.
    pub fn expects_reply(self) -> bool {
        !matches!(
            self,
            MessageKind::StartAreaSelection | MessageKind::AreaSelected
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn wire_shape_is_type_and_payload() {
        let message = CommandMessage::AreaSelected {
            selection_type: SelectionType::Output,
            selector: ".answer".into(),
            name: "Output area".into(),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "AREA_SELECTED",
                "payload": {"selectionType": "output", "selector": ".answer", "name": "Output area"}
            })
        );
    }

    #[test]
    fn execute_action_carries_the_action_as_payload() {
        let parsed: CommandMessage = serde_json::from_value(json!({
            "type": "EXECUTE_ACTION",
            "payload": {"action": "click", "selector": "#go"}
        }))
        .unwrap();
        assert_eq!(
            parsed,
            CommandMessage::ExecuteAction(Action::Click {
                selector: "#go".into()
            })
        );
        assert_eq!(parsed.kind().as_str(), "EXECUTE_ACTION");
    }

    #[test]
    fn unit_message_needs_no_payload() {
        let parsed: CommandMessage = serde_json::from_value(json!({"type": "GET_PAGE_DOM"})).unwrap();
        assert_eq!(parsed, CommandMessage::GetPageDom);
        assert!(parsed.kind().expects_reply());
        assert!(!MessageKind::StartAreaSelection.expects_reply());
    }
}
