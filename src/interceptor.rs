//! Chat observer of the page context.
//!
//! Watches the chat input for `/taxy` text, submits recognised commands to
//! the background context and clears the input so the command never reaches
//! the chat itself. Once attached, Enter key presses on the input are
//! intercepted through a document listener and their outcomes broadcast.

use std::sync::{Arc, Weak};

use action_primitives::{ActionResult, FailureKind};
use command_parser::{identify_platform, Command, CommandParser, ParseError};
use extensions_bridge::{Bridge, CommandMessage, Endpoint, Target};
use page_dom::{Dom, DomEvent, EventKind, ListenerId, NodeId};
use serde::Serialize;
use taxy_core_types::{ChatPlatform, TabId};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::PipelineError;

/// What became of one submitted chat text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum InterceptOutcome {
    /// Not a command; the chat handles it as usual
    Ignored,
    Help { text: String },
    /// Malformed command; nothing was dispatched
    Rejected { result: ActionResult },
    Executed { result: ActionResult },
}

impl InterceptOutcome {
    pub fn result(&self) -> Option<&ActionResult> {
        match self {
            InterceptOutcome::Rejected { result } | InterceptOutcome::Executed { result } => {
                Some(result)
            }
            _ => None,
        }
    }
}

pub struct ChatInterceptor {
    tab: TabId,
    dom: Arc<dyn Dom>,
    bridge: Arc<dyn Bridge>,
    parser: CommandParser,
    platform: ChatPlatform,
    input_selector: String,
    config: Config,
    outcomes: broadcast::Sender<InterceptOutcome>,
}

const OUTCOME_BUFFER: usize = 16;

impl ChatInterceptor {
    /// `stored_input` is the user's custom input selector, which wins over
    /// the platform default.
    pub fn new(
        tab: TabId,
        dom: Arc<dyn Dom>,
        bridge: Arc<dyn Bridge>,
        config: Config,
        stored_input: Option<String>,
    ) -> Self {
        let platform = dom
            .hostname()
            .map(|host| identify_platform(&host))
            .unwrap_or_default();
        let input_selector =
            stored_input.unwrap_or_else(|| platform.input_selector().to_string());
        info!(%tab, %platform, %input_selector, "chat interceptor created");
        let (outcomes, _) = broadcast::channel(OUTCOME_BUFFER);
        Self {
            tab,
            dom,
            bridge,
            parser: CommandParser::new(config.parser()),
            platform,
            input_selector,
            config,
            outcomes,
        }
    }

    pub fn platform(&self) -> ChatPlatform {
        self.platform
    }

    pub fn input_selector(&self) -> &str {
        &self.input_selector
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    fn input(&self) -> Option<NodeId> {
        self.dom.query_selector(&self.input_selector).ok().flatten()
    }

    /// Outcomes of commands submitted through the attached key listener.
    pub fn subscribe(&self) -> broadcast::Receiver<InterceptOutcome> {
        self.outcomes.subscribe()
    }

    /// Registers the keydown listener on the document. Enter on the chat
    /// input is prevented when it carries a command, and the command is
    /// submitted on the current runtime. Remove the returned listener to
    /// detach.
    pub fn attach(self: &Arc<Self>) -> ListenerId {
        let interceptor: Weak<Self> = Arc::downgrade(self);
        let listener = self.dom.add_event_listener(
            EventKind::KeyDown,
            Arc::new(move |node: NodeId, event: &DomEvent| {
                let Some(interceptor) = interceptor.upgrade() else {
                    return false;
                };
                interceptor.intercept(node, event)
            }),
        );
        info!(tab = %self.tab, input_selector = %self.input_selector, "chat interceptor attached");
        listener
    }

    fn intercept(self: Arc<Self>, node: NodeId, event: &DomEvent) -> bool {
        if self.input() != Some(node) {
            return false;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!(tab = %self.tab, "no runtime to submit the chat command on");
            return false;
        };
        let key = event.key.as_deref().unwrap_or_default();
        let Some(text) = self.take_command(key, event.shift_key) else {
            return false;
        };
        runtime.spawn(async move {
            let outcome = self.submit(&text).await;
            // Nobody listening is fine.
            let _ = self.outcomes.send(outcome);
        });
        true
    }

    /// Handles a key press in the chat input. Enter without shift submits
    /// the current text; anything else is left to the page.
    pub async fn on_key_down(&self, key: &str, shift: bool) -> Option<InterceptOutcome> {
        let text = self.take_command(key, shift)?;
        Some(self.submit(&text).await)
    }

    /// Takes the command out of the chat input when `key` submits it.
    fn take_command(&self, key: &str, shift: bool) -> Option<String> {
        if key != "Enter" || shift {
            return None;
        }
        let input = self.input()?;
        let text = self.dom.value(input)?;
        if !self.parser.is_command(&text) {
            return None;
        }
        if let Err(err) = self.dom.set_value(input, "") {
            warn!(error = %err, "could not clear the chat input");
        }
        Some(text)
    }

    pub async fn submit(&self, text: &str) -> InterceptOutcome {
        let command = match self.parser.parse(text) {
            Ok(None) => return InterceptOutcome::Ignored,
            Ok(Some(command)) => command,
            Err(err) => return rejected(err),
        };
        let action = match command {
            Command::Help => {
                return InterceptOutcome::Help {
                    text: self.parser.help_text().to_string(),
                }
            }
            Command::Action(action) => action,
        };

        debug!(tab = %self.tab, %action, "submitting chat command");
        let timeout = self.config.chat_timeout(&action);
        let message = CommandMessage::ChatCommand {
            action,
            source: self.platform,
        };
        let result = match self
            .bridge
            .invoke(Endpoint::Tab(self.tab), Target::Background, message, timeout)
            .await
        {
            Ok(result) => result,
            Err(err) => ActionResult::from(PipelineError::from(err)),
        };
        InterceptOutcome::Executed { result }
    }
}

fn rejected(err: ParseError) -> InterceptOutcome {
    warn!(error = %err, "rejected chat command");
    InterceptOutcome::Rejected {
        result: ActionResult::failed(FailureKind::Parse, err.to_string()),
    }
}
