//! Chat command parsing.
//!
//! Turns text such as `/taxy type "#q" hello` into an [`Action`]. Text that
//! does not start with a command prefix of the configured locale is not a
//! command and parses to `Ok(None)`.

pub mod errors;
mod extract;
pub mod grammar;
mod help;
pub mod types;

pub use errors::ParseError;
pub use extract::DEFAULT_SCROLL_AMOUNT;
pub use help::help_text;
pub use types::{Command, ParserConfig, UnknownActionPolicy};

use action_primitives::Action;
use taxy_core_types::{ChatPlatform, Locale};
use tracing::debug;

use crate::grammar::{parse_arguments, split_action, strip_prefix};

#[derive(Debug, Clone, Default)]
pub struct CommandParser {
    config: ParserConfig,
}

impl CommandParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn with_locale(locale: Locale) -> Self {
        Self::new(ParserConfig {
            locale,
            ..ParserConfig::default()
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn locale(&self) -> Locale {
        self.config.locale
    }

    /// Command body after the locale prefix, if `text` is a command.
    fn remainder<'a>(&self, text: &'a str) -> Option<&'a str> {
        let text = text.trim();
        self.config
            .locale
            .command_prefixes()
            .iter()
            .find_map(|prefix| strip_prefix(text, prefix))
    }

    pub fn is_command(&self, text: &str) -> bool {
        self.remainder(text).is_some()
    }

    pub fn parse(&self, text: &str) -> Result<Option<Command>, ParseError> {
        let Some(remainder) = self.remainder(text) else {
            return Ok(None);
        };
        let command = self.parse_body(remainder)?;
        debug!(?command, "parsed chat command");
        Ok(Some(command))
    }

    /// Parses a command without its prefix, e.g. `click #go`.
    pub fn parse_body(&self, remainder: &str) -> Result<Command, ParseError> {
        let (name, body) = split_action(remainder).ok_or(ParseError::MissingAction)?;

        let build = match name.as_str() {
            "help" => return Ok(Command::Help),
            "click" => extract::click,
            "type" => extract::type_text,
            "navigate" | "goto" => extract::navigate,
            "scroll" => extract::scroll,
            "drag" => extract::drag,
            "wait" => extract::wait,
            "screenshot" => extract::screenshot,
            "test" | "test-selector" => extract::test_selector,
            "automate" => extract::automate,
            _ => return self.unknown(name, remainder),
        };
        let arguments = parse_arguments(body)?;
        build(&arguments).map(Command::Action)
    }

    fn unknown(&self, name: String, remainder: &str) -> Result<Command, ParseError> {
        match self.config.unknown_action {
            UnknownActionPolicy::Automate => {
                debug!(action = %name, "unknown action, treating command as automation");
                Ok(Command::Action(Action::Automate {
                    instruction: remainder.trim().to_string(),
                }))
            }
            UnknownActionPolicy::Reject => Err(ParseError::UnknownAction(name)),
        }
    }

    pub fn help_text(&self) -> &'static str {
        help_text(self.config.locale)
    }
}

/// Chat platform of the page the command was typed into.
pub fn identify_platform(hostname: &str) -> ChatPlatform {
    ChatPlatform::from_hostname(hostname)
}
