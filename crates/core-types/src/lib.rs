use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

/// Shared error type for port implementations that have no richer taxonomy.
#[derive(Debug, Error, Clone)]
pub enum TaxyError {
    #[error("{message}")]
    Message { message: String },
}

impl TaxyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Browser tab hosting a page context.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Pairs one cross-context request with its single reply.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which chat field an area selection targets.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SelectionType {
    Input,
    Output,
}

impl SelectionType {
    /// Key under which the committed selector is persisted.
    pub fn storage_key(self) -> &'static str {
        match self {
            SelectionType::Input => "customInputSelector",
            SelectionType::Output => "customOutputSelector",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SelectionType::Input => "input",
            SelectionType::Output => "output",
        }
    }
}

impl FromStr for SelectionType {
    type Err = TaxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" => Ok(SelectionType::Input),
            "output" => Ok(SelectionType::Output),
            other => Err(TaxyError::new(format!("unknown selection type '{other}'"))),
        }
    }
}

/// UI language. Drives command prefixes and action labels.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Locale {
    #[default]
    En,
    Pl,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Pl => "pl",
        }
    }

    /// Prefixes that mark chat text as a command, longest first.
    pub fn command_prefixes(self) -> &'static [&'static str] {
        match self {
            Locale::En => &["/taxy"],
            Locale::Pl => &["/taksówka", "/taxy"],
        }
    }
}

impl FromStr for Locale {
    type Err = TaxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "pl" | "polish" => Ok(Locale::Pl),
            other => Err(TaxyError::new(format!("unsupported locale '{other}'"))),
        }
    }
}

/// Chat site the command text was typed into.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "UPPERCASE"))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ChatPlatform {
    ChatGpt,
    Bard,
    Claude,
    Perplexity,
    #[default]
    Generic,
}

impl ChatPlatform {
    pub fn from_hostname(hostname: &str) -> Self {
        let host = hostname.trim().to_ascii_lowercase();
        let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));
        if matches("chat.openai.com") || matches("chatgpt.com") {
            ChatPlatform::ChatGpt
        } else if matches("bard.google.com") {
            ChatPlatform::Bard
        } else if matches("claude.ai") {
            ChatPlatform::Claude
        } else if matches("perplexity.ai") {
            ChatPlatform::Perplexity
        } else {
            ChatPlatform::Generic
        }
    }

    /// Default selector of the chat input box on this platform.
    pub fn input_selector(self) -> &'static str {
        match self {
            ChatPlatform::ChatGpt => r#"textarea[data-id="root"]"#,
            ChatPlatform::Bard => r#"textarea[aria-label*="Prompt"]"#,
            ChatPlatform::Claude => r#"[contenteditable="true"]"#,
            ChatPlatform::Perplexity => r#"textarea[placeholder*="Ask"]"#,
            ChatPlatform::Generic => "textarea, input[type=\"text\"], [contenteditable=\"true\"]",
        }
    }
}

impl fmt::Display for ChatPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatPlatform::ChatGpt => "CHATGPT",
            ChatPlatform::Bard => "BARD",
            ChatPlatform::Claude => "CLAUDE",
            ChatPlatform::Perplexity => "PERPLEXITY",
            ChatPlatform::Generic => "GENERIC",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_detection_matches_subdomains() {
        assert_eq!(
            ChatPlatform::from_hostname("chat.openai.com"),
            ChatPlatform::ChatGpt
        );
        assert_eq!(ChatPlatform::from_hostname("www.claude.ai"), ChatPlatform::Claude);
        assert_eq!(ChatPlatform::from_hostname("notclaude.ai"), ChatPlatform::Generic);
        assert_eq!(ChatPlatform::from_hostname("example.org"), ChatPlatform::Generic);
    }

    #[test]
    fn selection_type_storage_keys() {
        assert_eq!(SelectionType::Input.storage_key(), "customInputSelector");
        assert_eq!(SelectionType::Output.storage_key(), "customOutputSelector");
        assert_eq!("OUTPUT".parse::<SelectionType>().unwrap(), SelectionType::Output);
    }

    #[test]
    fn polish_locale_accepts_both_prefixes() {
        let prefixes = Locale::Pl.command_prefixes();
        assert!(prefixes.contains(&"/taxy"));
        assert!(prefixes.contains(&"/taksówka"));
        assert_eq!("PL".parse::<Locale>().unwrap(), Locale::Pl);
    }
}
