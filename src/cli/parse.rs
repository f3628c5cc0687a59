use anyhow::Result;
use clap::Args;
use command_parser::{CommandParser, UnknownActionPolicy};
use serde_json::json;
use taxy_core_types::{Locale, TaxyError};

use super::output::{print_structured, OutputFormat};
use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ParseArgs {
    /// Chat text, e.g. `/taxy click "#submit"`
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Command language (overrides the configuration)
    #[arg(long, value_parser = parse_locale)]
    pub locale: Option<Locale>,

    /// Report unknown action names instead of treating them as automation
    #[arg(long)]
    pub reject_unknown: bool,
}

fn parse_locale(value: &str) -> Result<Locale, TaxyError> {
    value.parse()
}

/// Prints the parsed command. Malformed commands print the error and exit
/// non-zero; text that is not a command prints `null`.
pub fn cmd_parse(args: ParseArgs, ctx: &CliContext, format: &OutputFormat) -> Result<()> {
    let mut config = ctx.config().parser();
    if let Some(locale) = args.locale {
        config.locale = locale;
    }
    if args.reject_unknown {
        config.unknown_action = UnknownActionPolicy::Reject;
    }
    let parser = CommandParser::new(config);
    let text = args.text.join(" ");

    let command = parser.parse(&text)?;
    let value = json!({ "text": text, "command": command });
    let format = match format {
        OutputFormat::Human => &OutputFormat::Json,
        other => other,
    };
    print_structured(format, &value)?;
    Ok(())
}
