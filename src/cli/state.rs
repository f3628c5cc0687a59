use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::output::{print_structured, OutputFormat};
use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct StateArgs {
    /// State file (defaults to `state_path` from the configuration)
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Show at most this many entries, newest last
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn cmd_history(args: StateArgs, ctx: &CliContext, format: &OutputFormat) -> Result<()> {
    let state = ctx.open_state(args.state.as_ref())?;
    let mut history = state.history();
    if let Some(limit) = args.limit {
        let skip = history.len().saturating_sub(limit);
        history.drain(..skip);
    }
    if print_structured(format, &history)? {
        return Ok(());
    }
    if history.is_empty() {
        println!("No actions recorded yet");
    }
    for entry in &history {
        println!(
            "{}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.text
        );
    }
    Ok(())
}

pub fn cmd_selectors(args: StateArgs, ctx: &CliContext, format: &OutputFormat) -> Result<()> {
    let state = ctx.open_state(args.state.as_ref())?;
    let selectors = state.selectors();
    if print_structured(format, &selectors)? {
        return Ok(());
    }
    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "(not set)".to_string());
    println!("input:  {}", show(&selectors.custom_input_selector));
    println!("output: {}", show(&selectors.custom_output_selector));
    Ok(())
}
