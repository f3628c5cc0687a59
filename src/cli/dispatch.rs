use super::config::cmd_config;
use super::env::CliArgs;
use super::parse::cmd_parse;
use super::run::cmd_run;
use super::state::{cmd_history, cmd_selectors};
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Parse(args) => cmd_parse(args, ctx, &cli.output),
        Commands::Run(args) => cmd_run(args, ctx, &cli.output).await,
        Commands::History(args) => cmd_history(args, ctx, &cli.output),
        Commands::Selectors(args) => cmd_selectors(args, ctx, &cli.output),
        Commands::Config(args) => cmd_config(args, ctx, &cli.output),
    }
}
