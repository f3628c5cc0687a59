use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;

use super::output::{print_structured, OutputFormat};
use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the configuration file location
    Path,
}

pub fn cmd_config(args: ConfigArgs, ctx: &CliContext, format: &OutputFormat) -> Result<()> {
    let path = ctx.config_path();
    match args.action {
        ConfigAction::Show => {
            if !print_structured(format, ctx.config())? {
                println!("Current configuration ({}):", path.display());
                print!("{}", serde_yaml::to_string(ctx.config())?);
            }
        }
        ConfigAction::Path => {
            let value = json!({ "path": path, "exists": path.exists() });
            if !print_structured(format, &value)? {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}
