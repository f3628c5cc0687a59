use clap::Subcommand;

use super::config::ConfigArgs;
use super::parse::ParseArgs;
use super::run::RunArgs;
use super::state::StateArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Parse chat text and print the resulting command
    Parse(ParseArgs),

    /// Run chat commands against a page fixture
    Run(RunArgs),

    /// Show the persisted action history
    History(StateArgs),

    /// Show the stored chat selectors
    Selectors(StateArgs),

    /// Inspect the configuration
    Config(ConfigArgs),
}
