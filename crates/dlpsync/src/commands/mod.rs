pub mod sync;
pub mod tenants;
pub mod util;

use clap::CommandFactory;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Route a parsed command line to its handler. No subcommand means sync.
pub async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Neither touches the network
        Some(Command::Tenants) => tenants::handle(&cli.global),
        Some(Command::Completions(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "dlpsync", &mut std::io::stdout());
            Ok(())
        }

        None => {
            tracing::debug!(mode = ?cli.sync.mode(), "dispatching sync");
            sync::handle(&cli.sync, &cli.global).await
        }
    }
}
