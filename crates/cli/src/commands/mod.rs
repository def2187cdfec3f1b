//! Command implementations.

pub mod config;
pub mod run;
pub mod store;

use crate::cli::{Cli, Commands};
use crate::context::CommandContext;
use crate::error::Result;

/// Runs the parsed command line.
pub async fn dispatch(cli: Cli) -> Result<()> {
	let ctx = CommandContext::from_cli(&cli);
	let format = cli.format;
	match cli.command {
		Commands::Run(args) => run::execute(args, &ctx, format).await,
		Commands::Config { action } => config::execute(action, &ctx, format),
		Commands::Store(args) => store::execute(args, &ctx, format),
	}
}
