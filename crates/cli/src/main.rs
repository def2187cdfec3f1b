use clap::Parser;
use tabwright_cli::cli::Cli;
use tabwright_cli::commands;
use tabwright_cli::logging;
use tabwright_cli::output::{self, CommandResult, OutputFormat};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli).await {
		let error = err.to_command_error();
		output::print_error_stderr(&error);
		if format != OutputFormat::Text {
			output::print_result(&CommandResult::<()>::failed(command, error), format);
		}
		std::process::exit(1);
	}
}
