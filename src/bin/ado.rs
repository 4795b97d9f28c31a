use clap::{CommandFactory, Parser};
use std::process::ExitCode;

use ado_cli::{Cli, commands, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    let _log_guard = logging::init_logging(logging::parse_early_log_config(&raw_args));

    let cli = Cli::parse();

    if cli.command.is_none() && !cli.global.create_config {
        // Help goes to stdout; a missing command is still a usage error
        let _ = Cli::command().print_help();
        return ExitCode::FAILURE;
    }

    let output_file = cli.global.output_file.clone();
    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let message = format!("{error:#}");
            eprintln!("{}", serde_json::json!({ "error": message }));
            if let Some(path) = output_file {
                println!("ERROR: failed to write {} - {message}", path.display());
            }
            ExitCode::FAILURE
        }
    }
}
