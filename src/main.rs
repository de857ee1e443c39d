use std::process::ExitCode;

use clap::Parser;
use nestegg::api::{Cli, Command, run_command, run_serve_command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    nestegg::logging::init(&cli.log_level);

    let outcome = match cli.command {
        Command::Run(args) => run_command(args),
        Command::Serve(args) => run_serve_command(args).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            eprintln!("\n{e}\nTerminating program.");
            ExitCode::FAILURE
        }
    }
}
