use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use git_next_version::cli::orchestration::{log_filter, run};
use git_next_version::cli::Cli;
use git_next_version::ui;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(&cli.log_level))
        .with_writer(std::io::stderr)
        .finish();

    match tracing::subscriber::with_default(subscriber, || execute(&cli)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}

fn execute(cli: &Cli) -> Result<u8> {
    let status = run(cli)?;
    Ok(status.exit_code())
}
