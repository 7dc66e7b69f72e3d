use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    listnorm::logging::init().context("init logging")?;

    let cli = listnorm::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        listnorm::cli::Command::Normalize(args) => {
            listnorm::normalize::run(args).context("normalize")?;
        }
        listnorm::cli::Command::Platforms(args) => {
            listnorm::platforms::run(args).context("platforms")?;
        }
    }

    Ok(())
}
