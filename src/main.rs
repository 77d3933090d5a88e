use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;
use toongrab::error::GrabError;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        let code = err
            .downcast_ref::<GrabError>()
            .map_or(1, GrabError::exit_code);
        return ExitCode::from(code);
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    toongrab::logging::init().context("init logging")?;

    let cli = toongrab::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        toongrab::cli::Command::Grab(args) => {
            toongrab::grab::run(args).context("grab")?;
        }
        toongrab::cli::Command::Aggregate(args) => {
            toongrab::aggregate::run(args).context("aggregate")?;
        }
        toongrab::cli::Command::MapTranslations(args) => {
            toongrab::mapping::run(args).context("map translations")?;
        }
    }

    Ok(())
}
