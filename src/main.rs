//! ocitools - CLI entry point

mod commands;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use ocitools::cli::{Cli, Commands, ConfigCommands};
use ocitools::{ConfigError, ExtractError};

/// Exit status for input and configuration problems.
const EXIT_CONFIG: u8 = 2;

#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse();
    ocitools::logging::init(cli.global.verbose, cli.global.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            exit_code_for(&err)
        }
    }
}

#[cfg(not(tarpaulin_include))]
fn run(cli: Cli) -> Result<()> {
    let global = &cli.global;
    match cli.command {
        Commands::Audit(args) => commands::audit::handle(global, &args),
        Commands::Compartments(args) => commands::compartments::handle(global, &args),
        Commands::ToCsv { input, output } => {
            commands::to_csv::handle(&input, &output, global.quiet)
        }
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(global),
            ConfigCommands::Path => commands::config::handle_path(global),
            ConfigCommands::Init {
                tenancy,
                region,
                force,
            } => commands::config::handle_init(global, &tenancy, &region, force),
        },
        Commands::Completions { shell } => commands::completions::handle::<Cli>(shell),
    }
}

/// Configuration errors exit with 2, everything else with 1.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    let is_config = err.chain().any(|cause| {
        cause.downcast_ref::<ConfigError>().is_some()
            || cause
                .downcast_ref::<ExtractError>()
                .is_some_and(ExtractError::is_configuration)
    });
    if is_config {
        ExitCode::from(EXIT_CONFIG)
    } else {
        ExitCode::FAILURE
    }
}
