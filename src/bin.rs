use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nodebook::{create_config, generate_site, inspect, Cli, Command, Error, Routines};

// -------------------------------------------------------------------------------------------------

fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    // RUST_LOG wins over the verbosity flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nodebook={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn report_error(err: &Error) {
    tracing::error!("{err}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        tracing::error!("  caused by: {cause}");
        source = cause.source();
    }
    if let Error::Backends(errors) = err {
        errors.iter().for_each(report_error);
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let routines = Routines::default();
    match &cli.command {
        Command::Build(options) => {
            let report = generate_site(options, &routines)?;
            tracing::info!(
                "Site with {} pages written by {}",
                report.pages,
                report.backends.join(", ")
            );
        }
        Command::Info(options) => {
            let info = inspect(options, &routines)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::CreateConfig(options) => {
            print!("{}", create_config(options, &routines)?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}
