use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pgs_match::cli;
use pgs_match::matching::MatchError;
use pgs_match::parsing::ParseError;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("pgs_match=debug,info")
    } else {
        EnvFilter::new("pgs_match=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let result = match cli.command {
        cli::Commands::Match(args) => cli::match_variants::run(args, cli.format, cli.verbose),
        cli::Commands::Combine(args) => cli::combine::run(args, cli.format, cli.verbose),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Exit code taxonomy used by workflow managers to tell failures apart
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<MatchError>() {
        e.exit_code()
    } else if let Some(e) = err.downcast_ref::<ParseError>() {
        e.exit_code()
    } else {
        1
    }
}
