#![deny(missing_docs)]

//! # OASRef CLI
//!
//! Command line interface for `$ref` resolution in OpenAPI documents.
//!
//! Supported Commands:
//! - `check`: Reports circular references and broken `$ref`s; exits non-zero on errors.
//! - `resolve`: Writes the document with every resolvable `$ref` substituted.

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::CliResult;

mod check;
mod error;
mod load;
mod resolve;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI $ref resolver and cycle checker")]
struct Cli {
    /// Log resolver progress (overridden by `RUST_LOG`).
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect circular references and unresolvable `$ref`s.
    Check(check::CheckArgs),
    /// Substitute every resolvable `$ref` and print the result.
    Resolve(resolve::ResolveArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: &Cli) -> CliResult<bool> {
    let mut stdout = io::stdout().lock();
    match &cli.command {
        Commands::Check(args) => check::execute(args, &mut stdout),
        Commands::Resolve(args) => resolve::execute(args, &mut stdout),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::from(2)
        }
    }
}
