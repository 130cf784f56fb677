//! Berth CLI - convert Docker Compose files to Kubernetes manifests

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod display;
mod error;
mod exit_codes;
mod input;
mod logger;

use commands::convert::ConvertArgs;
use input::DEFAULT_MAX_INPUT_SIZE;

#[derive(Parser)]
#[command(name = "berth")]
#[command(author = "Berth Contributors")]
#[command(version)]
#[command(about = "Convert Docker Compose files to Kubernetes manifests", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a compose file to Kubernetes manifests
    Convert(ConvertArgs),

    /// Check that a compose file parses
    Validate {
        /// Compose file, or `-` for stdin
        file: PathBuf,

        /// Content type of the input document
        #[arg(short = 't', long = "type", default_value = "docker-compose")]
        content_type: String,

        /// Output validation results as JSON
        #[arg(long)]
        json: bool,

        /// Maximum input size in bytes
        #[arg(long = "max-size", env = "BERTH_MAX_INPUT_SIZE", default_value_t = DEFAULT_MAX_INPUT_SIZE)]
        max_size: u64,
    },

    /// List the supported input types
    Types {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also arrive here, on stdout
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    logger::init(cli.debug);

    let outcome = match &cli.command {
        Commands::Convert(args) => commands::convert::run(args),
        Commands::Validate {
            file,
            content_type,
            json,
            max_size,
        } => commands::validate::run(file, content_type, *json, *max_size),
        Commands::Types { json } => commands::types::run(*json),
    };

    let code = match outcome {
        Ok(code) => code,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}
