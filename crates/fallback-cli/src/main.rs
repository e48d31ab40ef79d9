#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::needless_pass_by_value)]

mod commands;
mod logging;

use clap::Parser;
use commands::ResolverArgs;
use fallback_core::Config;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fallback")]
#[command(author, version, about = "Resolve #prefix# requests against prioritized fallback directories", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Resolve one or more prefixed requests
    Resolve {
        /// Requests to resolve (e.g. "#fallback#/components/Button")
        #[arg(required = true)]
        requests: Vec<String>,

        #[command(flatten)]
        resolver: ResolverArgs,
    },

    /// Check whether a request carries the fallback prefix
    Match {
        request: String,

        #[command(flatten)]
        resolver: ResolverArgs,
    },

    /// List candidate paths in probe order
    Candidates {
        /// Stripped path or prefixed request
        path: String,

        #[command(flatten)]
        resolver: ResolverArgs,
    },

    /// Explain how a request resolves, step by step
    Explain {
        request: String,

        #[command(flatten)]
        resolver: ResolverArgs,
    },

    /// Run a host request (JSON object, or "-" for stdin) through the module hook
    Rewrite {
        input: String,

        #[command(flatten)]
        resolver: ResolverArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        None | Some(Commands::Version) => commands::version::run(),
        Some(Commands::Resolve { requests, resolver }) => {
            commands::resolve::run(&config.cwd, &requests, &resolver, cli.json)
        }
        Some(Commands::Match { request, resolver }) => {
            commands::matches::run(&config.cwd, &request, &resolver, cli.json)
        }
        Some(Commands::Candidates { path, resolver }) => {
            commands::candidates::run(&config.cwd, &path, &resolver, cli.json)
        }
        Some(Commands::Explain { request, resolver }) => {
            commands::explain::run(&config.cwd, &request, &resolver, cli.json)
        }
        Some(Commands::Rewrite { input, resolver }) => {
            commands::rewrite::run(&config.cwd, &input, &resolver)
        }
    }
}
