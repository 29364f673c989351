//! osc: command-line client for S3-compatible object stores

mod commands;
mod exit_code;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::GlobalArgs;
use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

/// List buckets and upload objects to S3-compatible storage
#[derive(Parser, Debug)]
#[command(name = "osc", version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all buckets visible to the current credentials
    ListBuckets(commands::list_buckets::ListBucketsArgs),

    /// Upload a file (or stdin) as a single object and confirm it is visible
    Upload(commands::upload::UploadArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    let output_config = OutputConfig {
        json: cli.global.json,
        no_color: cli.global.no_color,
        quiet: cli.global.quiet,
    };

    let code = match cli.command {
        Commands::ListBuckets(args) => {
            commands::list_buckets::execute(args, &cli.global, output_config).await
        }
        Commands::Upload(args) => commands::upload::execute(args, &cli.global, output_config).await,
        Commands::Completions(args) => commands::completions::execute(args),
    };

    std::process::exit(code.as_i32());
}
