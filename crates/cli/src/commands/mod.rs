//! Command implementations
//!
//! Each command builds its own client from the loaded configuration plus the
//! global flags, runs one operation and maps the outcome to an exit code.

pub mod completions;
pub mod list_buckets;
pub mod upload;

use anyhow::Context;
use clap::Args;
use osc_core::{Config, ConfigManager};
use osc_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Flags accepted by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Custom endpoint for S3-compatible services
    #[arg(long, global = true, env = "OSC_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Region to sign requests for
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Use path-style addressing (endpoint/bucket/key)
    #[arg(long, global = true)]
    pub path_style: bool,
}

/// Load the config file and apply flag overrides
pub fn load_config(global: &GlobalArgs) -> anyhow::Result<Config> {
    let manager = ConfigManager::new().context("Failed to locate config directory")?;
    let mut config = manager
        .load()
        .with_context(|| format!("Failed to load {}", manager.config_path().display()))?;

    if let Some(endpoint) = &global.endpoint {
        config.store.endpoint = Some(endpoint.clone());
    }
    if let Some(region) = &global.region {
        config.store.region = Some(region.clone());
    }
    if global.path_style {
        config.store.force_path_style = true;
    }

    config.validate().context("Invalid configuration")?;
    tracing::debug!(path = %manager.config_path().display(), "Loaded configuration");
    Ok(config)
}

/// Load configuration and connect to the store, reporting failures
pub async fn setup(
    global: &GlobalArgs,
    formatter: &Formatter,
) -> Result<(Config, S3Client), ExitCode> {
    let config = match load_config(global) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return Err(ExitCode::UsageError);
        }
    };

    match S3Client::new(&config.store).await {
        Ok(client) => Ok((config, client)),
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            Err(ExitCode::GeneralError)
        }
    }
}
