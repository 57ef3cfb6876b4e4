//! Steward worker binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::sync::Arc;
use steward_core::config::AppConfig;
use steward_core::{SiteName, UserId};
use steward_lifecycle::Lifecycle;
use steward_worker::{CreateCommand, JobIntake};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Steward - site lifecycle worker
#[derive(Parser, Debug)]
#[command(name = "stewardd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "STEWARD_CONFIG",
        default_value = "config/worker.toml"
    )]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Provision a site: create and configure its bucket, issue its first key
    Provision {
        /// Site name (path-safe form or bucket domain)
        #[arg(long)]
        site: String,
        /// Requesting user id
        #[arg(long)]
        user: String,
    },
    /// Rotate every site's access key, migrating credential-keyed data
    RotateKeys,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Steward v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    // Check for STEWARD_ environment variables (excluding STEWARD_CONFIG which is just the path)
    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("STEWARD_") && key != "STEWARD_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: stewardd --config /path/to/config.toml <command>\n  \
             2. Environment variables: STEWARD_COORDINATION__TYPE=sqlite \
             STEWARD_COORDINATION__PATH=/var/lib/steward/coordination.db stewardd <command>\n\n\
             See config/worker.example.toml for example configuration.\n\
             Set STEWARD_CONFIG env var to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("STEWARD_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Initialize the coordination store
    let store = steward_coordination::from_config(&config.coordination)
        .await
        .context("failed to initialize coordination store")?;
    store
        .health_check()
        .await
        .context("coordination store health check failed")?;
    tracing::info!("Coordination store initialized");

    // Initialize the storage gateway
    let gateway = steward_gateway::from_config(&config.gateway)
        .await
        .context("failed to initialize storage gateway")?;
    gateway
        .health_check()
        .await
        .context("storage gateway health check failed")?;
    tracing::info!(backend = gateway.backend_name(), "Storage gateway initialized");

    let lifecycle = Arc::new(Lifecycle::new(
        store.clone(),
        gateway,
        config.worker.clone(),
    ));
    let intake = JobIntake::new(lifecycle, store);

    let status = match args.command {
        Command::Provision { site, user } => {
            let command = CreateCommand {
                site_name: SiteName::from_bucket(&site)?,
                user_id: UserId::parse(&user)?,
            };
            intake.handle_create(command).await
        }
        Command::RotateKeys => {
            let outcome = intake.handle_rotate().await;
            for record in &outcome.records {
                tracing::info!(
                    site = %record.site_name,
                    skipped = record.skipped(),
                    migrated = ?record.migrated_data,
                    removed_old = ?record.removed_old_data,
                    key_set = ?record.new_key_set,
                    "rotation record"
                );
            }
            outcome.status
        }
    };

    if !status.is_success() {
        anyhow::bail!("job finished with status {status:?}");
    }
    Ok(())
}
