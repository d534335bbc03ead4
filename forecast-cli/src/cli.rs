use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, LookupQuery, ProviderId, Session, SettlePolicy, View,
    provider::{default_provider_from_config, relay::DEFAULT_RELAY_ENDPOINT},
};
use inquire::{Confirm, Password, Text};
use tracing::debug;

use crate::{render, watch};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Debounced weather lookup")]
pub struct Cli {
    /// Read and write this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Provider for this run: "relay" or "weatherapi".
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Endpoint URL override for this run.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Quiet period in milliseconds before typed input is looked up.
    #[arg(long, global = true)]
    pub debounce_ms: Option<u64>,

    /// Drop results of lookups that were superseded by newer ones.
    #[arg(long, global = true)]
    pub latest_wins: bool,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure a provider (API key or endpoint) and optionally make it the default.
    Configure {
        /// Provider short name, "relay" or "weatherapi".
        provider: String,
    },

    /// Look up one location immediately and print the result.
    Show {
        /// Location name, e.g. "Madrid".
        query: String,
    },

    /// Interactive form: each line replaces the query, lookups are debounced.
    Watch,

    /// Print the path of the config file in use.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => Config::config_file_path()?,
        };
        let config = Config::load_from(&config_path)?;
        debug!(path = %config_path.display(), "config loaded");

        match &self.command {
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;
                configure(id, config, &config_path)
            }
            Command::Show { query } => {
                let config = self.apply_overrides(config)?;
                show(&config, query).await
            }
            Command::Watch => {
                let config = self.apply_overrides(config)?;
                let provider = default_provider_from_config(&config)?;
                watch::run(provider, config.form_settings()).await
            }
            Command::ConfigPath => {
                println!("{}", config_path.display());
                Ok(())
            }
        }
    }

    /// Fold one-off command-line flags into the loaded config. Nothing is saved.
    fn apply_overrides(&self, mut config: Config) -> anyhow::Result<Config> {
        if let Some(provider) = &self.provider {
            config.set_default_provider(ProviderId::try_from(provider.as_str())?);
        }
        if let Some(endpoint) = &self.endpoint {
            let id = config.default_provider_id()?;
            config.upsert_provider_endpoint(id, endpoint.clone());
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = Some(ms);
        }
        if self.latest_wins {
            config.settle_policy = Some(SettlePolicy::LatestIssued);
        }
        Ok(config)
    }
}

fn configure(id: ProviderId, mut config: Config, path: &std::path::Path) -> anyhow::Result<()> {
    match id {
        ProviderId::WeatherApi => {
            let api_key = Password::new("WeatherAPI.com API key:")
                .without_confirmation()
                .prompt()
                .context("Failed to read API key")?;
            if api_key.trim().is_empty() {
                return Err(anyhow!("API key must not be empty"));
            }
            config.upsert_provider_api_key(id, api_key.trim().to_string());
        }
        ProviderId::Relay => {
            let current = config.provider_endpoint(id).unwrap_or(DEFAULT_RELAY_ENDPOINT);
            let endpoint = Text::new("Relay endpoint:")
                .with_default(current)
                .prompt()
                .context("Failed to read endpoint")?;
            config.upsert_provider_endpoint(id, endpoint.trim().to_string());
        }
    }

    let make_default = Confirm::new(&format!("Use '{id}' as the default provider?"))
        .with_default(true)
        .prompt()
        .context("Failed to read confirmation")?;
    if make_default {
        config.set_default_provider(id);
    }

    config.save_to(path)?;
    println!("Saved configuration for '{id}' to {}", path.display());
    Ok(())
}

async fn show(config: &Config, query: &str) -> anyhow::Result<()> {
    if LookupQuery::new(query).is_empty() {
        return Err(anyhow!("Location must not be empty"));
    }

    let provider = default_provider_from_config(config)?;
    let (session, handle) = Session::with_query(provider, config.form_settings(), query);
    let mut snapshots = session.subscribe();
    let task = session.spawn();

    handle.submit()?;
    let state = snapshots
        .wait_for(|s| s.last_issued().is_some() && !s.is_loading())
        .await
        .context("Form session ended before the lookup settled")?
        .clone();

    handle.teardown()?;
    task.await.context("Form session task failed")?;

    match View::of(&state) {
        View::Failed { message, .. } => Err(anyhow!("{message}")),
        view => {
            print!("{}", render::render(view));
            Ok(())
        }
    }
}
