//! Command-line arguments and their overrides on the config file

use std::path::PathBuf;

use clap::Parser;
use redirector_core::Config;

/// Keeps a shared-link download manifest in sync with the remote store
#[derive(Debug, Parser)]
#[command(name = "redirector-server")]
#[command(version)]
pub struct Args {
    /// Configuration file
    #[arg(short, long, env = "REDIRECTOR_CONFIG", default_value = "redirector.toml")]
    pub config: PathBuf,

    /// Listen address, overriding `server.listen`
    #[arg(long)]
    pub listen: Option<String>,

    /// Remote API bearer token
    #[arg(long, env = "REDIRECTOR_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Primary webhook signing key
    #[arg(long, env = "REDIRECTOR_WEBHOOK_PRIMARY_KEY", hide_env_values = true)]
    pub webhook_primary_key: Option<String>,

    /// Secondary webhook signing key
    #[arg(long, env = "REDIRECTOR_WEBHOOK_SECONDARY_KEY", hide_env_values = true)]
    pub webhook_secondary_key: Option<String>,

    /// Run one full sweep, print its report as JSON and exit
    #[arg(long)]
    pub once: bool,
}

impl Args {
    /// Apply command-line and environment values on top of `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(listen) = &self.listen {
            config.server.listen = listen.clone();
        }
        if let Some(token) = &self.access_token {
            config.remote.access_token = Some(token.clone());
        }
        if let Some(key) = &self.webhook_primary_key {
            config.webhook.primary_key = Some(key.clone());
        }
        if let Some(key) = &self.webhook_secondary_key {
            config.webhook.secondary_key = Some(key.clone());
        }
    }

    /// Load the config file and apply overrides
    pub fn load_config(&self) -> redirector_core::Result<Config> {
        let mut config = Config::load(&self.config)?;
        self.apply(&mut config);
        Ok(config)
    }
}
