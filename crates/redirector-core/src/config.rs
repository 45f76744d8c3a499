//! Service configuration parsed from `redirector.toml`
//!
//! ```toml
//! managed_folder_id = "5"
//!
//! [remote]
//! api_base = "https://api.box.com/2.0"
//! access_token = "..."
//!
//! [webhook]
//! primary_key = "..."
//! secondary_key = "..."
//!
//! [manifest]
//! path = "manifest.toml"
//! page_size = 100
//!
//! [server]
//! listen = "127.0.0.1:8080"
//! sweep_interval_secs = 3600
//! ```
//!
//! Secrets are usually left out of the file and supplied through the
//! environment by the server binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::manifest::DEFAULT_SCAN_PAGE_SIZE;
use crate::webhook::SigningKeys;
use crate::{Error, Result};

fn default_api_base() -> String {
    "https://api.box.com/2.0".to_string()
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("manifest.toml")
}

fn default_page_size() -> usize {
    DEFAULT_SCAN_PAGE_SIZE
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

/// Remote content store connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSection {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bearer token for API calls
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            access_token: None,
        }
    }
}

/// Webhook signing keys
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookSection {
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub secondary_key: Option<String>,
}

/// Manifest table location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSection {
    #[serde(default = "default_manifest_path")]
    pub path: PathBuf,

    /// Entries per scan page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ManifestSection {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
            page_size: default_page_size(),
        }
    }
}

/// HTTP surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Run a full sweep on this interval; no scheduled sweeps when unset
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            sweep_interval_secs: None,
        }
    }
}

/// Full service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Id of the folder whose subtree is tracked
    pub managed_folder_id: String,

    #[serde(default)]
    pub remote: RemoteSection,

    #[serde(default)]
    pub webhook: WebhookSection,

    #[serde(default)]
    pub manifest: ManifestSection,

    #[serde(default)]
    pub server: ServerSection,
}

impl Config {
    /// Parse configuration from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use redirector_core::Config;
    ///
    /// let config = Config::parse(r#"
    /// managed_folder_id = "5"
    ///
    /// [webhook]
    /// primary_key = "k1"
    /// "#).unwrap();
    ///
    /// assert_eq!(config.managed_folder_id, "5");
    /// assert_eq!(config.manifest.page_size, 100);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Check that everything needed to serve is present.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the first missing or invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.managed_folder_id.trim().is_empty() {
            return Err(Error::config("managed_folder_id must not be empty"));
        }
        if self.remote.access_token.as_deref().is_none_or(str::is_empty) {
            return Err(Error::config("remote.access_token is not set"));
        }
        if self.webhook.primary_key.as_deref().is_none_or(str::is_empty) {
            return Err(Error::config("webhook.primary_key is not set"));
        }
        if self.manifest.page_size == 0 {
            return Err(Error::config("manifest.page_size must be positive"));
        }
        Ok(())
    }

    /// Signing keys for inbound deliveries
    pub fn signing_keys(&self) -> Result<SigningKeys> {
        let primary = self
            .webhook
            .primary_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::config("webhook.primary_key is not set"))?;

        let keys = SigningKeys::new(primary.as_bytes());
        Ok(match self.webhook.secondary_key.as_deref() {
            Some(secondary) if !secondary.is_empty() => keys.with_secondary(secondary.as_bytes()),
            _ => keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FULL: &str = r#"
managed_folder_id = "5"

[remote]
api_base = "http://localhost:9000/2.0"
access_token = "token"

[webhook]
primary_key = "k1"
secondary_key = "k2"

[manifest]
path = "/var/lib/redirector/manifest.toml"
page_size = 25

[server]
listen = "0.0.0.0:9090"
sweep_interval_secs = 600
"#;

    #[test]
    fn full_config_parses() {
        let config = Config::parse(FULL).unwrap();

        assert_eq!(config.remote.api_base, "http://localhost:9000/2.0");
        assert_eq!(config.manifest.page_size, 25);
        assert_eq!(config.server.sweep_interval_secs, Some(600));
        config.validate().unwrap();
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::parse("managed_folder_id = \"5\"").unwrap();

        assert_eq!(config.remote.api_base, "https://api.box.com/2.0");
        assert_eq!(config.manifest.path, PathBuf::from("manifest.toml"));
        assert_eq!(config.server.listen, "127.0.0.1:8080");
        assert_eq!(config.server.sweep_interval_secs, None);
    }

    #[test]
    fn missing_secrets_fail_validation() {
        let config = Config::parse("managed_folder_id = \"5\"").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("access_token"), "got: {err}");
        assert!(config.signing_keys().is_err());
    }

    #[test]
    fn missing_folder_id_is_a_parse_error() {
        assert!(Config::parse("[server]\nlisten = \"x\"").is_err());
    }

    #[test]
    fn signing_keys_include_secondary() {
        let config = Config::parse(FULL).unwrap();
        let keys = config.signing_keys().unwrap();
        let body = b"{}";
        let signatures = crate::webhook::Signatures {
            primary: None,
            secondary: Some(crate::webhook::sign(b"k2", body)),
        };
        assert!(keys.verify(body, &signatures));
    }
}
