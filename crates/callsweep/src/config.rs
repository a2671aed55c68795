//! Configuration file support for callsweep.
//!
//! Settings merge from three layers: command-line flags win, then a
//! `callsweep.toml` file, and anything still missing is prompted for.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use callsweep_api::Credential;

/// The config file name
pub const CONFIG_FILE_NAME: &str = "callsweep.toml";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub credentials: CredentialSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ServiceSection {
    /// Base URL of the service API
    pub base_url: Option<String>,
    /// Request timeout, e.g. "45s"
    #[serde(default, with = "humantime_serde::option")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CredentialSection {
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Load the config file.
///
/// An explicit path must exist. Otherwise the working directory and the
/// user config directory are tried in turn, and no file at all is fine.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = discover(explicit)? else {
        return Ok(FileConfig::default());
    };
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

fn discover(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file {} does not exist", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    if let Some(dir) = dirs::config_dir() {
        let shared = dir.join("callsweep").join(CONFIG_FILE_NAME);
        if shared.exists() {
            return Ok(Some(shared));
        }
    }

    Ok(None)
}

/// Fully resolved runtime settings.
pub struct Settings {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub credential: Credential,
}

impl Settings {
    /// Merge flags over file values and prompt for whatever is missing.
    pub fn resolve(
        service_url: Option<String>,
        user: Option<String>,
        password: Option<String>,
        file: FileConfig,
    ) -> Result<Self> {
        let base_url = match service_url.or(file.service.base_url) {
            Some(url) => url,
            None => dialoguer::Input::<String>::new()
                .with_prompt("Service URL")
                .interact_text()
                .context("A service URL is required")?,
        };
        let username = match user.or(file.credentials.user) {
            Some(user) => user,
            None => dialoguer::Input::<String>::new()
                .with_prompt("User")
                .interact_text()
                .context("A user is required")?,
        };
        let password = match password.or(file.credentials.password) {
            Some(password) => password,
            None => dialoguer::Password::new()
                .with_prompt("Password")
                .interact()
                .context("A password is required")?,
        };

        Ok(Self {
            base_url,
            timeout: file.service.timeout,
            credential: Credential { username, password },
        })
    }
}
