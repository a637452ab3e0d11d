//! Configuration loading for livelog.
//!
//! Configuration is read from a TOML file (default: `livelog.toml` in the
//! platform config directory). Every table and key is optional, and command
//! line flags override what the file says.

use anyhow::{Context, Result};
use livelog_client::{BufferFormat, CoreContext};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration for livelog.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Where the core lives.
    #[serde(default)]
    pub core: CoreConfig,
    /// Credentials.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Buffer endpoint settings.
    #[serde(default)]
    pub buffer: BufferConfig,
}

/// Core server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoreConfig {
    /// Host name or IP address (default: localhost).
    #[serde(default = "default_address")]
    pub address: String,
    /// Port (default: 16662).
    #[serde(default = "default_port")]
    pub port: u16,
    /// API version path segment (default: v1).
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Use https/wss (default: false).
    #[serde(default)]
    pub tls: bool,
}

/// Credentials.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthConfig {
    /// Bearer token.
    pub token: Option<String>,
}

/// Buffer endpoint configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BufferConfig {
    /// Element format returned by the buffer endpoint (default: envelopes).
    #[serde(default)]
    pub format: BufferFormat,
}

// Default value functions
fn default_address() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    16662
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            api_version: default_api_version(),
            tls: false,
        }
    }
}

/// Values given on the command line. `None` leaves the file value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--address`
    pub address: Option<String>,
    /// `--port`
    pub port: Option<u16>,
    /// `--api-version`
    pub api_version: Option<String>,
    /// `--tls`
    pub tls: bool,
    /// `--token`
    pub token: Option<String>,
    /// `--buffer-format`
    pub buffer_format: Option<BufferFormat>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load the file named on the command line, or the default file if it
    /// exists, or fall back to defaults.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path).await;
        }
        match default_config_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_file(&path).await
            }
            _ => Ok(Self::default()),
        }
    }

    /// Apply command line overrides.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(address) = overrides.address {
            self.core.address = address;
        }
        if let Some(port) = overrides.port {
            self.core.port = port;
        }
        if let Some(api_version) = overrides.api_version {
            self.core.api_version = api_version;
        }
        if overrides.tls {
            self.core.tls = true;
        }
        if let Some(token) = overrides.token {
            self.auth.token = Some(token);
        }
        if let Some(format) = overrides.buffer_format {
            self.buffer.format = format;
        }
    }

    /// Connection context for this configuration. Not ready, no principal.
    pub fn context(&self) -> CoreContext {
        CoreContext::new(&self.core.address, self.core.port)
            .with_api_version(&self.core.api_version)
            .with_tls(self.core.tls)
            .with_token(self.auth.token.as_deref().unwrap_or_default())
    }
}

/// Default config file location for livelog.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "livelog", "livelog")
        .map(|dirs| dirs.config_dir().join("livelog.toml"))
}
