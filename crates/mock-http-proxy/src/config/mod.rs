//! Configuration types for the mock server.
//!
//! Values come from an optional YAML file and are then overridden by
//! command-line flags (see `main.rs`).

mod listen;
mod pool;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub use listen::{resolve_address, DEFAULT_ADDRESS};
pub use pool::ConnectionPoolConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Directory holding one mock definition per file
    #[serde(default = "default_definitions_dir")]
    pub definitions: PathBuf,

    /// Listen address, `host:port` or a bare port
    #[serde(default = "default_address")]
    pub address: String,

    /// Enables operator-facing diagnostics (never changes responses)
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub connection_pool: ConnectionPoolConfig,

    /// Skip TLS certificate verification for proxied HTTPS origins (dev/test only)
    #[serde(default)]
    pub tls_skip_verify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            definitions: default_definitions_dir(),
            address: default_address(),
            debug: false,
            connection_pool: ConnectionPoolConfig::default(),
            tls_skip_verify: false,
        }
    }
}

/// `<home>/.mock-http/definitions`, or a relative path when no home directory exists.
pub fn default_definitions_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mock-http")
        .join("definitions")
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.socket_addr()?;

        if self.connection_pool.connect_timeout_secs == 0 {
            anyhow::bail!("connection_pool.connect_timeout_secs must be greater than zero");
        }

        Ok(())
    }

    /// The address the listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        resolve_address(&self.address)
    }

    /// Create the definitions directory (and parents) if it does not exist.
    pub fn ensure_definitions_dir(&self) -> Result<(), anyhow::Error> {
        std::fs::create_dir_all(&self.definitions).with_context(|| {
            format!(
                "failed to create definitions directory {}",
                self.definitions.display()
            )
        })
    }
}
