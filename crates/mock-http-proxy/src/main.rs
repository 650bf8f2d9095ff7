//! mock-http-proxy
//!
//! Usage:
//!   mock-http-proxy [--definitions DIR] [--address HOST:PORT] [--debug]
//!
//! Point an HTTP client's proxy setting at the listen address. Requests that
//! match a definition in DIR are answered locally; all others are forwarded
//! to their original destination.

use anyhow::Context;
use clap::Parser;
use mock_http_proxy::{Config, MockServer};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Mock HTTP proxy - answer from mock definitions, forward everything else
#[derive(Parser, Debug)]
#[command(name = "mock-http-proxy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding mock definition files (default: ~/.mock-http/definitions)
    #[arg(long, env = "MOCK_HTTP_DEFINITIONS")]
    definitions: Option<PathBuf>,

    /// Listen address, host:port or a bare port (default: 127.0.0.1:3000)
    #[arg(long, env = "MOCK_HTTP_ADDRESS")]
    address: Option<String>,

    /// Log operator diagnostics (definition and template errors, proxy targets)
    #[arg(long, env = "MOCK_HTTP_DEBUG")]
    debug: bool,

    /// Optional YAML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip TLS certificate verification for proxied HTTPS origins
    #[arg(long)]
    tls_skip_verify: bool,
}

impl Args {
    fn into_config(self) -> Result<Config, anyhow::Error> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(definitions) = self.definitions {
            config.definitions = definitions;
        }
        if let Some(address) = self.address {
            config.address = address;
        }
        config.debug |= self.debug;
        config.tls_skip_verify |= self.tls_skip_verify;

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mock_http_proxy={default_level}")));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(config: Config) -> Result<(), anyhow::Error> {
    config
        .ensure_definitions_dir()
        .context("Cannot prepare definitions directory")?;

    let server = MockServer::bind(&config).await?;
    info!(
        "mock-http-proxy {} listening on {}",
        env!("CARGO_PKG_VERSION"),
        server.local_addr()
    );
    server.run().await
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let debug = args.debug;

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(debug);
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.debug);

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
