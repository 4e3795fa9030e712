//! CLI command implementations.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::{eyre, Result, WrapErr};

use preflight_core::MemoryStore;
use preflight_server::{Server, ServerConfig};

use crate::config::Config;

/// Options for `preflight serve`; unset values fall back to the loaded config.
#[derive(Debug, Default)]
pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub data_file: Option<PathBuf>,
    pub no_cors: bool,
    pub strict_persistence: bool,
    pub ephemeral: bool,
}

/// Resolves the server configuration from CLI options layered over `cfg`.
pub fn server_config(options: &ServeOptions, cfg: &Config) -> Result<ServerConfig> {
    let host = options.host.as_deref().unwrap_or(&cfg.server_host);
    let port = options.port.unwrap_or(cfg.server_port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .wrap_err_with(|| format!("Invalid listen address {}:{}", host, port))?;

    Ok(ServerConfig::builder()
        .addr(addr)
        .cors(cfg.cors && !options.no_cors)
        .data_file(
            options
                .data_file
                .clone()
                .unwrap_or_else(|| cfg.data_file.clone()),
        )
        .strict_persistence(cfg.strict_persistence || options.strict_persistence)
        .build())
}

/// Start the checklist server.
pub async fn serve(options: ServeOptions, cfg: &Config) -> Result<()> {
    let config = server_config(&options, cfg)?;

    let server = if options.ephemeral {
        tracing::warn!("Ephemeral mode: checklists are kept in memory and lost on exit");
        Server::with_store(config, Arc::new(MemoryStore::new()))
    } else {
        Server::new(config)
    };

    server.run().await?;
    Ok(())
}

/// Write a config file with default values.
pub fn config_init(force: bool) -> Result<()> {
    let path = Config::config_path();
    if path.exists() && !force {
        return Err(eyre!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }

    Config::default()
        .save_to(&path)
        .wrap_err("Failed to write config file")?;
    println!("Config written to: {}", path.display());
    Ok(())
}

/// Display version information.
pub fn version() {
    println!("Preflight {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Components:");
    println!("  preflight-core       - Checklist model and storage");
    println!("  preflight-server     - HTTP API");
    println!("  preflight-telemetry  - Logging");
}
