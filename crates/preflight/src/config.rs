//! Configuration management for the Preflight CLI.
//!
//! Configuration is loaded from (in order of precedence):
//! 1. Command-line arguments
//! 2. Environment variables (PREFLIGHT_*)
//! 3. Config file (~/.config/preflight/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Server host.
    #[serde(default = "default_host")]
    pub server_host: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub server_port: u16,

    /// File holding the checklist collection.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Allow cross-origin requests from any origin.
    #[serde(default = "default_cors")]
    pub cors: bool,

    /// Fail mutating requests with 500 when the data file cannot be written.
    #[serde(default)]
    pub strict_persistence: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    preflight_server::DEFAULT_PORT
}

fn default_data_file() -> PathBuf {
    PathBuf::from(preflight_core::DEFAULT_DATA_FILE)
}

fn default_cors() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: default_host(),
            server_port: default_port(),
            data_file: default_data_file(),
            cors: default_cors(),
            strict_persistence: false,
        }
    }
}

impl Config {
    /// Loads configuration from all sources.
    ///
    /// Reports warnings for configuration errors but falls back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration using `config_path` as the config file.
    pub fn load_from(config_path: &Path) -> Self {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("PREFLIGHT_"));

        match figment.extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("\x1b[33mWarning:\x1b[0m Configuration error, using defaults");
                eprintln!("  Config file: {}", config_path.display());
                eprintln!("  Error: {}", e);
                eprintln!();
                eprintln!("  To fix, edit or delete the config file:");
                eprintln!("    rm {}", config_path.display());
                eprintln!();
                Config::default()
            },
        }
    }

    /// Returns the path to the config file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Returns the path to the config directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("preflight")
    }

    /// Writes this configuration to `path` as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        std::fs::write(path, toml_str)
    }
}

/// Prints the current configuration and its sources.
pub fn show_config() {
    let config = Config::load();
    let config_path = Config::config_path();

    println!("Preflight Configuration");
    println!("=======================\n");

    println!("Config file: {}", config_path.display());
    if config_path.exists() {
        println!("Status: Found\n");
    } else {
        println!("Status: Not found (using defaults)\n");
    }

    println!("Current settings:");
    println!("  server_host: {}", config.server_host);
    println!("  server_port: {}", config.server_port);
    println!("  data_file: {}", config.data_file.display());
    println!("  cors: {}", config.cors);
    println!("  strict_persistence: {}", config.strict_persistence);

    println!("\nEnvironment variables:");
    println!("  PREFLIGHT_SERVER_HOST");
    println!("  PREFLIGHT_SERVER_PORT");
    println!("  PREFLIGHT_DATA_FILE");
    println!("  PREFLIGHT_CORS");
    println!("  PREFLIGHT_STRICT_PERSISTENCE");
}
