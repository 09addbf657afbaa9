//! Configuration resolution for soundpool-si
//!
//! Dataset root priority: command line → environment → TOML → compiled
//! default. Listener and extension settings come from the CLI or the TOML
//! config with compiled fallbacks. A missing config file degrades to
//! defaults; an explicitly passed `--config` path that fails to parse is an
//! error.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use soundpool_common::config::{
    load_toml_config, CompiledDefaults, RootFolderResolver, TomlConfig,
};
use soundpool_common::{Error, Result};
use tracing::warn;

pub const MODULE_NAME: &str = "soundpool-si";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5740;
pub const DEFAULT_EXTENSION: &str = "wav";

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = MODULE_NAME, about = "Soundpool sample ingest service", version)]
pub struct CliArgs {
    /// Dataset root folder (overrides environment and config file)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "SOUNDPOOL_PORT")]
    pub port: Option<u16>,

    /// Interface to bind
    #[arg(long, env = "SOUNDPOOL_BIND")]
    pub bind: Option<String>,

    /// Config file path (default: ~/.config/soundpool/soundpool-si.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Dataset root the filing core writes under
    pub root: PathBuf,
    pub bind_address: String,
    pub port: u16,
    /// Container extension the capture clients are contracted to produce
    pub extension: String,
    pub log_level: String,
}

impl ServiceConfig {
    /// Merge CLI arguments, environment, config file and compiled defaults.
    pub fn resolve(args: &CliArgs) -> Result<Self> {
        let defaults = CompiledDefaults::for_current_platform();

        let (file_config, root) = match &args.config {
            Some(path) => {
                // An explicit config path must exist and parse
                let file_config = load_toml_config(path)?;
                let root = args
                    .root
                    .clone()
                    .or_else(|| std::env::var("SOUNDPOOL_DATASET_ROOT").ok().map(PathBuf::from))
                    .or_else(|| std::env::var("SOUNDPOOL_ROOT").ok().map(PathBuf::from))
                    .or_else(|| file_config.root_folder.clone())
                    .unwrap_or_else(|| defaults.root_folder.clone());
                (file_config, root)
            }
            None => {
                let resolver =
                    RootFolderResolver::new(MODULE_NAME).with_cli_override(args.root.clone());
                let file_config = resolver
                    .config_file_path()
                    .and_then(|path| match load_toml_config(&path) {
                        Ok(config) => Some(config),
                        Err(e) => {
                            warn!(
                                "Config file {} unreadable ({}), using defaults",
                                path.display(),
                                e
                            );
                            None
                        }
                    })
                    .unwrap_or_default();
                let root = resolver.resolve();
                (file_config, root)
            }
        };

        let extension = file_config
            .extension
            .as_deref()
            .unwrap_or(DEFAULT_EXTENSION)
            .trim_start_matches('.')
            .to_ascii_lowercase();
        if extension.is_empty() {
            return Err(Error::Config(
                "Configured extension is empty".to_string(),
            ));
        }

        Ok(Self {
            root,
            bind_address: args
                .bind
                .clone()
                .or(file_config.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: args.port.or(file_config.port).unwrap_or(DEFAULT_PORT),
            extension,
            log_level: file_config.logging.level,
        })
    }

    /// Listener address from the configured interface and port
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            Error::Config(format!("Invalid bind address: {}", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
