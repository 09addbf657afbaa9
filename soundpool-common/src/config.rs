//! Configuration loading and dataset root resolution
//!
//! Resolution priority for the dataset root:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`SOUNDPOOL_DATASET_ROOT`, then `SOUNDPOOL_ROOT`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing config file never aborts startup; the resolver degrades to the
//! compiled default with a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Directory under the dataset root holding attributed training samples.
pub const TRAINING_DIR: &str = "training";

/// Directory under the dataset root holding the unattributed recognition pool.
pub const RECOGNITION_DIR: &str = "recognition";

/// Compiled per-platform defaults used when no other source provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    /// Default settings for the platform the binary was compiled for
    pub fn for_current_platform() -> Self {
        let root_folder = if cfg!(target_os = "linux") {
            // ~/.local/share/soundpool/dataset
            dirs::data_local_dir()
                .map(|d| d.join("soundpool").join("dataset"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/soundpool/dataset"))
        } else if cfg!(target_os = "macos") {
            // ~/Library/Application Support/soundpool/dataset
            dirs::data_dir()
                .map(|d| d.join("soundpool").join("dataset"))
                .unwrap_or_else(|| {
                    PathBuf::from("/Library/Application Support/soundpool/dataset")
                })
        } else if cfg!(target_os = "windows") {
            // %LOCALAPPDATA%\soundpool\dataset
            dirs::data_local_dir()
                .map(|d| d.join("soundpool").join("dataset"))
                .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\soundpool\\dataset"))
        } else {
            PathBuf::from("./soundpool_dataset")
        };

        Self {
            root_folder,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Dataset root resolution following the priority order documented at the
/// top of this module.
pub struct RootFolderResolver {
    module_name: String,
    cli_override: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_override: None,
        }
    }

    /// Attach a command-line override (highest priority when present)
    pub fn with_cli_override(mut self, root: Option<PathBuf>) -> Self {
        self.cli_override = root;
        self
    }

    /// Resolve the dataset root. Never fails; the compiled default is the
    /// terminal fallback.
    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_override {
            return path.clone();
        }

        // Priority 2: Environment variables
        if let Ok(path) = std::env::var("SOUNDPOOL_DATASET_ROOT") {
            return PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("SOUNDPOOL_ROOT") {
            return PathBuf::from(path);
        }

        // Priority 3: TOML config file
        if let Some(config_path) = self.config_file_path() {
            match load_toml_config(&config_path) {
                Ok(config) => {
                    if let Some(root_folder) = config.root_folder {
                        return root_folder;
                    }
                }
                Err(e) => {
                    warn!(
                        "Config file {} unreadable ({}), using compiled default",
                        config_path.display(),
                        e
                    );
                }
            }
        }

        // Priority 4: OS-dependent compiled default
        CompiledDefaults::for_current_platform().root_folder
    }

    /// Candidate config file for this module, if one exists on disk.
    ///
    /// `~/.config/soundpool/<module>.toml` first; on Linux,
    /// `/etc/soundpool/<module>.toml` as the system-wide fallback.
    pub fn config_file_path(&self) -> Option<PathBuf> {
        let file_name = format!("{}.toml", self.module_name);

        if let Some(user_config) = dirs::config_dir() {
            let path = user_config.join("soundpool").join(&file_name);
            if path.exists() {
                return Some(path);
            }
        }

        if cfg!(target_os = "linux") {
            let system_config = PathBuf::from("/etc/soundpool").join(&file_name);
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }
}

/// Creates and checks the on-disk dataset layout under a resolved root.
///
/// Both mode subtrees are created up front so a root that is not writable is
/// caught at startup rather than on the first upload.
pub struct DatasetInitializer {
    root: PathBuf,
}

impl DatasetInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/training`
    pub fn training_dir(&self) -> PathBuf {
        self.root.join(TRAINING_DIR)
    }

    /// `<root>/recognition`
    pub fn recognition_dir(&self) -> PathBuf {
        self.root.join(RECOGNITION_DIR)
    }

    /// Create the root and both mode subtrees. Idempotent: existing
    /// directories are success, not an error.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [self.training_dir(), self.recognition_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                Error::Config(format!(
                    "Cannot create dataset directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    pub fn layout_exists(&self) -> bool {
        self.training_dir().is_dir() && self.recognition_dir().is_dir()
    }
}

/// Logging section of the TOML config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// TOML config file schema shared by the Soundpool services.
///
/// All fields are optional so older config files keep parsing as the schema
/// grows.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TomlConfig {
    /// Dataset root folder override
    pub root_folder: Option<PathBuf>,
    /// Interface to bind the HTTP listener to
    pub bind_address: Option<String>,
    /// Port to bind the HTTP listener to
    pub port: Option<u16>,
    /// Container file extension the capture clients are contracted to send
    pub extension: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Write a TOML config file atomically (temp file + rename).
///
/// The rename is the commit point, so a crash mid-write never leaves a
/// truncated config behind. On Unix the file is restricted to 0600.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Create config dir failed: {}", e)))?;
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)
        .map_err(|e| Error::Config(format!("Write TOML failed: {}", e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        if let Err(e) = std::fs::set_permissions(&temp_path, perms) {
            warn!("Could not restrict config permissions: {}", e);
        }
    }

    std::fs::rename(&temp_path, path)
        .map_err(|e| Error::Config(format!("Commit TOML failed: {}", e)))?;
    Ok(())
}
