//! Layered configuration
//!
//! Defaults, then an optional TOML file, then `VIDPATH_*`/`OPENAI_*`
//! environment variables. CLI flags are applied by the caller on top.

use crate::{Result, config::Settings};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Resolves [`Settings`] from every configured source
#[derive(Debug)]
pub struct ConfigLoader {
    base: Settings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            base: Settings::default(),
        }
    }

    /// File (explicit, else the per-user default when present), then env, then validation
    pub fn load(&self, config_file: Option<&Path>) -> Result<Settings> {
        let from_file = match Self::resolve_file(config_file) {
            Some(path) if path.exists() => {
                info!("Reading configuration from {}", path.display());
                Settings::from_file(&path)?
            }
            Some(path) => {
                warn!("{} does not exist, continuing with defaults", path.display());
                self.base.clone()
            }
            None => self.base.clone(),
        };

        let settings = from_file.merge_with_env()?;
        settings.validate()?;
        debug!("Effective configuration: {:?}", settings);
        Ok(settings)
    }

    /// Defaults plus environment, no file
    pub fn from_env_only(&self) -> Result<Settings> {
        let settings = Settings::from_env()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Per-user configuration file, `<config_dir>/vidpath/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vidpath").join("config.toml"))
    }

    fn resolve_file(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
