//! Layered configuration.
//!
//! Settings are merged, later layers winning:
//!
//! 1. built-in defaults,
//! 2. a configuration file (TOML, YAML or JSON, picked by extension),
//! 3. `IRD_`-prefixed environment variables, with `__` separating nested
//!    keys: `IRD_CATALOG__BASE_URL`, `IRD_COMPAT__MAX_ATTEMPTS`.

pub mod error;

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::error::{ErrorKind, Result};

const ENV_PREFIX: &str = "IRD_";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Cache directory used when the platform has no notion of one.
const FALLBACK_CACHE_DIRECTORY: &str = "ird-cache";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("net", "rpcs3", "ird")
}

/// Where [`Config::load`] looks when no file is given.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub compat: CompatConfig,
}

/// The IRD Library catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { base_url: ird_catalog::DEFAULT_BASE_URL.to_string(), timeout_secs: DEFAULT_TIMEOUT_SECS }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The local IRD cache directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Unset means the platform cache directory.
    pub directory: Option<PathBuf>,
}

impl CacheConfig {
    /// The cache directory as an absolute path.
    ///
    /// Relative settings are resolved against the current directory. The
    /// directory itself may not exist yet.
    pub fn resolved_directory(&self) -> Result<PathBuf> {
        let directory = match &self.directory {
            Some(directory) => directory.clone(),
            None => project_dirs()
                .map(|dirs| dirs.cache_dir().join("ird"))
                .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIRECTORY)),
        };
        std::path::absolute(&directory).or_raise(|| ErrorKind::InvalidValue("cache.directory"))
    }
}

/// The compatibility list and update-check APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfig {
    pub base_url: String,
    pub update_url: String,
    pub max_attempts: u32,
    pub timeout_secs: u64,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            base_url: ird_compat::DEFAULT_BASE_URL.to_string(),
            update_url: ird_compat::DEFAULT_UPDATE_URL.to_string(),
            max_attempts: ird_compat::retry::DEFAULT_MAX_ATTEMPTS.get(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl CompatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Zero is rejected when loading, so this only falls back to the default
    /// for hand-built configs.
    pub fn max_attempts(&self) -> NonZeroU32 {
        NonZeroU32::new(self.max_attempts).unwrap_or(ird_compat::retry::DEFAULT_MAX_ATTEMPTS)
    }
}

impl Config {
    /// Load configuration from every layer.
    ///
    /// With `path`, that file must exist. Without it, the file at
    /// [`default_config_path`] is used if there is one.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => {
                exn::bail!(ErrorKind::Load(format!("configuration file {} does not exist", path.display())))
            },
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|path| path.is_file()),
        };
        if let Some(file) = &file {
            tracing::debug!(file = %file.display(), "reading configuration file");
        }
        Self::from_figment(Self::figment(file.as_deref()))
    }

    /// The layered sources, without extracting anything.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = match file.extension().and_then(|extension| extension.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a configuration from arbitrary sources.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(|e| ErrorKind::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_url(&self.catalog.base_url, "catalog.base_url")?;
        check_url(&self.compat.base_url, "compat.base_url")?;
        check_url(&self.compat.update_url, "compat.update_url")?;
        if self.catalog.timeout_secs == 0 {
            exn::bail!(ErrorKind::InvalidValue("catalog.timeout_secs"));
        }
        if self.compat.timeout_secs == 0 {
            exn::bail!(ErrorKind::InvalidValue("compat.timeout_secs"));
        }
        if self.compat.max_attempts == 0 {
            exn::bail!(ErrorKind::InvalidValue("compat.max_attempts"));
        }
        Ok(())
    }
}

fn check_url(value: &str, setting: &'static str) -> Result<()> {
    let url = Url::parse(value).or_raise(|| ErrorKind::InvalidValue(setting))?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        exn::bail!(ErrorKind::InvalidValue(setting));
    }
    Ok(())
}
