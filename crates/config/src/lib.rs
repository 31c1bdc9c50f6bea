//! Layered configuration for pidr.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. Built-in defaults (a registry database in the platform data directory),
//! 2. `config.toml` in the platform configuration directory, if present,
//! 3. An explicitly given TOML, YAML or JSON file,
//! 4. `PIDR_`-prefixed environment variables, nested with `__`
//!    (`PIDR_STORE__URI`, `PIDR_REQUESTER`).

pub mod error;

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

const ENV_PREFIX: &str = "PIDR_";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "registry.db";
const FALLBACK_STORE_URI: &str = "sqlite://pidr.db?mode=rwc";
const DEFAULT_REQUESTER: &str = "pidr";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "pidr", "pidr")
}

/// SQLite URI of the registry in the platform data directory, or `pidr.db` in
/// the working directory when no home directory can be determined.
pub fn default_store_uri() -> String {
    project_dirs()
        .map(|dirs| format!("sqlite://{}?mode=rwc", dirs.data_dir().join(DATABASE_FILE).display()))
        .unwrap_or_else(|| FALLBACK_STORE_URI.to_string())
}

/// Path of the implicit configuration file, if the platform has a configuration directory.
pub fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection URI of the registry database.
    pub uri: String,
}
impl Default for StoreConfig {
    fn default() -> Self {
        Self { uri: default_store_uri() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    /// Recorded as the author of registrations when a request names no requester.
    pub requester: String,
}
impl Default for Config {
    fn default() -> Self {
        Self { store: StoreConfig::default(), requester: DEFAULT_REQUESTER.to_string() }
    }
}

impl Config {
    /// Builds the layered [`Figment`] without extracting it.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnsupportedFormat`] if `file` is not `.toml`, `.yaml`/`.yml` or `.json`.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(implicit) = default_config_file() {
            figment = figment.merge(Toml::file(implicit));
        }
        if let Some(file) = file {
            let extension = file.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
            figment = match extension.to_lowercase().as_str() {
                "toml" => figment.merge(Toml::file(file)),
                "yaml" | "yml" => figment.merge(Yaml::file(file)),
                "json" => figment.merge(Json::file(file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file.display().to_string())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Loads and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Load`] if a source is malformed, or
    /// [`ErrorKind::Invalid`] if the result fails validation.
    #[instrument]
    pub fn load(file: Option<&Path>) -> Result<Self> {
        if let Some(file) = file
            && !file.is_file()
        {
            exn::bail!(ErrorKind::Invalid("configuration file does not exist"));
        }
        let config: Config = Self::figment(file)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(store = %config.store.uri, "configuration loaded");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ErrorKind::Invalid`] if the store URI or the requester is blank.
    pub fn validate(&self) -> Result<()> {
        if self.store.uri.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("store URI must not be empty"));
        }
        if self.requester.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("requester must not be empty"));
        }
        Ok(())
    }
}
