//! Configuration loading and secret resolution
//!
//! WKMP services read a per-module TOML file and allow environment variables
//! to override individual secrets. Priority: ENV → TOML.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where a resolved secret came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Environment,
    Toml,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::Environment => write!(f, "environment"),
            SecretSource::Toml => write!(f, "TOML"),
        }
    }
}

/// Default TOML path for a module: `<config_dir>/wkmp/<module>.toml`
pub fn default_config_path(module_name: &str) -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("wkmp").join(format!("{}.toml", module_name)))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load a module TOML file.
///
/// A missing file is not an error: the caller gets `T::default()` and a
/// warning is logged. A file that exists but fails to parse is an error.
pub fn load_toml_config<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        warn!(
            "Config file not found at {}; using compiled defaults",
            path.display()
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Resolve a secret from the environment, falling back to a TOML value.
///
/// Blank values are ignored in both tiers.
pub fn resolve_secret(env_var_name: &str, toml_value: Option<&str>) -> Option<(String, SecretSource)> {
    let env_value = std::env::var(env_var_name).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in multiple sources: environment, TOML. Using environment (highest priority).",
            env_var_name
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable", env_var_name);
        return Some((value, SecretSource::Environment));
    }

    toml_value.map(|value| {
        info!("{} loaded from TOML config", env_var_name);
        (value.to_string(), SecretSource::Toml)
    })
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
