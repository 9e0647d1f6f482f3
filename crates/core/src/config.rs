//! Configuration file discovery and loading
//!
//! Settings are layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (handled by clap in the binary)
//! 3. A TOML file found by [`find_config_file`]
//! 4. Built-in defaults

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::debug;
use serde::de::DeserializeOwned;

use crate::APP_NAME;

/// Where the effective configuration file came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Passed with `--config` or the config environment variable
    Explicit(PathBuf),
    /// Found in the working directory
    CurrentDir(PathBuf),
    /// Found under `$XDG_CONFIG_HOME/climate-api/`
    XdgConfig(PathBuf),
    /// Found under `/etc/climate-api/`
    System(PathBuf),
    /// Nothing found
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(p)
            | ConfigSource::CurrentDir(p)
            | ConfigSource::XdgConfig(p)
            | ConfigSource::System(p) => Some(p.as_path()),
            ConfigSource::Defaults => None,
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path() {
            Some(p) => write!(f, "{}", p.display()),
            None => write!(f, "(defaults)"),
        }
    }
}

/// Look for `filename` in the standard locations.
///
/// `env_var` names an environment variable holding an explicit path; it wins
/// when the path it points at exists.
pub fn find_config_file(env_var: &str, filename: &str) -> ConfigSource {
    if let Ok(path) = env::var(env_var) {
        let explicit = PathBuf::from(path);
        if explicit.exists() {
            return ConfigSource::Explicit(explicit);
        }
        debug!(
            "{} points at {}, which does not exist",
            env_var,
            explicit.display()
        );
    }

    let local = PathBuf::from(filename);
    if local.exists() {
        return ConfigSource::CurrentDir(local);
    }

    let xdg = xdg_config_path(filename);
    if xdg.exists() {
        return ConfigSource::XdgConfig(xdg);
    }

    let system = Path::new("/etc").join(APP_NAME).join(filename);
    if system.exists() {
        return ConfigSource::System(system);
    }

    ConfigSource::Defaults
}

fn xdg_config_path(filename: &str) -> PathBuf {
    let base = match (env::var("XDG_CONFIG_HOME"), env::var("HOME")) {
        (Ok(xdg), _) => PathBuf::from(xdg),
        (Err(_), Ok(home)) => PathBuf::from(home).join(".config"),
        // Relative fallback; will not exist in practice
        (Err(_), Err(_)) => PathBuf::from(".config"),
    };
    base.join(APP_NAME).join(filename)
}

/// Parse the TOML file behind `source`, or return `T::default()` when there is none.
pub fn load_config<T: DeserializeOwned + Default>(source: &ConfigSource) -> anyhow::Result<T> {
    let Some(path) = source.path() else {
        return Ok(T::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config file {}", path.display()))
}
