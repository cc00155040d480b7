//! Configuration management for dockhook.
use regex::Regex;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use strum_macros::Display;

use crate::{
    command::HandlerCommand,
    constants::{CONFIG_FILE_NAME, SYSTEM_CONFIG_DIR},
    error::DockHookError,
};

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?").expect("env var pattern is valid")
});

/// Represents the structure of the configuration file.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Enables debug logging and forwards handler stdout.
    #[serde(default)]
    pub debug: bool,
    /// Which message bus to listen on.
    #[serde(default)]
    pub bus: BusKind,
    /// How the dispatcher reacts to recoverable failures.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Map of dock names to their respective configurations.
    #[serde(default)]
    pub docks: BTreeMap<String, DockConfig>,
}

/// Configuration for an individual dock.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DockConfig {
    /// Device UUID as exposed by boltd. Required, checked when registering.
    #[serde(default)]
    pub uuid: String,
    /// Handler run when the dock becomes authorized.
    pub authorize: Option<HandlerCommand>,
    /// Handler run when the dock is disconnected.
    pub disconnect: Option<HandlerCommand>,
}

/// The bus to connect to.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BusKind {
    /// The system-wide bus boltd lives on.
    #[default]
    System,
    /// The per-login session bus, mostly useful for testing.
    Session,
}

/// Whether a failure stops dockhook or is logged and skipped.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Terminate the dispatch loop with the error.
    #[default]
    Abort,
    /// Log the error and keep waiting for signals.
    Skip,
}

/// Failure policies of the dispatcher.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Signals for paths no dock is registered under.
    #[serde(default)]
    pub unknown_device: FailurePolicy,
    /// Handlers that fail to start or exit non-zero.
    #[serde(default)]
    pub handler_failure: FailurePolicy,
}

/// Expands `$VAR` and `${VAR}` references from the environment.
fn expand_env_vars(input: &str) -> Result<String, DockHookError> {
    let mut missing = None;
    let expanded = ENV_VAR.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        env::var(var_name).unwrap_or_else(|_| {
            missing.get_or_insert_with(|| var_name.to_string());
            String::new()
        })
    });

    match missing {
        Some(var_name) => Err(DockHookError::MissingEnvVar(var_name)),
        None => Ok(expanded.into_owned()),
    }
}

/// Candidate configuration files, most specific first.
fn config_candidates() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    match env::var_os("XDG_CONFIG_HOME").filter(|dir| !dir.is_empty()) {
        Some(dir) => dirs.push(PathBuf::from(dir)),
        None => {
            if let Some(home) = env::var_os("HOME") {
                dirs.push(PathBuf::from(home).join(".config"));
            }
        }
    }
    dirs.push(PathBuf::from(SYSTEM_CONFIG_DIR));

    dirs.into_iter().map(|dir| dir.join(CONFIG_FILE_NAME)).collect()
}

/// Resolves the configuration file used when none is given on the command line.
///
/// The first existing candidate wins; if none exists the user location is
/// returned so the read error points at where the file is expected.
pub fn default_config_path() -> PathBuf {
    let candidates = config_candidates();
    candidates
        .iter()
        .find(|path| path.exists())
        .or_else(|| candidates.first())
        .cloned()
        .unwrap_or_else(|| Path::new(SYSTEM_CONFIG_DIR).join(CONFIG_FILE_NAME))
}

/// Loads and parses the configuration file, expanding environment variables.
pub fn load_config(config_path: Option<&Path>) -> Result<Config, DockHookError> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    let content =
        fs::read_to_string(&config_path).map_err(|source| DockHookError::ConfigRead {
            path: config_path.clone(),
            source,
        })?;

    parse_config(&content)
}

/// Parses configuration text, expanding environment variables first.
pub fn parse_config(content: &str) -> Result<Config, DockHookError> {
    let expanded = expand_env_vars(content)?;
    let config = serde_yaml::from_str(&expanded)?;
    Ok(config)
}
