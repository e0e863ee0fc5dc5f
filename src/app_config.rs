//! Application configuration: optional TOML file plus command-line overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use kb_export_core::RetryPolicy;
use kb_export_core::export::endpoints::DEFAULT_SERVICE_BASE;
use kb_export_core::fetch::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_COOLDOWN, DEFAULT_MAX_ATTEMPTS, DEFAULT_RATE_LIMIT,
    READ_TIMEOUT_SECS,
};

use crate::cli::Args;

const APP_DIR: &str = "kb-export";
const CONFIG_FILE: &str = "config.toml";

/// TOML-backed file configuration for exporter defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default output directory.
    pub output_dir: Option<PathBuf>,
    /// Service root URL.
    pub service_base: Option<String>,
    /// Base delay before every request in milliseconds.
    pub rate_limit_ms: Option<u64>,
    /// Attempts per request.
    pub max_attempts: Option<u32>,
    /// Pause after an error status before the next attempt, in milliseconds.
    pub cooldown_ms: Option<u64>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_range("rate_limit_ms", self.rate_limit_ms, 0, 60_000)?;
        validate_range(
            "max_attempts",
            self.max_attempts.map(u64::from),
            1,
            10,
        )?;
        validate_range("cooldown_ms", self.cooldown_ms, 0, 60_000)?;
        validate_range("connect_timeout_secs", self.connect_timeout_secs, 1, 3600)?;
        validate_range("read_timeout_secs", self.read_timeout_secs, 1, 3600)?;
        Ok(())
    }
}

fn validate_range(field: &str, value: Option<u64>, min: u64, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the tracing level this mode maps to.
    #[must_use]
    pub fn as_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/kb-export/config.toml`
/// 2. `$HOME/.config/kb-export/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join(CONFIG_FILE));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILE),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist. The default path is optional: a missing file
/// yields `None`.
pub fn load_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        return load_file_config(path).map(Some);
    }

    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Effective settings after merging CLI, config file and built-in defaults.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub output_dir: PathBuf,
    pub service_base: String,
    pub rate_limit: Duration,
    pub retry_policy: RetryPolicy,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Default tracing level when `RUST_LOG` is unset.
    pub log_level: &'static str,
}

impl RuntimeSettings {
    /// Merges sources. Priority: command line > config file > defaults.
    #[must_use]
    pub fn resolve(args: &Args, file_config: Option<&FileConfig>) -> Self {
        let file = file_config.cloned().unwrap_or_default();

        let output_dir = args
            .output_dir
            .clone()
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        let service_base = args
            .service_base
            .clone()
            .or(file.service_base)
            .unwrap_or_else(|| DEFAULT_SERVICE_BASE.to_string());
        let rate_limit = args
            .rate_limit
            .or(file.rate_limit_ms)
            .map_or(DEFAULT_RATE_LIMIT, Duration::from_millis);
        let max_attempts = args
            .max_attempts
            .or(file.max_attempts)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let cooldown = file
            .cooldown_ms
            .map_or(DEFAULT_COOLDOWN, Duration::from_millis);

        Self {
            output_dir,
            service_base,
            rate_limit,
            retry_policy: RetryPolicy::new(max_attempts, cooldown),
            connect_timeout_secs: file.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
            read_timeout_secs: file.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
            log_level: resolve_log_level(args, file.verbosity),
        }
    }
}

/// Priority: quiet flag > verbose flag > config verbosity > default (info).
fn resolve_log_level(args: &Args, configured: Option<VerbositySetting>) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => configured.map_or("info", VerbositySetting::as_level),
        1 => "debug",
        _ => "trace",
    }
}
