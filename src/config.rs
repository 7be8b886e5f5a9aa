//! Configuration management for Runcell
//!
//! Loads configuration with layered precedence: built-in defaults, then an
//! optional TOML config file, then environment variable overrides.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Root directory under which per-session scratch workspaces are created
    #[serde(default = "default_scratch_root")]
    pub scratch_root: PathBuf,
    /// Default wall-clock deadline for an execution
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub default_timeout: Duration,
    /// Default container memory ceiling (e.g. "256m", "1g")
    #[serde(default = "default_memory_limit")]
    pub default_memory_limit: String,
    /// CPU quota per container (number of CPUs)
    #[serde(default = "default_cpu_limit")]
    pub cpu_limit: f64,
    /// Disable container network access unless a request opts back in
    #[serde(default = "default_true")]
    pub network_disabled: bool,
    /// Pull a profile's image when it is missing locally
    #[serde(default = "default_true")]
    pub pull_images: bool,
    /// Cap on captured stdout/stderr bytes; unset means unbounded
    #[serde(default = "default_max_output")]
    pub max_output_bytes: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            scratch_root: default_scratch_root(),
            default_timeout: default_timeout(),
            default_memory_limit: default_memory_limit(),
            cpu_limit: default_cpu_limit(),
            network_disabled: default_true(),
            pull_images: default_true(),
            max_output_bytes: default_max_output(),
        }
    }
}

fn default_scratch_root() -> PathBuf {
    std::env::temp_dir().join("runcell")
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_memory_limit() -> String {
    "256m".to_string()
}

fn default_cpu_limit() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_max_output() -> Option<usize> {
    Some(1024 * 1024) // 1MB
}

/// Path of the user-level config file
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("runcell").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("runcell.toml"))
}

/// Load configuration with layered precedence:
/// 1. Config file (config.toml) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env for convenience)
pub fn load_config() -> Result<ExecutorConfig> {
    let path = config_path();

    let mut config = if path.exists() {
        load_config_from_path(&path)?
    } else {
        ExecutorConfig::default()
    };

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<ExecutorConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))
}

/// Apply environment variable overrides to an existing config.
///
/// Env vars have the highest precedence in the config layering:
/// defaults < file < env.
pub fn apply_env_overrides(config: &mut ExecutorConfig) {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    if let Ok(root) = std::env::var("RUNCELL_SCRATCH_ROOT") {
        config.scratch_root = PathBuf::from(root);
    }
    if let Ok(secs) = std::env::var("RUNCELL_DEFAULT_TIMEOUT_SECS") {
        if let Ok(secs) = secs.parse::<u64>() {
            config.default_timeout = Duration::from_secs(secs);
        }
    }
    if let Ok(limit) = std::env::var("RUNCELL_MEMORY_LIMIT") {
        config.default_memory_limit = limit;
    }
    if let Ok(cpus) = std::env::var("RUNCELL_CPU_LIMIT") {
        if let Ok(cpus) = cpus.parse::<f64>() {
            config.cpu_limit = cpus;
        }
    }
    if let Ok(flag) = std::env::var("RUNCELL_NETWORK_DISABLED") {
        if let Ok(flag) = flag.parse::<bool>() {
            config.network_disabled = flag;
        }
    }
    if let Ok(flag) = std::env::var("RUNCELL_PULL_IMAGES") {
        if let Ok(flag) = flag.parse::<bool>() {
            config.pull_images = flag;
        }
    }
    if let Ok(bytes) = std::env::var("RUNCELL_MAX_OUTPUT_BYTES") {
        // 0 disables the cap entirely
        match bytes.parse::<usize>() {
            Ok(0) => config.max_output_bytes = None,
            Ok(n) => config.max_output_bytes = Some(n),
            Err(_) => {}
        }
    }
}
