//! Configuration file parsing and management.
//!
//! Handles TOML configuration files, `DOH_*` environment variables and
//! merging them into a [`CheckConfig`] with the usual precedence:
//! CLI arguments > environment > local file > global file > XDG file > defaults.

use crate::error::DomainCheckError;
use crate::types::CheckConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// timeout_ms = 5000
/// delay_ms = 500
/// tlds = ["com", "io"]
///
/// [resolvers]
/// endpoints = ["https://cloudflare-dns.com/dns-query", "https://dns.google/resolve"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for probing options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Resolver endpoint list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolvers: Option<ResolversConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Per-domain probe deadline in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Per-request HTTP timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,

    /// Pause between batch probes in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,

    /// TLDs used to expand base names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tlds: Option<Vec<String>>,
}

/// DoH endpoints, in priority order.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ResolversConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<String>>,
}

impl FileConfig {
    /// Overlay the values present in this file onto `config`.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(ms) = defaults.timeout_ms {
                config.timeout = Duration::from_millis(ms);
            }
            if let Some(ms) = defaults.request_timeout_ms {
                config.request_timeout = Duration::from_millis(ms);
            }
            if let Some(ms) = defaults.delay_ms {
                config.delay = Duration::from_millis(ms);
            }
            if let Some(tlds) = &defaults.tlds {
                config.tlds = Some(tlds.clone());
            }
        }

        if let Some(endpoints) = self.resolvers.as_ref().and_then(|r| r.endpoints.clone()) {
            config.endpoints = endpoints;
        }

        config
    }
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// `FileError` if the file is missing or unreadable, `ConfigError` if it
    /// is not valid TOML or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        self.validate_config(&config)?;

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Files that fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainCheckError> {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        let mut merged_config = FileConfig::default();

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring configuration file");
                }
            }
        }

        Ok(merged_config)
    }

    /// Looks for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./doh-check.toml", "./.doh-check.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Looks for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;

        [".doh-check.toml", "doh-check.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("doh-check").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations. Values from `higher` take precedence.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    timeout_ms: higher_defaults.timeout_ms.or(lower_defaults.timeout_ms),
                    request_timeout_ms: higher_defaults
                        .request_timeout_ms
                        .or(lower_defaults.request_timeout_ms),
                    delay_ms: higher_defaults.delay_ms.or(lower_defaults.delay_ms),
                    tlds: higher_defaults.tlds.or(lower_defaults.tlds),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            resolvers: match (lower.resolvers, higher.resolvers) {
                (Some(lower_resolvers), Some(higher_resolvers)) => Some(ResolversConfig {
                    endpoints: higher_resolvers.endpoints.or(lower_resolvers.endpoints),
                }),
                (lower_resolvers, higher_resolvers) => higher_resolvers.or(lower_resolvers),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DomainCheckError> {
        if let Some(defaults) = &config.defaults {
            if defaults.timeout_ms == Some(0) || defaults.request_timeout_ms == Some(0) {
                return Err(DomainCheckError::config("Timeouts must be greater than zero"));
            }

            if let Some(tlds) = &defaults.tlds {
                for tld in tlds {
                    if tld.is_empty() || tld.contains(' ') {
                        return Err(DomainCheckError::config(format!("Invalid TLD '{}'", tld)));
                    }
                }
            }
        }

        if let Some(endpoints) = config.resolvers.as_ref().and_then(|r| r.endpoints.as_ref()) {
            let probe = CheckConfig::default().with_endpoints(endpoints.clone());
            probe.validate()?;
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// Values come from `DOH_*` variables. Invalid values are logged and ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
    pub delay: Option<Duration>,
    pub endpoints: Option<Vec<String>>,
    pub tlds: Option<Vec<String>>,
    pub file: Option<String>,
    pub config: Option<String>,
}

/// Load configuration from the process environment.
///
/// | Variable                 | Meaning                                |
/// |--------------------------|----------------------------------------|
/// | `DOH_TIMEOUT`            | probe deadline (`1500`, `1500ms`, `5s`) |
/// | `DOH_REQUEST_TIMEOUT`    | per-request HTTP timeout               |
/// | `DOH_DELAY`              | pause between batch probes             |
/// | `DOH_ENDPOINTS`          | comma-separated endpoint URLs          |
/// | `DOH_TLD`                | comma-separated TLDs                   |
/// | `DOH_FILE`               | default domains file                   |
/// | `DOH_CONFIG`             | explicit config file                   |
pub fn load_env_config() -> EnvConfig {
    EnvConfig::from_lookup(|key| env::var(key).ok())
}

impl EnvConfig {
    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let duration = |key: &str| {
            let raw = lookup(key)?;
            match parse_duration_string(&raw) {
                Some(d) if !d.is_zero() || key == "DOH_DELAY" => Some(d),
                _ => {
                    tracing::warn!(variable = key, value = %raw, "invalid duration, ignoring");
                    None
                }
            }
        };

        let list = |key: &str| {
            let values: Vec<String> = lookup(key)?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            (!values.is_empty()).then_some(values)
        };

        let path = |key: &str| lookup(key).filter(|p| !p.trim().is_empty());

        Self {
            timeout: duration("DOH_TIMEOUT"),
            request_timeout: duration("DOH_REQUEST_TIMEOUT"),
            delay: duration("DOH_DELAY"),
            endpoints: list("DOH_ENDPOINTS"),
            tlds: list("DOH_TLD"),
            file: path("DOH_FILE"),
            config: path("DOH_CONFIG"),
        }
    }

    /// Overlay the values present in the environment onto `config`.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(request_timeout) = self.request_timeout {
            config.request_timeout = request_timeout;
        }
        if let Some(delay) = self.delay {
            config.delay = delay;
        }
        if let Some(endpoints) = &self.endpoints {
            config.endpoints = endpoints.clone();
        }
        if let Some(tlds) = &self.tlds {
            config.tlds = Some(tlds.clone());
        }
        config
    }
}

/// Parse a duration like `"1500"`, `"1500ms"`, `"5s"` or `"2m"`.
///
/// A bare number is milliseconds.
pub fn parse_duration_string(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_millis)
    }
}
