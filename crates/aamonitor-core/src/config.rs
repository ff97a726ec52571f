//! Configuration management for aamonitor

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Environment variable prefix for overrides, e.g. `AAMONITOR__API__BASE_URL`
pub const ENV_PREFIX: &str = "AAMONITOR";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API configuration
    pub api: ApiConfig,

    /// Session persistence configuration
    pub session: SessionConfig,

    /// Liveness monitor configuration
    pub monitor: MonitorConfig,

    /// TUI configuration
    pub tui: TuiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the environment.
    ///
    /// When `path` is `None` the file `config.toml` in the platform config
    /// directory is used if it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(path) = default_config_file() {
                    debug!(path = %path.display(), "Looking for configuration file");
                    builder = builder.add_source(config::File::from(path).required(false));
                }
            }
        }

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later at runtime
    pub fn validate(&self) -> Result<()> {
        self.api.base_url()?;
        crate::tui::parse_hex_color(&self.tui.accent_color)?;
        if self.monitor.interval.is_zero() {
            return Err(Error::config("monitor.interval must be greater than zero"));
        }
        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(Error::config(format!(
                "logging.format must be `pretty` or `json`, got `{other}`"
            ))),
        }
    }
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root URL of the monitoring REST API
    pub base_url: String,
    /// Timeout applied to every request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Parse the base URL, forcing a trailing slash so relative joins keep the path
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|e| Error::config(format!("invalid api.base_url `{raw}`: {e}")))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Where the session token is kept between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStorageKind {
    /// Session file in the data directory, shared by CLI invocations
    #[default]
    File,
    /// Process memory only, gone when the process exits
    Memory,
}

/// Session persistence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Storage backend
    pub storage: SessionStorageKind,
    /// Explicit session file path
    pub path: Option<PathBuf>,
}

impl SessionConfig {
    /// Resolve the session file path
    pub fn file_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join("session.json"))
            .ok_or_else(|| Error::config("could not determine a data directory for the session file"))
    }
}

/// Liveness monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between two probes of the same application
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Upper bound for a single probe
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// TUI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Refresh rate in milliseconds
    pub refresh_rate_ms: u64,
    /// Accent colour as `#rrggbb`
    pub accent_color: String,
    /// Start in the light theme
    pub light_theme: bool,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: 250,
            accent_color: "#52206d".to_string(),
            light_theme: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
    /// Directory for the dashboard's log file
    pub directory: Option<PathBuf>,
}

impl LoggingConfig {
    /// Resolve the log directory used while the TUI owns the terminal
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.directory
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join("logs")))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "aamonitor")
}

fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.monitor.probe_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let api = ApiConfig {
            base_url: "http://10.0.0.5:8000/api".to_string(),
            ..ApiConfig::default()
        };
        let url = api.base_url().unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5:8000/api/");
        assert_eq!(
            url.join("application/").unwrap().as_str(),
            "http://10.0.0.5:8000/api/application/"
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "http://monitor.internal:9000"
request_timeout = "3s"

[monitor]
interval = "30s"

[session]
storage = "memory"

[tui]
light_theme = true
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.api.base_url, "http://monitor.internal:9000");
        assert_eq!(config.api.request_timeout, Duration::from_secs(3));
        assert_eq!(config.monitor.interval, Duration::from_secs(30));
        assert_eq!(config.monitor.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.session.storage, SessionStorageKind::Memory);
        assert!(config.tui.light_theme);
        assert_eq!(config.tui.accent_color, "#52206d");
    }

    #[test]
    fn test_invalid_accent_color_rejected() {
        let mut config = Config::default();
        config.tui.accent_color = "purple".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
