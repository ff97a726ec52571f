//! Application records returned by the directory endpoint

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Backend identifier of an application (`aid`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub i64);

impl ApplicationId {
    /// The backend uses `0` for rows that are not real applications yet
    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monitored unit of the agent assist fleet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    /// Unique identifier within one retrieval
    #[serde(rename = "aid")]
    pub id: ApplicationId,

    /// Whether the application is enabled (`enable == 1`)
    #[serde(rename = "enable", deserialize_with = "deserialize_enable", default)]
    pub enabled: bool,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Host the application listens on
    #[serde(default)]
    pub ip: Option<String>,

    /// REST port, used by the liveness probe
    #[serde(default)]
    pub rest_port: Option<u16>,

    /// WebSocket port
    #[serde(default)]
    pub ws_port: Option<u16>,

    /// Profiler port
    #[serde(default)]
    pub prof_port: Option<u16>,

    /// Deployment identifier
    #[serde(default)]
    pub zid: Option<String>,

    /// Free-form description
    #[serde(default)]
    pub desc: Option<String>,

    /// Owning company id
    #[serde(default)]
    pub cid: Option<i64>,

    /// Owning company name
    #[serde(default)]
    pub cname: Option<String>,

    /// Deployed version
    #[serde(default)]
    pub version: Option<String>,
}

impl Application {
    /// Minimal application, mostly useful for tests and fixtures
    pub fn new(id: i64, enabled: bool) -> Self {
        Self {
            id: ApplicationId(id),
            enabled,
            name: None,
            ip: None,
            rest_port: None,
            ws_port: None,
            prof_port: None,
            zid: None,
            desc: None,
            cid: None,
            cname: None,
            version: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the probe endpoint
    pub fn with_endpoint(mut self, ip: impl Into<String>, rest_port: u16) -> Self {
        self.ip = Some(ip.into());
        self.rest_port = Some(rest_port);
        self
    }

    /// Name to show on cards and tables
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("app-{}", self.id),
        }
    }

    /// Whether the dashboard renders a card (and runs a probe) for this application
    pub fn is_monitored(&self) -> bool {
        self.id.is_assigned() && self.enabled
    }

    /// REST endpoint the backend forwards probes and detail queries to
    pub fn endpoint(&self) -> Option<(&str, u16)> {
        match (self.ip.as_deref(), self.rest_port) {
            (Some(ip), Some(port)) if !ip.is_empty() => Some((ip, port)),
            _ => None,
        }
    }
}

/// Read-only detail an application exposes through the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppResource {
    /// Build and configuration summary (`app/{aid}/info`)
    #[default]
    Info,
    /// Runtime status (`app/{aid}/status`)
    Status,
    /// Recent log lines (`app/{aid}/logs`)
    Logs,
}

impl AppResource {
    /// Last path segment of the backend route
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Status => "status",
            Self::Logs => "logs",
        }
    }
}

impl fmt::Display for AppResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for AppResource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "status" => Ok(Self::Status),
            "logs" => Ok(Self::Logs),
            other => Err(format!("unknown resource `{other}`, expected info, status or logs")),
        }
    }
}

/// Count of applications with `enabled == true`
pub fn enabled_count(applications: &[Application]) -> usize {
    applications.iter().filter(|app| app.enabled).count()
}

/// Accepts `1`/`0`, `true`/`false`, `"1"`/`"0"` or null for the `enable` flag
fn deserialize_enable<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Flag::Bool(b)) => Ok(b),
        Some(Flag::Int(i)) => Ok(i == 1),
        Some(Flag::Text(s)) => match s.trim() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            other => Err(de::Error::custom(format!("invalid enable flag `{other}`"))),
        },
    }
}
