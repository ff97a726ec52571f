//! Error types for aamonitor

use std::fmt;

use thiserror::Error;

/// Result type alias using aamonitor's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for aamonitor operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Application directory or liveness request failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Session storage error
    #[error("Session error: {0}")]
    Session(String),

    /// Terminal error
    #[error("Terminal error: {0}")]
    Tui(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a session error
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create a terminal error
    pub fn tui(msg: impl fmt::Display) -> Self {
        Self::Tui(msg.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Why a login attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Backend rejected the credentials, or they were empty
    InvalidCredentials,
    /// Transport error, timeout or unexpected status
    NetworkFailure,
    /// Backend answered but the body could not be understood
    MalformedResponse,
    /// Backend accepted the login but the session could not be saved locally
    StorageFailure,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidCredentials => "invalid credentials",
            Self::NetworkFailure => "network failure",
            Self::MalformedResponse => "malformed response",
            Self::StorageFailure => "session storage failure",
        };
        f.write_str(s)
    }
}

/// Login error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Authentication failed ({reason}): {detail}")]
pub struct AuthError {
    /// Failure category
    pub reason: AuthFailure,
    /// Human readable detail
    pub detail: String,
}

impl AuthError {
    /// Credentials rejected
    pub fn invalid_credentials(detail: impl Into<String>) -> Self {
        Self {
            reason: AuthFailure::InvalidCredentials,
            detail: detail.into(),
        }
    }

    /// Transport failure or timeout
    pub fn network(detail: impl Into<String>) -> Self {
        Self {
            reason: AuthFailure::NetworkFailure,
            detail: detail.into(),
        }
    }

    /// Unreadable login body
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            reason: AuthFailure::MalformedResponse,
            detail: detail.into(),
        }
    }

    /// Session could not be saved locally
    pub fn storage(detail: impl Into<String>) -> Self {
        Self {
            reason: AuthFailure::StorageFailure,
            detail: detail.into(),
        }
    }
}

/// Why a backend fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// Missing token, or the backend rejected it
    Unauthorized,
    /// Transport error or timeout
    NetworkFailure,
    /// Non-success status or unreadable body
    ServerError,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unauthorized => "unauthorized",
            Self::NetworkFailure => "network failure",
            Self::ServerError => "server error",
        };
        f.write_str(s)
    }
}

/// Directory or probe request error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Request failed ({reason}): {detail}")]
pub struct FetchError {
    /// Failure category
    pub reason: FetchFailure,
    /// Human readable detail
    pub detail: String,
}

impl FetchError {
    /// Missing or rejected token
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self {
            reason: FetchFailure::Unauthorized,
            detail: detail.into(),
        }
    }

    /// Transport failure or timeout
    pub fn network(detail: impl Into<String>) -> Self {
        Self {
            reason: FetchFailure::NetworkFailure,
            detail: detail.into(),
        }
    }

    /// Non-success status or unreadable body
    pub fn server(detail: impl Into<String>) -> Self {
        Self {
            reason: FetchFailure::ServerError,
            detail: detail.into(),
        }
    }

    /// Whether the session should be dropped because of this error
    pub fn is_unauthorized(&self) -> bool {
        self.reason == FetchFailure::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display_names_reason() {
        let err = AuthError::invalid_credentials("missing auth_token");
        assert_eq!(
            err.to_string(),
            "Authentication failed (invalid credentials): missing auth_token"
        );
    }

    #[test]
    fn test_fetch_error_converts_into_crate_error() {
        let err: Error = FetchError::unauthorized("no token").into();
        assert!(matches!(err, Error::Fetch(ref e) if e.is_unauthorized()));
    }
}
