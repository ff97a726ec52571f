//! # aamonitor
//!
//! Terminal monitor for an agent assist application fleet.
//!
//! Operators log in against the fleet backend, get the list of registered
//! applications, and watch each enabled application's liveness with
//! All/Active/Inactive counts.
//!
//! ## Architecture
//!
//! - **Session**: token and user data behind an injected storage backend
//! - **Client**: REST calls for login, the application directory and liveness
//! - **Monitor**: periodic, cancellable liveness probes per application
//! - **Status**: thread-safe aggregation of the latest liveness reports
//! - **TUI**: login screen and card dashboard
//!
//! ## Quick Start
//!
//! ```bash
//! # Log in once, the session is kept on disk
//! aamonitor login --username operator
//!
//! # One-shot liveness check
//! aamonitor status
//!
//! # Live dashboard
//! aamonitor dashboard
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod auth;
pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod monitor;
pub mod session;
pub mod status;
pub mod tui;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::auth::{AuthStore, LoginOutcome};
    pub use crate::client::ApiClient;
    pub use crate::config::Config;
    pub use crate::directory::ApplicationDirectory;
    pub use crate::error::{AuthError, AuthFailure, Error, FetchError, FetchFailure, Result};
    pub use crate::models::*;
    pub use crate::monitor::{HttpProbe, LivenessMonitor, LivenessProbe, LivenessReport};
    pub use crate::session::SessionContext;
    pub use crate::status::{StatusAggregator, StatusSummary};
}
