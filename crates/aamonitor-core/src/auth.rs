//! Session/auth store: login, logout and token validation over an injected session

use tracing::{error, info, warn};

use crate::client::ApiClient;
use crate::error::{AuthError, FetchError, Result};
use crate::models::{Session, UserType};
use crate::session::SessionContext;

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Issued bearer token
    pub token: String,
    /// User classification, if the backend sent one
    pub user_type: Option<UserType>,
}

/// Authentication front for the session context
#[derive(Clone, Debug)]
pub struct AuthStore {
    client: ApiClient,
    session: SessionContext,
}

impl AuthStore {
    /// Create a store writing to `session`
    pub fn new(client: ApiClient, session: SessionContext) -> Self {
        Self { client, session }
    }

    /// The session context this store writes to
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Authenticate and persist the session
    ///
    /// Nothing is persisted unless the whole exchange succeeds. Navigating
    /// to the dashboard afterwards is up to the caller.
    pub async fn login(&self, user_name: &str, password: &str) -> std::result::Result<LoginOutcome, AuthError> {
        let user_name = user_name.trim();
        if user_name.is_empty() || password.is_empty() {
            return Err(AuthError::invalid_credentials("user name and password are required"));
        }

        let session = match self.client.login(user_name, password).await {
            Ok(session) => session,
            Err(e) => {
                warn!(user = user_name, reason = %e.reason, "Login failed");
                return Err(e);
            }
        };

        if let Err(e) = self.session.establish(&session) {
            error!(user = user_name, error = %e, "Login accepted but the session could not be saved");
            return Err(AuthError::storage(format!("could not persist session: {e}")));
        }

        info!(user = user_name, user_type = ?session.user.user_type, "Login succeeded");
        Ok(outcome(session))
    }

    /// Whether a session token is present
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// User classification of the current session
    pub fn current_user_type(&self) -> Option<UserType> {
        self.session.user_type()
    }

    /// Invalidate the token on the backend and drop the local session
    ///
    /// The local session is cleared even when the backend call fails.
    pub async fn logout(&self) -> Result<()> {
        if let Some(token) = self.session.token() {
            if let Err(e) = self.client.logout(&token).await {
                warn!(error = %e, "Backend logout failed, clearing local session anyway");
            }
        }
        self.session.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Check the stored token with the backend
    ///
    /// A rejected token clears the local session.
    pub async fn validate(&self) -> std::result::Result<bool, FetchError> {
        let Some(token) = self.session.token() else {
            return Ok(false);
        };

        let valid = self.client.validate(&token).await?;
        if !valid {
            warn!("Stored token was rejected, clearing session");
            if let Err(e) = self.session.clear() {
                warn!(error = %e, "Failed to clear rejected session");
            }
        }
        Ok(valid)
    }
}

fn outcome(session: Session) -> LoginOutcome {
    LoginOutcome {
        user_type: session.user.user_type,
        token: session.token,
    }
}
