//! The injected session context

use std::sync::Arc;

use tracing::{debug, warn};

use super::storage::{FileStorage, MemoryStorage, SessionStorage};
use crate::config::{SessionConfig, SessionStorageKind};
use crate::error::Result;
use crate::models::{Session, UserData, UserType};

/// Storage key of the bearer token
pub const TOKEN_KEY: &str = "authToken";

/// Storage key of the serialized user data
pub const USER_DATA_KEY: &str = "userData";

/// Owner of the authenticated session
///
/// Cheap to clone; clones share the same storage.
#[derive(Clone)]
pub struct SessionContext {
    storage: Arc<dyn SessionStorage>,
}

impl SessionContext {
    /// Create a context over any storage backend
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// Context whose session ends with the process
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Build the context selected by configuration
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        match config.storage {
            SessionStorageKind::Memory => Ok(Self::in_memory()),
            SessionStorageKind::File => {
                let path = config.file_path()?;
                debug!(path = %path.display(), "Using file session storage");
                Ok(Self::new(FileStorage::new(path)))
            }
        }
    }

    /// The current session, if a token is stored
    ///
    /// Unreadable user data does not invalidate the token; it is reported
    /// and replaced by empty user data.
    pub fn current(&self) -> Option<Session> {
        let token = self.token()?;
        let user = match self.storage.get(USER_DATA_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<UserData>(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Stored user data is unreadable");
                UserData::default()
            }),
            Ok(None) => UserData::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read stored user data");
                UserData::default()
            }
        };
        Some(Session { token, user })
    }

    /// The bearer token, if any
    pub fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read session token");
                None
            }
        }
    }

    /// Whether a token is stored
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// User classification of the current session
    pub fn user_type(&self) -> Option<UserType> {
        self.current().and_then(|s| s.user.user_type)
    }

    /// Persist a freshly issued session
    ///
    /// Either both keys are written or neither is: on failure whatever was
    /// written is rolled back.
    pub fn establish(&self, session: &Session) -> Result<()> {
        let user_json = serde_json::to_string(&session.user)?;

        let written = self
            .storage
            .set(USER_DATA_KEY, &user_json)
            .and_then(|()| self.storage.set(TOKEN_KEY, &session.token));

        if let Err(e) = written {
            warn!(error = %e, "Failed to persist session, rolling back");
            self.discard();
            return Err(e);
        }

        debug!(user_type = ?session.user.user_type, "Session established");
        Ok(())
    }

    /// Remove the session
    pub fn clear(&self) -> Result<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_DATA_KEY)?;
        debug!("Session cleared");
        Ok(())
    }

    fn discard(&self) {
        for key in [TOKEN_KEY, USER_DATA_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to remove session key");
            }
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
