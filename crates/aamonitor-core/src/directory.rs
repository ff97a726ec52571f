//! Application directory client

use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::FetchError;
use crate::models::{AppResource, Application};
use crate::session::SessionContext;

/// Lists the applications visible to the current session
#[derive(Clone, Debug)]
pub struct ApplicationDirectory {
    client: ApiClient,
    session: SessionContext,
}

impl ApplicationDirectory {
    /// Create a directory reading the token from `session`
    pub fn new(client: ApiClient, session: SessionContext) -> Self {
        Self { client, session }
    }

    /// Retrieve the full application list in backend order
    ///
    /// An empty list is not an error. A missing token fails with
    /// `Unauthorized` without contacting the backend.
    pub async fn list_applications(&self) -> Result<Vec<Application>, FetchError> {
        let Some(token) = self.session.token() else {
            warn!("Listing applications without a session");
            return Err(FetchError::unauthorized("not logged in"));
        };

        let applications = self.client.list_applications(&token).await.map_err(|e| {
            warn!(reason = %e.reason, error = %e, "Retrieving applications failed");
            e
        })?;

        if applications.is_empty() {
            info!("No applications available");
        } else {
            info!(count = applications.len(), "Applications retrieved");
        }
        Ok(applications)
    }

    /// Query one application's `info`, `status` or `logs`
    ///
    /// Same failure modes as [`list_applications`](Self::list_applications).
    pub async fn application_detail(
        &self,
        app: &Application,
        resource: AppResource,
    ) -> Result<serde_json::Value, FetchError> {
        let Some(token) = self.session.token() else {
            return Err(FetchError::unauthorized("not logged in"));
        };

        self.client.app_detail(&token, app, resource).await.map_err(|e| {
            warn!(aid = %app.id, %resource, error = %e, "Application detail request failed");
            e
        })
    }
}
