//! HTTP client for the monitoring REST API
//!
//! Stateless: every protected call takes the bearer token explicitly. Status
//! codes and transport failures are mapped onto [`AuthError`] and
//! [`FetchError`] here so callers never see `reqwest` types.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{AuthError, Error, FetchError, Result};
use crate::models::{
    decode_payload, envelope_success, unwrap_payload, AppResource, Application, LoginPayload, LoginRequest,
    Session,
};

const LOGIN_PATH: &str = "auth/login";
const LOGOUT_PATH: &str = "auth/logout";
const VALIDATE_PATH: &str = "auth/validate";
const APPLICATIONS_PATH: &str = "application/";

/// Body of the per-application routes (`live`, `info`, `status`, `logs`)
#[derive(Debug, Serialize)]
struct ProbeTarget<'a> {
    ip: &'a str,
    rest_port: u16,
}

/// Typed client for the monitoring backend
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Self::with_timeout(config.base_url()?, config.request_timeout)
    }

    /// Create a client for an explicit base URL
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("aamonitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, String> {
        self.base_url
            .join(path)
            .map_err(|e| format!("invalid endpoint `{path}`: {e}"))
    }

    /// Exchange credentials for a session
    pub async fn login(&self, user_name: &str, password: &str) -> std::result::Result<Session, AuthError> {
        let url = self.endpoint(LOGIN_PATH).map_err(AuthError::network)?;
        let request = LoginRequest {
            user_name: user_name.to_string(),
            password: password.to_string(),
        };

        debug!(%url, user = user_name, "Sending login request");
        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::network(describe(&e)))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(AuthError::invalid_credentials(format!("backend returned {status}")));
        }
        if !status.is_success() {
            return Err(AuthError::network(format!("backend returned {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AuthError::malformed(format!("login body is not JSON: {e}")))?;
        let payload: LoginPayload = decode_payload(body)
            .map_err(|e| AuthError::malformed(format!("unexpected login body: {e}")))?;

        let token = payload
            .auth_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::invalid_credentials("response carries no auth_token"))?;
        let user = payload
            .user_data
            .ok_or_else(|| AuthError::malformed("response carries no _user_data"))?;

        Ok(Session { token, user })
    }

    /// Invalidate a token on the backend
    pub async fn logout(&self, token: &str) -> std::result::Result<(), FetchError> {
        let response = self.get_authorized(LOGOUT_PATH, token).await?;
        check_status(&response)?;
        Ok(())
    }

    /// Check a token; the backend extends its expiry when valid
    ///
    /// Returns `Ok(false)` when the backend rejects the token.
    pub async fn validate(&self, token: &str) -> std::result::Result<bool, FetchError> {
        let response = self.get_authorized(VALIDATE_PATH, token).await?;
        match check_status(&response) {
            Ok(()) => Ok(true),
            Err(e) if e.is_unauthorized() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Fetch the application list visible to the token's owner
    pub async fn list_applications(&self, token: &str) -> std::result::Result<Vec<Application>, FetchError> {
        let response = self.get_authorized(APPLICATIONS_PATH, token).await?;
        check_status(&response)?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::server(format!("application list is not JSON: {e}")))?;

        // An envelope with `data: null` means no applications
        let payload = unwrap_payload(body);
        if payload.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(payload)
            .map_err(|e| FetchError::server(format!("unexpected application list: {e}")))
    }

    /// Ask the backend whether an application currently answers on its live endpoint
    pub async fn check_live(&self, token: &str, app: &Application) -> std::result::Result<bool, FetchError> {
        let Some((ip, rest_port)) = app.endpoint() else {
            debug!(aid = %app.id, "Application has no REST endpoint, treating as not live");
            return Ok(false);
        };

        let url = self
            .endpoint(&format!("app/{}/live", app.id))
            .map_err(FetchError::server)?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&ProbeTarget { ip, rest_port })
            .send()
            .await
            .map_err(|e| FetchError::network(describe(&e)))?;

        if let Err(e) = check_status(&response) {
            if e.is_unauthorized() {
                return Err(e);
            }
            debug!(aid = %app.id, error = %e, "Live check failed");
            return Ok(false);
        }

        // Some upstreams answer 200 with an empty body
        let body: Value = response.json().await.unwrap_or(Value::Null);
        Ok(envelope_success(&body))
    }

    /// Fetch a read-only detail document from an application
    ///
    /// The payload is whatever the application returned, unwrapped from the
    /// backend envelope.
    pub async fn app_detail(
        &self,
        token: &str,
        app: &Application,
        resource: AppResource,
    ) -> std::result::Result<Value, FetchError> {
        let Some((ip, rest_port)) = app.endpoint() else {
            return Err(FetchError::server(format!("application {} has no REST endpoint", app.id)));
        };

        let url = self
            .endpoint(&format!("app/{}/{}", app.id, resource.path_segment()))
            .map_err(FetchError::server)?;
        debug!(%url, aid = %app.id, %resource, "Requesting application detail");

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&ProbeTarget { ip, rest_port })
            .send()
            .await
            .map_err(|e| FetchError::network(describe(&e)))?;
        check_status(&response)?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::server(format!("{resource} body is not JSON: {e}")))?;
        if !envelope_success(&body) {
            return Err(FetchError::server(format!("application {} reported a {resource} failure", app.id)));
        }
        Ok(unwrap_payload(body))
    }

    async fn get_authorized(&self, path: &str, token: &str) -> std::result::Result<Response, FetchError> {
        let url = self.endpoint(path).map_err(FetchError::server)?;
        debug!(%url, "Sending authorized request");
        self.http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| FetchError::network(describe(&e)))
    }
}

fn check_status(response: &Response) -> std::result::Result<(), FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        warn!(%status, url = %response.url(), "Backend rejected the token");
        return Err(FetchError::unauthorized(format!("backend returned {status}")));
    }
    Err(FetchError::server(format!("backend returned {status}")))
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}
