//! Login, logout and validation against a mock backend

use std::time::Duration;

use aamonitor::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    let base = Url::parse(&format!("{}/", server.uri())).unwrap();
    ApiClient::with_timeout(base, Duration::from_secs(2)).unwrap()
}

fn store(server: &MockServer) -> AuthStore {
    AuthStore::new(client(server), SessionContext::in_memory())
}

fn login_success() -> serde_json::Value {
    json!({
        "isSuccess": true,
        "status_code": 200,
        "message": "Login successful",
        "data": {
            "auth_token": "tok-123",
            "_user_data": {"userName": "operator", "userId": 4, "userType": 1, "cid": "*"}
        }
    })
}

#[tokio::test]
async fn test_login_persists_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"userName": "operator", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_success()))
        .expect(1)
        .mount(&server)
        .await;

    let auth = store(&server);
    let outcome = auth.login("operator", "pw").await.unwrap();

    assert_eq!(outcome.token, "tok-123");
    assert_eq!(outcome.user_type, Some(UserType::Id(1)));
    assert!(auth.is_authenticated());
    assert_eq!(auth.session().token().as_deref(), Some("tok-123"));
    assert_eq!(auth.current_user_type(), Some(UserType::Id(1)));

    let session = auth.session().current().unwrap();
    assert_eq!(session.user.user_name.as_deref(), Some("operator"));
}

#[tokio::test]
async fn test_login_accepts_bare_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth_token": "bare",
            "_user_data": {"userType": "admin"}
        })))
        .mount(&server)
        .await;

    let outcome = store(&server).login("operator", "pw").await.unwrap();
    assert_eq!(outcome.user_type, Some(UserType::Name("admin".to_string())));
}

#[tokio::test]
async fn test_login_accepts_data_only_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"auth_token": "tok", "_user_data": {"userType": 1}}
        })))
        .mount(&server)
        .await;

    let auth = store(&server);
    let outcome = auth.login("operator", "pw").await.unwrap();
    assert_eq!(outcome.token, "tok");
    assert_eq!(outcome.user_type, Some(UserType::Id(1)));
    assert!(auth.is_authenticated());
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let auth = store(&server);
    let err = auth.login("operator", "wrong").await.unwrap_err();

    assert_eq!(err.reason, AuthFailure::InvalidCredentials);
    assert!(!auth.is_authenticated());
    assert!(auth.session().current().is_none());
}

#[tokio::test]
async fn test_missing_token_is_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isSuccess": true,
            "status_code": 200,
            "data": {"_user_data": {"userType": 1}}
        })))
        .mount(&server)
        .await;

    let err = store(&server).login("operator", "pw").await.unwrap_err();
    assert_eq!(err.reason, AuthFailure::InvalidCredentials);
}

#[tokio::test]
async fn test_unparsable_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let auth = store(&server);
    let err = auth.login("operator", "pw").await.unwrap_err();
    assert_eq!(err.reason, AuthFailure::MalformedResponse);
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_server_error_is_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = store(&server).login("operator", "pw").await.unwrap_err();
    assert_eq!(err.reason, AuthFailure::NetworkFailure);
}

#[tokio::test]
async fn test_empty_credentials_skip_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_success()))
        .expect(0)
        .mount(&server)
        .await;

    let auth = store(&server);
    assert_eq!(
        auth.login("   ", "pw").await.unwrap_err().reason,
        AuthFailure::InvalidCredentials
    );
    assert_eq!(
        auth.login("operator", "").await.unwrap_err().reason,
        AuthFailure::InvalidCredentials
    );
}

#[tokio::test]
async fn test_logout_clears_session_even_when_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_success()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let auth = store(&server);
    auth.login("operator", "pw").await.unwrap();
    auth.logout().await.unwrap();

    assert!(!auth.is_authenticated());
    assert!(auth.session().current().is_none());
}

#[tokio::test]
async fn test_validate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_success()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"isSuccess": true, "status_code": 200, "data": null})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/validate"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let auth = store(&server);
    assert!(!auth.validate().await.unwrap());

    auth.login("operator", "pw").await.unwrap();
    assert!(auth.validate().await.unwrap());

    // Second call hits the 401 mock and drops the session
    assert!(!auth.validate().await.unwrap());
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_unwritable_session_is_storage_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_success()))
        .mount(&server)
        .await;

    // The session file's parent is a regular file, so nothing can be written
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let file = blocker.join("session.json");

    let auth = AuthStore::new(client(&server), SessionContext::new(aamonitor::session::FileStorage::new(&file)));
    let err = auth.login("operator", "pw").await.unwrap_err();

    assert_eq!(err.reason, AuthFailure::StorageFailure);
    assert!(err.detail.contains("could not persist session"));
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_file_session_survives_reload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_success()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let auth = AuthStore::new(client(&server), SessionContext::new(aamonitor::session::FileStorage::new(&file)));
    auth.login("operator", "pw").await.unwrap();

    let reloaded = SessionContext::new(aamonitor::session::FileStorage::new(&file));
    assert_eq!(reloaded.token().as_deref(), Some("tok-123"));
    assert_eq!(reloaded.user_type(), Some(UserType::Id(1)));
}
