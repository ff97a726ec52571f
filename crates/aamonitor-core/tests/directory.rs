//! Application listing and liveness probing against a mock backend

use std::sync::Arc;
use std::time::Duration;

use aamonitor::monitor::probe_all;
use aamonitor::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "tok-123";

struct Backend {
    server: MockServer,
    client: ApiClient,
    session: SessionContext,
}

impl Backend {
    async fn start(logged_in: bool) -> Self {
        let server = MockServer::start().await;
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        let client = ApiClient::with_timeout(base, Duration::from_secs(2)).unwrap();
        let session = SessionContext::in_memory();
        if logged_in {
            session
                .establish(&Session {
                    token: TOKEN.to_string(),
                    user: UserData::default(),
                })
                .unwrap();
        }
        Self {
            server,
            client,
            session,
        }
    }

    fn directory(&self) -> ApplicationDirectory {
        ApplicationDirectory::new(self.client.clone(), self.session.clone())
    }

    fn probe(&self) -> HttpProbe {
        HttpProbe::new(self.client.clone(), self.session.clone())
    }

    async fn serve_list(&self, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/application/"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }
}

fn rows() -> serde_json::Value {
    json!([
        {"aid": 1, "name": "zau-fr-01", "ip": "10.0.0.1", "rest_port": 8085, "enable": 1, "cname": "Acme", "version": "1.4.0"},
        {"aid": 2, "name": "zau-de-02", "ip": "10.0.0.2", "rest_port": 8085, "enable": 0},
        {"aid": 3, "name": "zau-es-03", "ip": "10.0.0.3", "rest_port": 9000, "enable": 1}
    ])
}

#[tokio::test]
async fn test_list_applications_in_backend_order() {
    let backend = Backend::start(true).await;
    backend
        .serve_list(ResponseTemplate::new(200).set_body_json(json!({
            "isSuccess": true,
            "status_code": 200,
            "message": "ok",
            "data": rows()
        })))
        .await;

    let apps = backend.directory().list_applications().await.unwrap();
    let ids: Vec<i64> = apps.iter().map(|app| app.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(apps[0].enabled);
    assert!(!apps[1].enabled);
    assert_eq!(apps[0].cname.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn test_data_only_envelope_listing() {
    let backend = Backend::start(true).await;
    backend
        .serve_list(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"aid": 1, "enable": 1}]
        })))
        .await;

    let apps = backend.directory().list_applications().await.unwrap();
    assert_eq!(apps, vec![Application::new(1, true)]);
}

#[tokio::test]
async fn test_bare_array_and_empty_listing() {
    let backend = Backend::start(true).await;
    backend.serve_list(ResponseTemplate::new(200).set_body_json(json!([]))).await;
    assert!(backend.directory().list_applications().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_null_data_is_empty_listing() {
    let backend = Backend::start(true).await;
    backend
        .serve_list(ResponseTemplate::new(200).set_body_json(json!({
            "isSuccess": true,
            "status_code": 200,
            "data": null
        })))
        .await;
    assert!(backend.directory().list_applications().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error() {
    let backend = Backend::start(true).await;
    backend.serve_list(ResponseTemplate::new(500)).await;

    let err = backend.directory().list_applications().await.unwrap_err();
    assert_eq!(err.reason, FetchFailure::ServerError);
}

#[tokio::test]
async fn test_garbage_body_is_server_error() {
    let backend = Backend::start(true).await;
    backend
        .serve_list(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .await;

    let err = backend.directory().list_applications().await.unwrap_err();
    assert_eq!(err.reason, FetchFailure::ServerError);
}

#[tokio::test]
async fn test_rejected_token_is_unauthorized() {
    let backend = Backend::start(true).await;
    backend.serve_list(ResponseTemplate::new(401)).await;

    let err = backend.directory().list_applications().await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_no_session_sends_no_request() {
    let backend = Backend::start(false).await;
    Mock::given(method("GET"))
        .and(path("/application/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows()))
        .expect(0)
        .mount(&backend.server)
        .await;

    let err = backend.directory().list_applications().await.unwrap_err();
    assert_eq!(err.reason, FetchFailure::Unauthorized);
}

async fn serve_live(backend: &Backend, aid: i64, ip: &str, port: u16, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(format!("/app/{aid}/live")))
        .and(header("authorization", "Bearer tok-123"))
        .and(body_json(json!({"ip": ip, "rest_port": port})))
        .respond_with(response)
        .mount(&backend.server)
        .await;
}

#[tokio::test]
async fn test_probe_all_reports_each_enabled_application() {
    let backend = Backend::start(true).await;
    serve_live(
        &backend,
        1,
        "10.0.0.1",
        8085,
        ResponseTemplate::new(200).set_body_json(json!({"isSuccess": true, "status_code": 200, "data": {}})),
    )
    .await;
    serve_live(&backend, 3, "10.0.0.3", 9000, ResponseTemplate::new(502)).await;

    let apps: Vec<Application> = serde_json::from_value(rows()).unwrap();
    let mut reports = probe_all(&backend.probe(), &apps, Duration::from_secs(2)).await;
    reports.sort_by_key(|r| r.id);

    assert_eq!(
        reports,
        vec![
            LivenessReport {
                id: ApplicationId(1),
                live: true
            },
            LivenessReport {
                id: ApplicationId(3),
                live: false
            },
        ]
    );

    let statuses = StatusAggregator::new();
    for report in &reports {
        statuses.report_status(report.id, report.live);
    }
    assert_eq!(
        statuses.summary(&apps),
        StatusSummary {
            total: 3,
            active: 1,
            inactive: 1
        }
    );
}

#[tokio::test]
async fn test_upstream_failure_envelope_is_not_live() {
    let backend = Backend::start(true).await;
    serve_live(
        &backend,
        1,
        "10.0.0.1",
        8085,
        ResponseTemplate::new(200).set_body_json(json!({"isSuccess": false, "status_code": 500, "data": null})),
    )
    .await;

    let app = Application::new(1, true).with_endpoint("10.0.0.1", 8085);
    assert!(!backend.probe().check(&app).await);
}

#[tokio::test]
async fn test_slow_probe_times_out() {
    let backend = Backend::start(true).await;
    serve_live(
        &backend,
        1,
        "10.0.0.1",
        8085,
        ResponseTemplate::new(200)
            .set_body_json(json!({"isSuccess": true}))
            .set_delay(Duration::from_secs(1)),
    )
    .await;

    let apps = vec![Application::new(1, true).with_endpoint("10.0.0.1", 8085)];
    let reports = probe_all(&backend.probe(), &apps, Duration::from_millis(100)).await;
    assert!(!reports[0].live);
}

#[tokio::test]
async fn test_monitor_streams_reports() {
    let backend = Backend::start(true).await;
    serve_live(
        &backend,
        1,
        "10.0.0.1",
        8085,
        ResponseTemplate::new(200).set_body_json(json!({"isSuccess": true})),
    )
    .await;

    let (tx, mut rx) = mpsc::unbounded_channel::<LivenessReport>();
    let config = aamonitor::config::MonitorConfig {
        interval: Duration::from_millis(50),
        probe_timeout: Duration::from_secs(1),
    };
    let mut monitor = LivenessMonitor::new(Arc::new(backend.probe()), &config, tx);
    monitor.watch(&[Application::new(1, true).with_endpoint("10.0.0.1", 8085)]);

    for _ in 0..2 {
        let report = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            report,
            LivenessReport {
                id: ApplicationId(1),
                live: true
            }
        );
    }
    monitor.shutdown();
}

#[tokio::test]
async fn test_application_detail_routes() {
    let backend = Backend::start(true).await;
    for (route, payload) in [
        ("info", json!({"version": "1.4.0", "lang": "fr"})),
        ("status", json!({"sessions": 3})),
        ("logs", json!(["started", "ready"])),
    ] {
        Mock::given(method("POST"))
            .and(path(format!("/app/1/{route}")))
            .and(header("authorization", "Bearer tok-123"))
            .and(body_json(json!({"ip": "10.0.0.1", "rest_port": 8085})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": payload})))
            .expect(1)
            .mount(&backend.server)
            .await;
    }

    let app = Application::new(1, true).with_endpoint("10.0.0.1", 8085);
    let directory = backend.directory();
    assert_eq!(
        directory.application_detail(&app, AppResource::Info).await.unwrap(),
        json!({"version": "1.4.0", "lang": "fr"})
    );
    assert_eq!(
        directory.application_detail(&app, AppResource::Status).await.unwrap(),
        json!({"sessions": 3})
    );
    assert_eq!(
        directory.application_detail(&app, AppResource::Logs).await.unwrap(),
        json!(["started", "ready"])
    );
}

#[tokio::test]
async fn test_application_detail_errors() {
    let backend = Backend::start(true).await;
    Mock::given(method("POST"))
        .and(path("/app/1/info"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/app/3/info"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&backend.server)
        .await;

    let directory = backend.directory();
    let rejected = Application::new(1, true).with_endpoint("10.0.0.1", 8085);
    let failing = Application::new(3, true).with_endpoint("10.0.0.3", 9000);

    let err = directory.application_detail(&rejected, AppResource::Info).await.unwrap_err();
    assert!(err.is_unauthorized());
    let err = directory.application_detail(&failing, AppResource::Info).await.unwrap_err();
    assert_eq!(err.reason, FetchFailure::ServerError);
}

#[tokio::test]
async fn test_application_detail_without_session_sends_no_request() {
    let backend = Backend::start(false).await;
    Mock::given(method("POST"))
        .and(path("/app/1/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(0)
        .mount(&backend.server)
        .await;

    let app = Application::new(1, true).with_endpoint("10.0.0.1", 8085);
    let err = backend.directory().application_detail(&app, AppResource::Info).await.unwrap_err();
    assert!(err.is_unauthorized());
}
