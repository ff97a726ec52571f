//! Per-application liveness probing
//!
//! Each monitored application gets its own task that probes on a fixed
//! interval and forwards the result to a single consumer channel. Tasks are
//! cancelled when the application list is replaced or the monitor shuts down,
//! so no report arrives after the consumer is gone.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::config::MonitorConfig;
use crate::models::{Application, ApplicationId};
use crate::session::SessionContext;

/// Result of one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessReport {
    /// Probed application
    pub id: ApplicationId,
    /// Whether it answered as live
    pub live: bool,
}

/// Determines whether an application is currently live
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Probe one application; failures count as not live
    async fn check(&self, app: &Application) -> bool;
}

/// Probe through the backend's `app/{aid}/live` endpoint
#[derive(Clone, Debug)]
pub struct HttpProbe {
    client: ApiClient,
    session: SessionContext,
}

impl HttpProbe {
    /// Probe with the token held by `session`
    pub fn new(client: ApiClient, session: SessionContext) -> Self {
        Self { client, session }
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    async fn check(&self, app: &Application) -> bool {
        let Some(token) = self.session.token() else {
            return false;
        };
        match self.client.check_live(&token, app).await {
            Ok(live) => live,
            Err(e) => {
                debug!(aid = %app.id, error = %e, "Probe failed");
                false
            }
        }
    }
}

/// Probe an application with an upper time bound
pub async fn probe_with_timeout(probe: &dyn LivenessProbe, app: &Application, limit: Duration) -> bool {
    match tokio::time::timeout(limit, probe.check(app)).await {
        Ok(live) => live,
        Err(_) => {
            warn!(aid = %app.id, timeout = ?limit, "Probe timed out");
            false
        }
    }
}

/// Probe every monitored application once, concurrently
pub async fn probe_all(
    probe: &dyn LivenessProbe,
    applications: &[Application],
    limit: Duration,
) -> Vec<LivenessReport> {
    let checks = applications
        .iter()
        .filter(|app| app.is_monitored())
        .map(|app| async move {
            LivenessReport {
                id: app.id,
                live: probe_with_timeout(probe, app, limit).await,
            }
        });
    join_all(checks).await
}

/// Spawns and cancels the periodic probe tasks
pub struct LivenessMonitor<E> {
    probe: Arc<dyn LivenessProbe>,
    interval: Duration,
    probe_timeout: Duration,
    tx: mpsc::UnboundedSender<E>,
    root: CancellationToken,
    current: CancellationToken,
}

impl<E> LivenessMonitor<E>
where
    E: From<LivenessReport> + Send + 'static,
{
    /// Create a monitor that sends reports into `tx`
    pub fn new(probe: Arc<dyn LivenessProbe>, config: &MonitorConfig, tx: mpsc::UnboundedSender<E>) -> Self {
        let root = CancellationToken::new();
        let current = root.child_token();
        Self {
            probe,
            interval: config.interval,
            probe_timeout: config.probe_timeout,
            tx,
            root,
            current,
        }
    }

    /// Replace the watched set; previous tasks are cancelled
    ///
    /// Returns the number of applications now being probed.
    pub fn watch(&mut self, applications: &[Application]) -> usize {
        self.current.cancel();
        self.current = self.root.child_token();

        let mut watched = 0;
        for app in applications.iter().filter(|app| app.is_monitored()) {
            tokio::spawn(probe_loop(
                self.probe.clone(),
                app.clone(),
                self.interval,
                self.probe_timeout,
                self.tx.clone(),
                self.current.clone(),
            ));
            watched += 1;
        }
        debug!(watched, "Liveness monitor updated");
        watched
    }

    /// Stop every probe task
    pub fn shutdown(&self) {
        self.root.cancel();
    }
}

impl<E> Drop for LivenessMonitor<E> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

async fn probe_loop<E>(
    probe: Arc<dyn LivenessProbe>,
    app: Application,
    interval: Duration,
    limit: Duration,
    tx: mpsc::UnboundedSender<E>,
    cancel: CancellationToken,
) where
    E: From<LivenessReport> + Send + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let live = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            live = probe_with_timeout(probe.as_ref(), &app, limit) => live,
        };

        if tx.send(E::from(LivenessReport { id: app.id, live })).is_err() {
            break;
        }
    }
    debug!(aid = %app.id, "Probe task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Reports even ids as live, optionally stalling first
    struct FakeProbe {
        delay: Duration,
    }

    #[async_trait]
    impl LivenessProbe for FakeProbe {
        async fn check(&self, app: &Application) -> bool {
            tokio::time::sleep(self.delay).await;
            app.id.0 % 2 == 0
        }
    }

    fn config(interval_ms: u64, timeout_ms: u64) -> MonitorConfig {
        MonitorConfig {
            interval: Duration::from_millis(interval_ms),
            probe_timeout: Duration::from_millis(timeout_ms),
        }
    }

    fn fleet() -> Vec<Application> {
        vec![
            Application::new(1, true),
            Application::new(2, true),
            Application::new(3, false),
            Application::new(0, true),
        ]
    }

    #[tokio::test]
    async fn test_only_monitored_apps_are_probed() {
        let (tx, mut rx) = mpsc::unbounded_channel::<LivenessReport>();
        let probe = Arc::new(FakeProbe { delay: Duration::ZERO });
        let mut monitor = LivenessMonitor::new(probe, &config(20, 500), tx);

        assert_eq!(monitor.watch(&fleet()), 2);

        let mut seen = HashSet::new();
        while seen.len() < 2 {
            let report = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(report.id == ApplicationId(1) || report.id == ApplicationId(2));
            assert_eq!(report.live, report.id == ApplicationId(2));
            seen.insert(report.id);
        }
        monitor.shutdown();
    }

    #[tokio::test]
    async fn test_slow_probe_reports_not_live() {
        let (tx, mut rx) = mpsc::unbounded_channel::<LivenessReport>();
        let probe = Arc::new(FakeProbe {
            delay: Duration::from_secs(10),
        });
        let mut monitor = LivenessMonitor::new(probe, &config(1_000, 30), tx);
        monitor.watch(&[Application::new(2, true)]);

        let report = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            report,
            LivenessReport {
                id: ApplicationId(2),
                live: false
            }
        );
    }

    #[tokio::test]
    async fn test_no_reports_after_teardown() {
        let (tx, mut rx) = mpsc::unbounded_channel::<LivenessReport>();
        let probe = Arc::new(FakeProbe { delay: Duration::ZERO });
        let mut monitor = LivenessMonitor::new(probe, &config(10, 500), tx);
        monitor.watch(&fleet());
        drop(monitor);

        // Every sender is dropped once the tasks observe cancellation
        let drained = tokio::time::timeout(Duration::from_secs(2), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }

    #[tokio::test]
    async fn test_probe_all_runs_once_per_monitored_app() {
        let probe = FakeProbe { delay: Duration::ZERO };
        let mut reports = probe_all(&probe, &fleet(), Duration::from_millis(200)).await;
        reports.sort_by_key(|r| r.id);
        assert_eq!(
            reports,
            vec![
                LivenessReport {
                    id: ApplicationId(1),
                    live: false
                },
                LivenessReport {
                    id: ApplicationId(2),
                    live: true
                },
            ]
        );
    }
}
