//! Terminal setup and the dashboard event loop

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::app::{Action, App};
use super::event::{Event, EventHandler};
use super::theme::Theme;
use super::ui;
use crate::auth::AuthStore;
use crate::config::{MonitorConfig, TuiConfig};
use crate::directory::ApplicationDirectory;
use crate::error::{Error, FetchError, Result};
use crate::models::AppResource;
use crate::monitor::{LivenessMonitor, LivenessProbe};

type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Everything the dashboard talks to
pub struct Dashboard {
    auth: AuthStore,
    directory: ApplicationDirectory,
    probe: Arc<dyn LivenessProbe>,
    monitor: MonitorConfig,
    tui: TuiConfig,
}

impl Dashboard {
    /// Wire the dashboard to its collaborators
    pub fn new(
        auth: AuthStore,
        directory: ApplicationDirectory,
        probe: Arc<dyn LivenessProbe>,
        monitor: MonitorConfig,
        tui: TuiConfig,
    ) -> Self {
        Self {
            auth,
            directory,
            probe,
            monitor,
            tui,
        }
    }

    /// Run until the user quits; the terminal is restored on every exit path
    pub async fn run(self) -> Result<()> {
        let theme = Theme::new(&self.tui.accent_color, self.tui.light_theme)?;
        let mut app = App::new(theme);

        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal, &mut app).await;
        let restored = restore_terminal(&mut terminal);

        result.and(restored)
    }

    async fn event_loop(&self, terminal: &mut CrosstermTerminal, app: &mut App) -> Result<()> {
        let mut events = EventHandler::new(self.tui.refresh_rate_ms);
        events.start();
        let tx = events.sender();
        let mut monitor = LivenessMonitor::new(self.probe.clone(), &self.monitor, tx.clone());

        let startup = app.resume(self.auth.session().current());
        self.dispatch(startup, app, &tx, &mut monitor);

        while !app.should_quit {
            terminal.draw(|frame| ui::draw(frame, app)).map_err(Error::tui)?;

            let Some(event) = events.next().await else {
                break;
            };
            let action = match event {
                Event::Key(key) => app.handle_key(key.code, key.modifiers),
                Event::LoginFinished(result) => app.on_login_finished(result),
                Event::ApplicationsLoaded { generation, result } => app.on_applications_loaded(generation, result),
                Event::DetailsLoaded { request, result } => app.on_details_loaded(request, result),
                Event::Liveness(report) => {
                    app.on_liveness(report);
                    Action::None
                }
                Event::LoggedOut => {
                    debug!("Backend logout finished");
                    Action::None
                }
                Event::Tick | Event::Resize(_, _) => Action::None,
            };
            self.dispatch(action, app, &tx, &mut monitor);
        }

        monitor.shutdown();
        Ok(())
    }

    fn dispatch(
        &self,
        action: Action,
        app: &App,
        tx: &UnboundedSender<Event>,
        monitor: &mut LivenessMonitor<Event>,
    ) {
        match action {
            Action::None | Action::Quit => {}
            Action::SubmitLogin { user_name, password } => {
                let auth = self.auth.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = auth.login(&user_name, &password).await;
                    let _ = tx.send(Event::LoginFinished(result));
                });
            }
            Action::RefreshApplications { generation } => {
                let directory = self.directory.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = directory.list_applications().await;
                    let _ = tx.send(Event::ApplicationsLoaded { generation, result });
                });
            }
            Action::LoadDetails { id, request } => {
                let target = app.applications.iter().find(|a| a.id == id).cloned();
                let directory = self.directory.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = match target {
                        Some(target) => directory.application_detail(&target, AppResource::Info).await,
                        None => Err(FetchError::server(format!("application {id} is no longer listed"))),
                    };
                    let _ = tx.send(Event::DetailsLoaded { request, result });
                });
            }
            Action::WatchApplications => {
                let watched = monitor.watch(&app.applications);
                info!(watched, "Monitoring applications");
            }
            Action::Logout => {
                monitor.watch(&[]);
                let auth = self.auth.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = auth.logout().await {
                        warn!(error = %e, "Logout failed");
                    }
                    let _ = tx.send(Event::LoggedOut);
                });
            }
            Action::ClearSession => {
                monitor.watch(&[]);
                if let Err(e) = self.auth.session().clear() {
                    warn!(error = %e, "Failed to clear session");
                }
            }
        }
    }
}

fn setup_terminal() -> Result<CrosstermTerminal> {
    enable_raw_mode().map_err(Error::tui)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(Error::tui)?;
    Terminal::new(CrosstermBackend::new(stdout)).map_err(Error::tui)
}

fn restore_terminal(terminal: &mut CrosstermTerminal) -> Result<()> {
    disable_raw_mode().map_err(Error::tui)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(Error::tui)?;
    terminal.show_cursor().map_err(Error::tui)
}
