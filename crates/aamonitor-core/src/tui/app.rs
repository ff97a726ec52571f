//! Dashboard state and key handling
//!
//! `App` never performs I/O. Handlers return an [`Action`] that the runtime
//! carries out, and results come back as events.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};
use serde_json::Value;

use super::theme::Theme;
use crate::auth::LoginOutcome;
use crate::error::{AuthError, AuthFailure, FetchError};
use crate::models::{Application, ApplicationId, Session, UserType, PLATFORM_SERVICES};
use crate::monitor::LivenessReport;
use crate::status::{StatusAggregator, StatusSummary};

/// Cards per row on the Apps tab
pub const CARD_COLUMNS: usize = 3;

const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Login error for rejected or empty credentials
pub const INVALID_CREDENTIALS_MESSAGE: &str = "The user name or password you entered is invalid.";
/// Login error for every other failure
pub const LOGIN_FAILED_MESSAGE: &str = "An error occurred while logging in.";
/// Toast for an empty listing
pub const NO_APPLICATIONS_MESSAGE: &str = "No applications available";
/// Toast for a failed listing
pub const FETCH_FAILED_MESSAGE: &str = "Retrieving applications failed";
/// Login screen message after the backend rejected the token
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again.";

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Credentials form
    #[default]
    Login,
    /// Cards and counts
    Dashboard,
}

/// Active tab on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTab {
    /// Application cards
    #[default]
    Apps,
    /// Platform services
    Services,
}

impl ActiveTab {
    /// The other tab
    pub fn next(self) -> Self {
        match self {
            Self::Apps => Self::Services,
            Self::Services => Self::Apps,
        }
    }

    /// Position in the tab bar
    pub fn index(self) -> usize {
        match self {
            Self::Apps => 0,
            Self::Services => 1,
        }
    }
}

/// Focused login field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    /// User name input
    #[default]
    UserName,
    /// Password input
    Password,
}

/// Login form contents
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    /// Typed user name, trimmed on submit
    pub user_name: String,
    /// Typed password
    pub password: String,
    /// Field receiving input
    pub focus: LoginField,
    /// Draw the password in clear
    pub show_password: bool,
    /// Request in flight
    pub submitting: bool,
    /// Inline error under the form
    pub error: Option<String>,
}

impl LoginForm {
    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::UserName => &mut self.user_name,
            LoginField::Password => &mut self.password,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::UserName => LoginField::Password,
            LoginField::Password => LoginField::UserName,
        };
    }

    /// Password as drawn on screen
    pub fn masked_password(&self) -> String {
        if self.show_password {
            self.password.clone()
        } else {
            "•".repeat(self.password.chars().count())
        }
    }
}

/// Severity of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Neutral message
    Info,
    /// Something failed
    Error,
}

/// Short-lived message in the status bar
#[derive(Debug, Clone)]
pub struct Notification {
    /// Severity, picks the colour
    pub level: NotificationLevel,
    /// Text shown in the status bar
    pub message: String,
    created: Instant,
}

/// Detail overlay for the selected application
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    /// Application shown
    pub id: ApplicationId,
    /// Sequence number of the request that fills this view
    pub request: u64,
    /// Display name of the application
    pub title: String,
    /// `ip:port` of the application
    pub endpoint: String,
    /// `None` while the request is in flight
    pub info: Option<Result<Value, String>>,
}

/// Side effect requested by a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do
    None,
    /// Leave the event loop
    Quit,
    /// Send the credentials to the backend
    SubmitLogin {
        /// Trimmed user name
        user_name: String,
        /// Password as typed
        password: String,
    },
    /// Fetch the application directory
    RefreshApplications {
        /// Echoed back with the result so superseded fetches can be dropped
        generation: u64,
    },
    /// Fetch `info` for one application
    LoadDetails {
        /// Application to query
        id: ApplicationId,
        /// Echoed back with the result
        request: u64,
    },
    /// Restart liveness probes for the current list
    WatchApplications,
    /// Log out on the backend and drop the session
    Logout,
    /// Drop the local session without contacting the backend
    ClearSession,
}

/// Main TUI application state
pub struct App {
    /// Whether the app should quit
    pub should_quit: bool,
    /// Screen being drawn
    pub screen: Screen,
    /// Login form state
    pub login: LoginForm,
    /// Tab on the dashboard
    pub active_tab: ActiveTab,
    /// Latest directory listing, backend order
    pub applications: Vec<Application>,
    /// Latest liveness per application
    pub statuses: StatusAggregator,
    /// Directory fetch in flight
    pub loading: bool,
    /// Index into the monitored cards
    pub selected: usize,
    /// Help overlay open
    pub show_help: bool,
    /// Colours in use
    pub theme: Theme,
    /// Logged-in user
    pub user_name: Option<String>,
    /// Logged-in user's classification
    pub user_type: Option<UserType>,
    /// Last successful directory fetch
    pub last_update: Option<Instant>,
    /// Detail overlay, open while `Some`
    pub details: Option<DetailView>,
    notification: Option<Notification>,
    /// Bumped per directory request and on logout
    fetch_generation: u64,
    detail_requests: u64,
}

impl Default for App {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl App {
    /// Create a new TUI app on the login screen
    pub fn new(theme: Theme) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Login,
            login: LoginForm::default(),
            active_tab: ActiveTab::default(),
            applications: Vec::new(),
            statuses: StatusAggregator::new(),
            loading: false,
            selected: 0,
            show_help: false,
            theme,
            user_name: None,
            user_type: None,
            last_update: None,
            details: None,
            notification: None,
            fetch_generation: 0,
            detail_requests: 0,
        }
    }

    /// Resume an existing session; returns the action to run on startup
    pub fn resume(&mut self, session: Option<Session>) -> Action {
        match session {
            Some(session) => {
                self.user_name = session.user.user_name.clone();
                self.user_type = session.user.user_type;
                self.enter_dashboard()
            }
            None => Action::None,
        }
    }

    /// Handle key events
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Action {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Action::Quit;
        }

        match self.screen {
            Screen::Login => self.handle_login_key(code, modifiers),
            Screen::Dashboard => self.handle_dashboard_key(code),
        }
    }

    fn handle_login_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Action {
        if self.login.submitting {
            return Action::None;
        }

        match code {
            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.login.show_password = !self.login.show_password;
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.login.toggle_focus(),
            KeyCode::Esc => self.login.error = None,
            KeyCode::Backspace => {
                self.login.focused_mut().pop();
            }
            KeyCode::Char(c) => {
                self.login.focused_mut().push(c);
            }
            KeyCode::Enter => return self.submit_login(),
            _ => {}
        }
        Action::None
    }

    fn submit_login(&mut self) -> Action {
        if self.login.user_name.trim().is_empty() || self.login.password.is_empty() {
            self.login.error = Some(INVALID_CREDENTIALS_MESSAGE.to_string());
            return Action::None;
        }
        self.login.error = None;
        self.login.submitting = true;
        Action::SubmitLogin {
            user_name: self.login.user_name.trim().to_string(),
            password: self.login.password.clone(),
        }
    }

    fn handle_dashboard_key(&mut self, code: KeyCode) -> Action {
        if self.show_help || self.details.is_some() {
            // Any key closes the overlay
            self.show_help = false;
            self.details = None;
            return Action::None;
        }

        match code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Action::Quit;
            }
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab | KeyCode::BackTab => self.active_tab = self.active_tab.next(),
            KeyCode::Char('1') => self.active_tab = ActiveTab::Apps,
            KeyCode::Char('2') => self.active_tab = ActiveTab::Services,
            KeyCode::Char('r') => {
                if !self.loading {
                    return self.request_applications();
                }
            }
            KeyCode::Char('t') => {
                self.theme.toggle();
                let mode = if self.theme.is_light() { "light" } else { "dark" };
                self.notify(NotificationLevel::Info, format!("Switched to {mode} theme"));
            }
            KeyCode::Char('c') => {
                self.theme.cycle_accent();
                let hex = self.theme.accent_hex().to_string();
                self.notify(NotificationLevel::Info, format!("Accent colour {hex}"));
            }
            KeyCode::Char('L') => {
                self.leave_dashboard(None);
                return Action::Logout;
            }
            KeyCode::Left | KeyCode::Char('h') => self.move_selection(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-(CARD_COLUMNS as isize)),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(CARD_COLUMNS as isize),
            KeyCode::Enter if self.active_tab == ActiveTab::Apps => return self.open_details(),
            _ => {}
        }
        Action::None
    }

    fn open_details(&mut self) -> Action {
        let Some(app) = self.selected_application() else {
            return Action::None;
        };
        let Some((ip, port)) = app.endpoint() else {
            let message = format!("{} has no REST endpoint", app.display_name());
            self.notify(NotificationLevel::Error, message);
            return Action::None;
        };

        let view = DetailView {
            id: app.id,
            request: self.detail_requests + 1,
            title: app.display_name(),
            endpoint: format!("{ip}:{port}"),
            info: None,
        };
        self.detail_requests = view.request;
        let action = Action::LoadDetails {
            id: view.id,
            request: view.request,
        };
        self.details = Some(view);
        action
    }

    fn request_applications(&mut self) -> Action {
        self.fetch_generation += 1;
        self.loading = true;
        Action::RefreshApplications {
            generation: self.fetch_generation,
        }
    }

    /// Generation of the latest directory request
    pub fn fetch_generation(&self) -> u64 {
        self.fetch_generation
    }

    fn move_selection(&mut self, delta: isize) {
        if self.active_tab != ActiveTab::Apps {
            return;
        }
        let len = self.cards().count();
        if len == 0 {
            return;
        }
        let target = self.selected as isize + delta;
        if (0..len as isize).contains(&target) {
            self.selected = target as usize;
        }
    }

    /// Completion of a login request
    pub fn on_login_finished(&mut self, result: Result<LoginOutcome, AuthError>) -> Action {
        self.login.submitting = false;
        match result {
            Ok(_) if self.screen == Screen::Dashboard => Action::None,
            Ok(outcome) => {
                self.user_name = Some(self.login.user_name.trim().to_string());
                self.user_type = outcome.user_type;
                self.login = LoginForm::default();
                self.enter_dashboard()
            }
            Err(e) => {
                let message = match e.reason {
                    AuthFailure::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE,
                    AuthFailure::NetworkFailure
                    | AuthFailure::MalformedResponse
                    | AuthFailure::StorageFailure => LOGIN_FAILED_MESSAGE,
                };
                self.login.error = Some(message.to_string());
                self.login.password.clear();
                Action::None
            }
        }
    }

    /// Switch to the dashboard; a no-op when already there
    fn enter_dashboard(&mut self) -> Action {
        if self.screen == Screen::Dashboard {
            return Action::None;
        }
        self.screen = Screen::Dashboard;
        self.active_tab = ActiveTab::Apps;
        self.request_applications()
    }

    /// Back to an empty login screen; liveness from the old session is discarded
    fn leave_dashboard(&mut self, error: Option<&str>) {
        self.screen = Screen::Login;
        self.login = LoginForm {
            error: error.map(str::to_string),
            ..LoginForm::default()
        };
        self.applications.clear();
        self.statuses = StatusAggregator::new();
        self.selected = 0;
        self.loading = false;
        self.show_help = false;
        self.details = None;
        self.user_name = None;
        self.user_type = None;
        self.last_update = None;
        // Whatever is still in flight belongs to the old session
        self.fetch_generation += 1;
    }

    /// Completion of a directory fetch
    ///
    /// Results from a superseded request are dropped.
    pub fn on_applications_loaded(
        &mut self,
        generation: u64,
        result: Result<Vec<Application>, FetchError>,
    ) -> Action {
        if generation != self.fetch_generation || self.screen != Screen::Dashboard {
            return Action::None;
        }
        self.loading = false;

        match result {
            Ok(applications) => {
                if applications.is_empty() {
                    self.notify(NotificationLevel::Info, NO_APPLICATIONS_MESSAGE);
                }
                self.applications = applications;
                self.last_update = Some(Instant::now());
                self.clamp_selection();
                Action::WatchApplications
            }
            Err(e) if e.is_unauthorized() => {
                self.leave_dashboard(Some(SESSION_EXPIRED_MESSAGE));
                Action::ClearSession
            }
            Err(_) => {
                self.notify(NotificationLevel::Error, FETCH_FAILED_MESSAGE);
                Action::None
            }
        }
    }

    /// Completion of a detail request
    ///
    /// Only the request behind the open overlay is applied.
    pub fn on_details_loaded(&mut self, request: u64, result: Result<Value, FetchError>) -> Action {
        let Some(view) = self.details.as_mut().filter(|view| view.request == request) else {
            return Action::None;
        };
        match result {
            Err(e) if e.is_unauthorized() => {
                self.leave_dashboard(Some(SESSION_EXPIRED_MESSAGE));
                Action::ClearSession
            }
            result => {
                view.info = Some(result.map_err(|e| e.to_string()));
                Action::None
            }
        }
    }

    /// A probe reported
    pub fn on_liveness(&mut self, report: LivenessReport) {
        if self.screen == Screen::Dashboard {
            self.statuses.report_status(report.id, report.live);
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.cards().count();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Applications that get a card, in listing order
    pub fn cards(&self) -> impl Iterator<Item = &Application> {
        self.applications.iter().filter(|app| app.is_monitored())
    }

    /// Application under the selection cursor
    pub fn selected_application(&self) -> Option<&Application> {
        self.cards().nth(self.selected)
    }

    /// Latest liveness of an application, `None` until its first probe
    pub fn liveness(&self, id: ApplicationId) -> Option<bool> {
        self.statuses.status_of(id)
    }

    /// Header counts for the Apps tab
    pub fn summary(&self) -> StatusSummary {
        self.statuses.summary(&self.applications)
    }

    /// Header counts for the Services tab
    pub fn service_summary(&self) -> StatusSummary {
        StatusSummary {
            total: PLATFORM_SERVICES.len(),
            active: PLATFORM_SERVICES.len(),
            inactive: 0,
        }
    }

    /// Show a toast that expires after a few seconds
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notification = Some(Notification {
            level,
            message: message.into(),
            created: Instant::now(),
        });
    }

    /// Current notification if not expired
    pub fn notification(&self) -> Option<&Notification> {
        self.notification
            .as_ref()
            .filter(|n| n.created.elapsed() < NOTIFICATION_TTL)
    }
}
