//! Terminal dashboard
//!
//! Login screen, application cards with live status, and the platform
//! services overview.

mod app;
mod components;
mod event;
mod runtime;
mod theme;
mod ui;

pub use app::{Action, ActiveTab, App, DetailView, LoginField, LoginForm, Notification, NotificationLevel, Screen};
pub use event::{Event, EventHandler};
pub use runtime::Dashboard;
pub use theme::{parse_hex_color, Theme, ACCENT_PALETTE};
