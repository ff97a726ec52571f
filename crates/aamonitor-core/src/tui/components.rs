//! Reusable TUI components

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use super::theme::Theme;
use crate::models::{Application, PlatformService};

/// Rows taken by one card, borders included
pub const CARD_HEIGHT: u16 = 6;

/// Liveness as shown on a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Last probe succeeded
    Live,
    /// Last probe failed
    Down,
    /// No report yet
    Unknown,
}

impl From<Option<bool>> for Status {
    fn from(live: Option<bool>) -> Self {
        match live {
            Some(true) => Self::Live,
            Some(false) => Self::Down,
            None => Self::Unknown,
        }
    }
}

/// Status indicator (coloured dot with label)
pub struct StatusIndicator<'a> {
    status: Status,
    theme: &'a Theme,
}

impl<'a> StatusIndicator<'a> {
    /// Indicator for `status` in the given theme
    pub fn new(status: Status, theme: &'a Theme) -> Self {
        Self { status, theme }
    }

    /// Colour of the dot, also used for card borders
    pub fn color(&self) -> Color {
        match self.status {
            Status::Live => self.theme.live(),
            Status::Down => self.theme.down(),
            Status::Unknown => self.theme.muted(),
        }
    }

    /// Dot and label as one span
    pub fn to_span(&self) -> Span<'static> {
        let (symbol, label) = match self.status {
            Status::Live => ("●", "Live"),
            Status::Down => ("●", "Down"),
            Status::Unknown => ("○", "Checking"),
        };
        Span::styled(format!("{symbol} {label}"), Style::default().fg(self.color()))
    }
}

/// One application card on the Apps grid
pub struct AppCard<'a> {
    app: &'a Application,
    status: Status,
    selected: bool,
    theme: &'a Theme,
}

impl<'a> AppCard<'a> {
    /// Card for `app`; `live` is `None` until the first probe
    pub fn new(app: &'a Application, live: Option<bool>, theme: &'a Theme) -> Self {
        Self {
            app,
            status: Status::from(live),
            selected: false,
            theme,
        }
    }

    /// Highlight as the selection
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Draw into `area`
    pub fn render(self, frame: &mut Frame, area: Rect) {
        let indicator = StatusIndicator::new(self.status, self.theme);
        let border_style = if self.selected {
            Style::default().fg(self.theme.accent()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(indicator.color())
        };

        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", self.app.display_name()),
                Style::default().fg(self.theme.text()).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(if self.selected {
                BorderType::Thick
            } else {
                BorderType::Rounded
            })
            .border_style(border_style);

        let muted = Style::default().fg(self.theme.muted());
        let endpoint = match (&self.app.ip, self.app.rest_port) {
            (Some(ip), Some(port)) => format!("{ip}:{port}"),
            (Some(ip), None) => ip.clone(),
            _ => "no endpoint".to_string(),
        };

        let lines = vec![
            Line::from(indicator.to_span()),
            Line::from(Span::styled(endpoint, muted)),
            Line::from(Span::styled(
                format!("v{}", self.app.version.as_deref().unwrap_or("-")),
                muted,
            )),
            Line::from(Span::styled(self.app.cname.clone().unwrap_or_default(), muted)),
        ];

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

/// One platform service card on the Services tab
pub struct ServiceCard<'a> {
    service: &'a PlatformService,
    theme: &'a Theme,
}

impl<'a> ServiceCard<'a> {
    /// Card for one catalogue entry
    pub fn new(service: &'a PlatformService, theme: &'a Theme) -> Self {
        Self { service, theme }
    }

    /// Draw into `area`
    pub fn render(self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", self.service.name),
                Style::default().fg(self.theme.text()).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.accent()));

        let lines = vec![
            Line::from(StatusIndicator::new(Status::Live, self.theme).to_span()),
            Line::from(Span::styled(self.service.description, Style::default().fg(self.theme.muted()))),
        ];

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left).block(block), area);
    }
}
