//! UI rendering for the TUI

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

use super::app::{ActiveTab, App, DetailView, LoginField, NotificationLevel, Screen, CARD_COLUMNS};
use super::components::{AppCard, ServiceCard, CARD_HEIGHT};
use crate::models::PLATFORM_SERVICES;
use crate::status::StatusSummary;

/// Banner on the login screen
pub const TITLE: &str = "AGENT ASSIST MONITOR";
/// Body of the Apps tab without cards
pub const NO_APPS_FOUND: &str = "No Apps found";

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &App) {
    let background = Block::default().style(Style::default().bg(app.theme.background()));
    frame.render_widget(background, frame.size());

    match app.screen {
        Screen::Login => draw_login(frame, app),
        Screen::Dashboard => draw_dashboard(frame, app),
    }
}

fn draw_login(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let form = &app.login;
    let area = centered_rect(60, 70, frame.size());

    let block = Block::default()
        .title(Span::styled(
            format!(" {TITLE} "),
            Style::default().fg(theme.accent()).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Error
            Constraint::Length(3), // User name
            Constraint::Length(3), // Password
            Constraint::Length(2), // Button
            Constraint::Min(0),
            Constraint::Length(1), // Hints
        ])
        .split(inner);

    if let Some(error) = &form.error {
        let error = Paragraph::new(error.as_str())
            .style(Style::default().fg(theme.down()))
            .wrap(Wrap { trim: true });
        frame.render_widget(error, chunks[0]);
    }

    let field = |title: &'static str, value: String, focused: bool| {
        let border = if focused { theme.accent() } else { theme.muted() };
        Paragraph::new(value).style(Style::default().fg(theme.text())).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
    };
    frame.render_widget(
        field("User Name", form.user_name.clone(), form.focus == LoginField::UserName),
        chunks[1],
    );
    frame.render_widget(
        field("Password", form.masked_password(), form.focus == LoginField::Password),
        chunks[2],
    );

    let button = if form.submitting { "Logging In..." } else { "[ Login ]" };
    let button = Paragraph::new(button)
        .style(Style::default().fg(theme.accent()).bold())
        .alignment(Alignment::Center);
    frame.render_widget(button, chunks[3]);

    let hints = Paragraph::new("Tab Switch field | Enter Login | Ctrl+R Show password | Ctrl+C Quit")
        .style(Style::default().fg(theme.muted()))
        .alignment(Alignment::Center);
    frame.render_widget(hints, chunks[5]);
}

fn draw_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header + tabs
            Constraint::Min(6),    // Cards
            Constraint::Length(1), // Status bar
        ])
        .split(frame.size());

    draw_header(frame, app, chunks[0]);
    match app.active_tab {
        ActiveTab::Apps => draw_apps(frame, app, chunks[1]),
        ActiveTab::Services => draw_services(frame, app, chunks[1]),
    }
    draw_status_bar(frame, app, chunks[2]);

    if let Some(view) = &app.details {
        draw_details_overlay(frame, app, view);
    }
    if app.show_help {
        draw_help_overlay(frame, app);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(theme.muted()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(30)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(44)])
        .split(rows[1]);

    let path = match app.active_tab {
        ActiveTab::Apps => "apps",
        ActiveTab::Services => "services",
    };
    let breadcrumb = Line::from(vec![
        Span::styled(TITLE, Style::default().fg(theme.accent()).bold()),
        Span::styled(format!("  / dashboard / {path}"), Style::default().fg(theme.muted())),
    ]);
    frame.render_widget(Paragraph::new(breadcrumb), top[0]);

    let user = match (&app.user_name, &app.user_type) {
        (Some(name), Some(kind)) => format!("{name} ({kind})"),
        (Some(name), None) => name.clone(),
        _ => String::new(),
    };
    let user = Paragraph::new(user)
        .style(Style::default().fg(theme.text()))
        .alignment(Alignment::Right);
    frame.render_widget(user, top[1]);

    let titles: Vec<Line> = ["Apps", "Services"]
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let style = if i == app.active_tab.index() {
                Style::default().fg(theme.accent()).bold()
            } else {
                Style::default().fg(theme.muted())
            };
            Line::from(format!(" {} {} ", i + 1, t)).style(style)
        })
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.active_tab.index())
        .highlight_style(Style::default().fg(theme.accent()).add_modifier(Modifier::UNDERLINED))
        .divider(symbols::line::VERTICAL);
    frame.render_widget(tabs, bottom[0]);

    let summary = match app.active_tab {
        ActiveTab::Apps => app.summary(),
        ActiveTab::Services => app.service_summary(),
    };
    let counts = Paragraph::new(counts_line(app, summary)).alignment(Alignment::Right);
    frame.render_widget(counts, bottom[1]);
}

fn counts_line(app: &App, summary: StatusSummary) -> Line<'static> {
    let theme = &app.theme;
    Line::from(vec![
        Span::styled(format!("All {}", summary.total), Style::default().fg(theme.text())),
        Span::raw("  "),
        Span::styled(format!("▲ Active {}", summary.active), Style::default().fg(theme.live())),
        Span::raw("  "),
        Span::styled(format!("▼ Inactive {}", summary.inactive), Style::default().fg(theme.down())),
    ])
}

fn draw_apps(frame: &mut Frame, app: &App, area: Rect) {
    if app.applications.is_empty() {
        let message = if app.loading { "Loading applications..." } else { NO_APPS_FOUND };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(app.theme.muted()))
            .alignment(Alignment::Center);
        frame.render_widget(empty, centered_rect(100, 20, area));
        return;
    }

    let cards: Vec<_> = app.cards().collect();
    let visible_rows = usize::from((area.height / CARD_HEIGHT).max(1));
    let selected_row = app.selected / CARD_COLUMNS;
    let first_row = selected_row.saturating_sub(visible_rows - 1);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(area);

    for (slot, row) in cards.chunks(CARD_COLUMNS).skip(first_row).take(visible_rows).enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, CARD_COLUMNS as u32); CARD_COLUMNS])
            .split(row_areas[slot]);

        for (col, application) in row.iter().enumerate() {
            let index = (first_row + slot) * CARD_COLUMNS + col;
            AppCard::new(application, app.liveness(application.id), &app.theme)
                .selected(index == app.selected)
                .render(frame, cells[col]);
        }
    }
}

fn draw_services(frame: &mut Frame, app: &App, area: Rect) {
    let visible_rows = usize::from((area.height / CARD_HEIGHT).max(1));
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(area);

    for (slot, row) in PLATFORM_SERVICES.chunks(CARD_COLUMNS).take(visible_rows).enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, CARD_COLUMNS as u32); CARD_COLUMNS])
            .split(row_areas[slot]);
        for (col, service) in row.iter().enumerate() {
            ServiceCard::new(service, &app.theme).render(frame, cells[col]);
        }
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let left = match app.notification() {
        Some(note) => {
            let color = match note.level {
                NotificationLevel::Info => theme.accent(),
                NotificationLevel::Error => theme.down(),
            };
            Paragraph::new(note.message.as_str()).style(Style::default().fg(color).bold())
        }
        None => Paragraph::new("? Help | Tab Switch | r Refresh | L Logout | q Quit")
            .style(Style::default().fg(theme.muted())),
    };
    frame.render_widget(left, chunks[0]);

    let right_text = if app.loading {
        "Refreshing...".to_string()
    } else {
        match app.last_update {
            Some(at) => format!("Last: {}", format_elapsed(at.elapsed())),
            None => String::new(),
        }
    };
    let right = Paragraph::new(right_text)
        .style(Style::default().fg(theme.muted()))
        .alignment(Alignment::Right);
    frame.render_widget(right, chunks[1]);
}

fn draw_help_overlay(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let area = centered_rect(60, 70, frame.size());
    frame.render_widget(Clear, area);

    let section = Style::default().fg(theme.accent());
    let help_text = vec![
        Line::from("Keyboard Shortcuts").style(Style::default().fg(theme.accent()).bold()),
        Line::from(""),
        Line::from("Navigation:").style(section),
        Line::from("  Tab / 1 / 2        Switch between Apps and Services"),
        Line::from("  ←↓↑→ or h/j/k/l    Move card selection"),
        Line::from("  Enter              Show application info"),
        Line::from(""),
        Line::from("Data:").style(section),
        Line::from("  r                  Refresh applications"),
        Line::from(""),
        Line::from("Appearance:").style(section),
        Line::from("  t                  Toggle light/dark theme"),
        Line::from("  c                  Cycle accent colour"),
        Line::from(""),
        Line::from("General:").style(section),
        Line::from("  ?                  Toggle this help"),
        Line::from("  L                  Log out"),
        Line::from("  q / Ctrl+C         Quit"),
        Line::from(""),
        Line::from("Press any key to close").style(Style::default().fg(theme.muted()).italic()),
    ];

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(theme.text()).bg(theme.background()))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent())),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help, area);
}

fn draw_details_overlay(frame: &mut Frame, app: &App, view: &DetailView) {
    let theme = &app.theme;
    let area = centered_rect(70, 70, frame.size());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Endpoint  ", Style::default().fg(theme.muted())),
            Span::raw(view.endpoint.clone()),
        ]),
        Line::from(""),
    ];
    match &view.info {
        None => lines.push(Line::from("Loading...").style(Style::default().fg(theme.muted()).italic())),
        Some(Ok(info)) => {
            let pretty = serde_json::to_string_pretty(info).unwrap_or_else(|_| info.to_string());
            lines.extend(pretty.lines().map(|line| Line::from(line.to_string())));
        }
        Some(Err(e)) => lines.push(Line::from(e.clone()).style(Style::default().fg(theme.down()))),
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Press any key to close").style(Style::default().fg(theme.muted()).italic()));

    let details = Paragraph::new(lines)
        .style(Style::default().fg(theme.text()).bg(theme.background()))
        .block(
            Block::default()
                .title(format!("{} info", view.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent())),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(details, area);
}

fn format_elapsed(elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else {
        format!("{}m ago", secs / 60)
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
