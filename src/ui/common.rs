//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, the help
//! overlay and the input/confirm prompts.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use super::centered;
use crate::app::{App, View};

/// Render the header bar: service badge, active interface, endpoint.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.governor.view();
    let badge_style = app.theme.status_style(view.badge.class);

    let mut spans = vec![
        Span::styled(" ● ", badge_style),
        Span::styled("GOVWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(view.badge.label.clone(), badge_style),
        Span::raw(" │ "),
        Span::raw(format!("{} ", app.monitor.active())),
        Span::styled(
            format!("↑{:.1} ↓{:.1} KB/s", app.monitor.stats().sent_rate, app.monitor.stats().recv_rate),
            Style::default().add_modifier(Modifier::DIM),
        ),
        Span::raw(" │ "),
        Span::styled(app.endpoint.clone(), Style::default().add_modifier(Modifier::DIM)),
    ];
    if app.policy.is_diverged() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            "policy not saved",
            Style::default().fg(app.theme.sleeping),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| Line::from(format!(" {}:{} ", i + 1, view.label())))
        .collect();

    let selected = View::ALL
        .iter()
        .position(|v| *v == app.current_view)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .padding("", "")
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Temporary notifications take precedence over the key hints.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some((msg, level)) = app.get_status_message() {
        let paragraph = Paragraph::new(format!(" {} ", msg)).style(app.theme.level_style(level));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Monitor => "[/]:interface r:refresh Tab:switch ?:help q:quit",
        View::Governor => "t:start/stop [/]:month r:refresh Tab:switch ?:help q:quit",
        View::Status => "t:start/stop Q:daily quota r:refresh ?:help q:quit",
        View::Policy => "↑↓:select Enter:edit a:add d:delete s:save R:reset ?:help q:quit",
    };

    let status = match app.monitor.last_error() {
        Some(err) if app.current_view == View::Monitor => format!(" Error: {} | {}", err, controls),
        _ => format!(" {}", controls),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ h/l Tab Switch views"),
        Line::from("  1-4         Jump to view"),
        Line::from("  ↑/↓ j/k     Move selection"),
        Line::from(""),
        section(" Monitor & Governor"),
        Line::from("  [ ]  p n    Interface / month"),
        Line::from("  t           Start or stop service"),
        Line::from("  r           Refresh now"),
        Line::from(""),
        section(" Policy"),
        Line::from("  Enter       Edit field"),
        Line::from("  a / d       Add / delete URL"),
        Line::from("  Q           Set daily quota"),
        Line::from("  s           Save"),
        Line::from("  R           Reset to defaults"),
        Line::from(""),
        section(" General"),
        Line::from("  e           Export to JSON"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);
    let help_area = centered(area, 42, 26);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Text prompt for URL entry and field edits.
pub fn render_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let Some(input) = &app.input else {
        return;
    };

    let block = Block::default()
        .title(format!(" {} ", input.prompt.title()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let lines = vec![
        Line::from(vec![
            Span::raw(input.text.clone()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(Span::styled(
            "Enter:apply Esc:cancel",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let prompt_area = centered(area, 60, 4);
    frame.render_widget(Clear, prompt_area);
    frame.render_widget(Paragraph::new(lines).block(block), prompt_area);
}

pub fn render_confirm(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Reset policy ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.stopped));

    let paragraph = Paragraph::new(vec![
        Line::from("Restore the server defaults?"),
        Line::from(Span::styled(
            "y:confirm  any other key:cancel",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ])
    .alignment(Alignment::Center)
    .block(block);

    let confirm_area = centered(area, 40, 4);
    frame.render_widget(Clear, confirm_area);
    frame.render_widget(paragraph, confirm_area);
}

pub fn render_too_small(frame: &mut Frame, area: Rect) {
    let msg = format!(
        "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
        area.width,
        area.height,
        super::MIN_WIDTH,
        super::MIN_HEIGHT
    );
    let paragraph = Paragraph::new(msg)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5.min(area.height));
    frame.render_widget(paragraph, centered);
}

/// Bordered block in the theme's style.
pub fn panel<'a>(app: &App, title: impl Into<Line<'a>>) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}
