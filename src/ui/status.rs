//! Status view: the four summary cards.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::common::panel;
use crate::app::App;
use crate::data::VisualClass;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::vertical([Constraint::Length(3), Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    let (label, class) = if app.summary.is_running() {
        ("Running", VisualClass::Running)
    } else {
        ("Stopped", VisualClass::Stopped)
    };
    let state = Paragraph::new(Line::from(vec![
        Span::raw("Service: "),
        Span::styled(label, app.theme.status_style(class)),
    ]))
    .block(panel(app, " Governor "));
    frame.render_widget(state, rows[0]);

    let cards = app.summary.cards();
    let items = [
        ("Speed", format!("{} KB/s", cards.speed_kbps)),
        ("Used today", cards.usage_gb.clone()),
        ("Of quota", cards.usage_percent.clone()),
        ("Uptime", cards.uptime.clone()),
    ];
    let columns = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(rows[1]);
    for ((title, value), area) in items.into_iter().zip(columns.iter()) {
        let card = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(value, Style::default().add_modifier(Modifier::BOLD))),
        ])
        .alignment(Alignment::Center)
        .block(panel(app, format!(" {} ", title)));
        frame.render_widget(card, *area);
    }
}
