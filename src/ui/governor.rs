//! Governor view: status and control, speed chart, monthly usage bars and
//! the service log tail.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Chart, Dataset, GraphType, List, ListItem, Paragraph},
    Frame,
};

use super::common::panel;
use crate::app::App;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::vertical([
        Constraint::Length(5),
        Constraint::Percentage(50),
        Constraint::Min(5),
    ])
    .split(area);
    let bottom = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[2]);

    render_status(frame, app, rows[0]);
    render_speed(frame, app, rows[1]);
    render_usage(frame, app, bottom[0]);
    render_logs(frame, app, bottom[1]);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.governor.view();
    let block = panel(app, " Service ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::horizontal([
        Constraint::Length(18),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ])
    .split(inner);

    let control = Paragraph::new(vec![
        Line::from(Span::styled(
            view.badge.label.clone(),
            app.theme.status_style(view.badge.class),
        )),
        Line::from(Span::styled(
            format!(" {} ", view.toggle.label),
            app.theme.button_style(view.toggle.variant),
        )),
    ]);
    frame.render_widget(control, columns[0]);

    let cards = [
        ("Speed (Mbps)", &view.cards.speed),
        ("Today", &view.cards.today),
        ("Quota", &view.cards.quota),
        ("Uptime", &view.cards.uptime),
    ];
    for ((title, value), area) in cards.iter().zip(columns.iter().skip(1)) {
        frame.render_widget(card(title, value), *area);
    }
}

fn card<'a>(title: &'a str, value: &'a str) -> Paragraph<'a> {
    Paragraph::new(vec![
        Line::from(Span::styled(title, Style::default().add_modifier(Modifier::DIM))),
        Line::from(Span::styled(value, Style::default().add_modifier(Modifier::BOLD))),
    ])
    .alignment(Alignment::Center)
}

fn render_speed(frame: &mut Frame, app: &App, area: Rect) {
    let buffer = app.governor.speed_buffer();
    let points = buffer.points(0, buffer.capacity());
    let x_max = (points.len().max(2) - 1) as f64;
    let y_max = (buffer.max_value() * 1.2).max(1.0);

    let dataset = Dataset::default()
        .name("Mbps")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.highlight))
        .data(&points);

    let labels: Vec<Span> = match (buffer.iter().next(), buffer.latest()) {
        (Some(first), Some(last)) => vec![Span::raw(first.label.clone()), Span::raw(last.label.clone())],
        _ => Vec::new(),
    };
    let axis_style = Style::default().fg(app.theme.border);

    let chart = Chart::new(vec![dataset])
        .block(panel(app, " Download speed "))
        .x_axis(Axis::default().bounds([0.0, x_max]).labels(labels).style(axis_style))
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec![Span::raw("0"), Span::raw(format!("{:.1}", y_max))])
                .style(axis_style),
        );

    frame.render_widget(chart, area);
}

fn render_usage(frame: &mut Frame, app: &App, area: Rect) {
    let month = app.governor.month();
    let name = MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    let block = panel(app, format!(" Usage: {} (MB) ", name));

    let usage = app.governor.usage();
    if usage.days.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No usage recorded",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let bars: Vec<Bar> = usage
        .days
        .iter()
        .map(|d| {
            Bar::default()
                .value(d.bytes / 1_000_000)
                .label(Line::from(d.day.to_string()))
                .style(Style::default().fg(app.theme.highlight))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(3)
        .bar_gap(1);

    frame.render_widget(chart, area);
}

fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let logs = app.governor.logs();
    // newest at the bottom, trimmed to what fits
    let rows = area.height.saturating_sub(2) as usize;
    let items: Vec<ListItem> = logs[logs.len().saturating_sub(rows)..]
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", entry.time),
                    Style::default().add_modifier(Modifier::DIM),
                ),
                Span::raw(entry.msg.clone()),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(panel(app, " Log ")), area);
}
