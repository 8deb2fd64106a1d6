//! Monitor view: throughput chart for the active interface, its counters
//! and the interface list.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, List, ListItem, Paragraph},
    Frame,
};

use super::common::panel;
use crate::app::App;
use crate::modules::{RECV, SENT};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::horizontal([Constraint::Min(40), Constraint::Length(26)]).split(area);
    let side = Layout::vertical([Constraint::Length(6), Constraint::Min(3)]).split(columns[1]);

    render_chart(frame, app, columns[0]);
    render_counters(frame, app, side[0]);
    render_interfaces(frame, app, side[1]);
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let monitor = &app.monitor;
    let sent = monitor.points(SENT);
    let recv = monitor.points(RECV);

    let x_max = (sent.len().max(2) - 1) as f64;
    // headroom so the peak never sits on the border
    let y_max = (monitor.buffer().max_value() * 1.2).max(10.0);

    let datasets = vec![
        Dataset::default()
            .name("Sent")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(app.theme.sent))
            .data(&sent),
        Dataset::default()
            .name("Received")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(app.theme.recv))
            .data(&recv),
    ];

    // first and last visible timestamps on the x axis
    let labels = monitor.series().labels;
    let visible = &labels[labels.len().saturating_sub(sent.len())..];
    let x_labels: Vec<Span> = match (visible.first(), visible.last()) {
        (Some(first), Some(last)) => vec![Span::raw(first.clone()), Span::raw(last.clone())],
        _ => Vec::new(),
    };
    let axis_style = Style::default().fg(app.theme.border);

    let chart = Chart::new(datasets)
        .block(panel(app, format!(" {} (KB/s) ", monitor.active())))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(x_labels)
                .style(axis_style),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", y_max / 2.0)),
                    Span::raw(format!("{:.0}", y_max)),
                ])
                .style(axis_style),
        );

    frame.render_widget(chart, area);
}

fn render_counters(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.monitor.stats();
    let sent = Style::default().fg(app.theme.sent);
    let recv = Style::default().fg(app.theme.recv);

    let lines = vec![
        Line::from(vec![
            Span::styled("↑ ", sent),
            Span::raw(format!("{:.2} KB/s", stats.sent_rate)),
        ]),
        Line::from(vec![
            Span::styled("↓ ", recv),
            Span::raw(format!("{:.2} KB/s", stats.recv_rate)),
        ]),
        Line::from(vec![
            Span::styled("Σ↑ ", sent),
            Span::raw(format!("{:.2} MB", stats.total_sent)),
        ]),
        Line::from(vec![
            Span::styled("Σ↓ ", recv),
            Span::raw(format!("{:.2} MB", stats.total_recv)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(panel(app, " Counters ")), area);
}

fn render_interfaces(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.monitor.active();
    let items: Vec<ListItem> = app
        .monitor
        .interfaces()
        .iter()
        .map(|name| {
            if name == active {
                ListItem::new(format!("▸ {}", name)).style(app.theme.selected)
            } else {
                ListItem::new(format!("  {}", name))
            }
        })
        .collect();

    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            format!("  {} (fallback)", active),
            Style::default().add_modifier(Modifier::DIM),
        ))])
    } else {
        List::new(items)
    };

    frame.render_widget(list.block(panel(app, " Interfaces ")), area);
}
