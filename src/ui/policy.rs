//! Policy view: the editable fields followed by the URL list.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::panel;
use crate::app::App;
use crate::data::PolicyField;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::vertical([
        Constraint::Length(PolicyField::ALL.len() as u16 + 3),
        Constraint::Min(4),
    ])
    .split(area);

    render_fields(frame, app, rows[0]);
    render_urls(frame, app, rows[1]);
}

fn render_fields(frame: &mut Frame, app: &App, area: Rect) {
    let config = app.policy.config();

    let header = Row::new(vec![Cell::from("Setting"), Cell::from("Value")])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = PolicyField::ALL
        .iter()
        .map(|field| {
            Row::new(vec![
                Cell::from(field.label()),
                Cell::from(config.field_text(*field)),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(24), Constraint::Min(10)])
        .header(header)
        .block(panel(app, " Policy "))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▸ ");

    let mut state = TableState::default();
    state.select(app.selected_field().map(|_| app.policy_cursor));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_urls(frame: &mut Frame, app: &App, area: Rect) {
    let urls = app.policy.urls();

    let mut title = vec![Span::raw(format!(" URLs ({}) ", urls.len()))];
    if app.policy.is_diverged() {
        title.push(Span::styled(
            "not saved ",
            Style::default().fg(app.theme.sleeping),
        ));
    }
    let block = panel(app, Line::from(title));

    if urls.is_empty() {
        let empty = Paragraph::new(Span::styled(
            " No URLs. Press 'a' to add one.",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = urls.iter().map(|u| ListItem::new(u.as_str())).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(app.theme.selected)
        .highlight_symbol("▸ ");

    let mut state = ListState::default();
    state.select(app.selected_url());
    frame.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::data::PolicyConfig;
    use crate::testing::FakeApi;
    use crate::ui::Theme;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::sync::Arc;

    async fn app_with_url() -> App {
        let api = FakeApi::new();
        api.set_config(PolicyConfig {
            urls: vec!["https://mirror.test/a.iso".into()],
            ..Default::default()
        });
        let shared = Arc::new(api.clone());
        let mut app = App::new(shared.clone(), shared, &Settings::default(), Theme::dark());
        app.policy.load().await.unwrap();
        app
    }

    fn lines(app: &App) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render(frame, app, area);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect()
    }

    fn line_with<'a>(lines: &'a [String], needle: &str) -> &'a str {
        lines
            .iter()
            .find(|l| l.contains(needle))
            .map(String::as_str)
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_fields_and_urls_rendered() {
        let app = app_with_url().await;
        let text = lines(&app).concat();

        assert!(text.contains("Speed limit (Mbps)"));
        assert!(text.contains("23:59"));
        assert!(text.contains("https://mirror.test/a.iso"));
    }

    #[tokio::test]
    async fn test_cursor_highlights_one_row() {
        let mut app = app_with_url().await;

        app.policy_cursor = 2;
        let rendered = lines(&app);
        assert!(line_with(&rendered, "Daily quota max (GB)").contains('▸'));
        assert!(!line_with(&rendered, "Speed limit (Mbps)").contains('▸'));
        assert!(!line_with(&rendered, "https://mirror.test/a.iso").contains('▸'));

        app.policy_cursor = PolicyField::ALL.len();
        let rendered = lines(&app);
        assert!(line_with(&rendered, "https://mirror.test/a.iso").contains('▸'));
        assert!(PolicyField::ALL
            .iter()
            .all(|f| !line_with(&rendered, f.label()).contains('▸')));
    }
}
