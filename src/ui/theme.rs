//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::app::Level;
use crate::data::status::ButtonVariant;
use crate::data::VisualClass;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Running service, success notifications.
    pub running: Color,
    /// Sleeping, out of window or over quota.
    pub sleeping: Color,
    /// Stopped service, errors.
    pub stopped: Color,
    /// Sent series on the throughput chart.
    pub sent: Color,
    /// Received series on the throughput chart.
    pub recv: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            running: Color::Green,
            sleeping: Color::Yellow,
            stopped: Color::Red,
            sent: Color::Magenta,
            recv: Color::LightBlue,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            running: Color::Green,
            sleeping: Color::Yellow,
            stopped: Color::Red,
            sent: Color::Magenta,
            recv: Color::Blue,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for a status badge
    pub fn status_style(&self, class: VisualClass) -> Style {
        match class {
            VisualClass::Running => Style::default().fg(self.running).add_modifier(Modifier::BOLD),
            VisualClass::Sleeping => Style::default().fg(self.sleeping),
            VisualClass::Stopped => Style::default().fg(self.stopped).add_modifier(Modifier::BOLD),
        }
    }

    /// Style for the start/stop control
    pub fn button_style(&self, variant: ButtonVariant) -> Style {
        let color = match variant {
            ButtonVariant::Danger => self.stopped,
            ButtonVariant::Success => self.running,
        };
        Style::default()
            .fg(Color::Black)
            .bg(color)
            .add_modifier(Modifier::BOLD)
    }

    pub fn level_style(&self, level: Level) -> Style {
        match level {
            Level::Info => Style::default().fg(self.highlight),
            Level::Success => Style::default().fg(self.running),
            Level::Error => Style::default().fg(self.stopped).add_modifier(Modifier::BOLD),
        }
    }
}
