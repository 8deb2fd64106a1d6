//! Terminal UI rendering using ratatui.
//!
//! Each view is implemented in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`monitor`]: Interface throughput chart and counters
//! - [`governor`]: Service status, speed chart, monthly usage and log tail
//! - [`status`]: Compact summary cards
//! - [`policy`]: Policy form and URL list
//! - [`common`]: Shared components (header, tabs, status bar, help and prompts)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (monitor/governor/status/policy)     │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - common::render_prompt
//!    - common::render_confirm
//!    - common::render_help
//! ```

pub mod common;
pub mod governor;
pub mod monitor;
pub mod policy;
pub mod status;
pub mod theme;

pub use theme::Theme;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::Frame;

use crate::app::{App, View};

/// Minimum terminal size for a usable display.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 12;

/// Draw one full frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        common::render_too_small(frame, area);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(1), // Tabs
        Constraint::Min(8),    // Content
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_tabs(frame, app, chunks[1]);

    match app.current_view {
        View::Monitor => monitor::render(frame, app, chunks[2]),
        View::Governor => governor::render(frame, app, chunks[2]),
        View::Status => status::render(frame, app, chunks[2]),
        View::Policy => policy::render(frame, app, chunks[2]),
    }

    common::render_status_bar(frame, app, chunks[3]);

    if app.input.is_some() {
        common::render_prompt(frame, app, area);
    }
    if app.confirm_reset {
        common::render_confirm(frame, app, area);
    }
    if app.show_help {
        common::render_help(frame, app, area);
    }
}

/// Centered rectangle for overlays, clamped to `area`.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}
