use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, Command, View};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Map a key event to a command for the current app mode.
pub fn handle_key_event(app: &App, key: KeyEvent) -> Option<Command> {
    // If help is shown, any key closes it
    if app.show_help {
        return Some(Command::CloseHelp);
    }

    if app.input.is_some() {
        return handle_input_key(key);
    }

    if app.confirm_reset {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(Command::ConfirmReset),
            _ => Some(Command::CancelReset),
        };
    }

    let command = match key.code {
        KeyCode::Char('q') => Command::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,

        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                Command::PrevView
            } else {
                Command::NextView
            }
        }
        KeyCode::BackTab => Command::PrevView,
        KeyCode::Left | KeyCode::Char('h') => Command::PrevView,
        KeyCode::Right | KeyCode::Char('l') => Command::NextView,

        KeyCode::Char('1') => Command::SetView(View::Monitor),
        KeyCode::Char('2') => Command::SetView(View::Governor),
        KeyCode::Char('3') => Command::SetView(View::Status),
        KeyCode::Char('4') => Command::SetView(View::Policy),

        KeyCode::Up | KeyCode::Char('k') => Command::SelectPrev,
        KeyCode::Down | KeyCode::Char('j') => Command::SelectNext,

        // Interface on the monitor view, month on the governor view
        KeyCode::Char(']') | KeyCode::Char('n') => Command::NextSource,
        KeyCode::Char('[') | KeyCode::Char('p') => Command::PrevSource,

        KeyCode::Char('t') => Command::ToggleService,
        KeyCode::Char('r') => Command::Refresh,
        KeyCode::Char('?') => Command::ToggleHelp,
        KeyCode::Char('e') => Command::Export,

        // Policy editing
        KeyCode::Enter => Command::BeginEdit,
        KeyCode::Char('a') => Command::BeginAddUrl,
        KeyCode::Char('d') | KeyCode::Delete => Command::RemoveSelectedUrl,
        KeyCode::Char('Q') => Command::BeginDailyQuota,
        KeyCode::Char('s') => Command::SaveConfig,
        KeyCode::Char('R') => Command::RequestReset,

        _ => return None,
    };
    Some(command)
}

/// Keys while the text prompt is open
fn handle_input_key(key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Enter => Some(Command::SubmitInput),
        KeyCode::Esc => Some(Command::CancelInput),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Command::CancelInput)
        }
        KeyCode::Backspace => Some(Command::InputBackspace),
        KeyCode::Char(c) => Some(Command::InputChar(c)),
        _ => None,
    }
}

/// Map a mouse event to a command.
pub fn handle_mouse_event(app: &App, mouse: MouseEvent) -> Option<Command> {
    if app.input.is_some() || app.confirm_reset {
        return None;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => Some(Command::SelectPrev),
        MouseEventKind::ScrollDown => Some(Command::SelectNext),

        // Tabs sit on row 1, after the header
        MouseEventKind::Down(MouseButton::Left) if mouse.row == 1 => {
            tab_at(mouse.column).map(Command::SetView)
        }
        _ => None,
    }
}

/// Which tab a column falls in. Titles render as " N:Label " plus a
/// one-column divider.
fn tab_at(column: u16) -> Option<View> {
    let mut start = 0u16;
    for view in View::ALL {
        let width = view.label().len() as u16 + 5;
        if column < start + width {
            return Some(view);
        }
        start += width;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{InputState, Prompt};
    use crate::config::Settings;
    use crate::testing::FakeApi;
    use crate::ui::Theme;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn app() -> App {
        let api = Arc::new(FakeApi::new());
        App::new(api.clone(), api, &Settings::default(), Theme::dark())
    }

    #[tokio::test]
    async fn test_normal_mode_bindings() {
        let app = app();
        assert_eq!(handle_key_event(&app, key(KeyCode::Char('q'))), Some(Command::Quit));
        assert_eq!(
            handle_key_event(&app, key(KeyCode::Char('4'))),
            Some(Command::SetView(View::Policy))
        );
        assert_eq!(
            handle_key_event(&app, key(KeyCode::Char(']'))),
            Some(Command::NextSource)
        );
        assert_eq!(handle_key_event(&app, key(KeyCode::F(5))), None);
    }

    #[tokio::test]
    async fn test_help_swallows_keys() {
        let mut app = app();
        app.show_help = true;
        assert_eq!(
            handle_key_event(&app, key(KeyCode::Char('q'))),
            Some(Command::CloseHelp)
        );
    }

    #[tokio::test]
    async fn test_input_mode_captures_text() {
        let mut app = app();
        app.input = Some(InputState {
            prompt: Prompt::AddUrl,
            text: String::new(),
        });
        assert_eq!(
            handle_key_event(&app, key(KeyCode::Char('q'))),
            Some(Command::InputChar('q'))
        );
        assert_eq!(
            handle_key_event(&app, key(KeyCode::Esc)),
            Some(Command::CancelInput)
        );
        assert_eq!(
            handle_key_event(&app, key(KeyCode::Enter)),
            Some(Command::SubmitInput)
        );
    }

    #[tokio::test]
    async fn test_reset_confirmation_keys() {
        let mut app = app();
        app.confirm_reset = true;
        assert_eq!(
            handle_key_event(&app, key(KeyCode::Char('y'))),
            Some(Command::ConfirmReset)
        );
        assert_eq!(
            handle_key_event(&app, key(KeyCode::Char('q'))),
            Some(Command::CancelReset)
        );
    }

    #[test]
    fn test_tab_hit_testing() {
        assert_eq!(tab_at(0), Some(View::Monitor));
        assert_eq!(tab_at(11), Some(View::Monitor));
        assert_eq!(tab_at(12), Some(View::Governor));
        assert_eq!(tab_at(200), None);
    }
}
