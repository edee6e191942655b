use anyhow::Result;
use ascm::theme::ThemeTokens;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::frame;
use crate::view::{Action, View};

pub const HELP_TEXT: &str = "\
Enter           toggle submenu or execute command       Space
Home            move cursor to top of list              g
End             move cursor to bottom of list           G
Cursor Left     close fold or move cursor one level     h
Cursor Right    open submenu                            l
Tab             open submenu recursively                L
Cursor Down/Up  move cursor down or up                  j/k
Page Down/Up    move cursor half a page down or up      d/u
F1              show keyboard overview (this screen)    ?
r               redraw screen
R               reload menu file
e               edit menu file
q               quit program

<Press Space to continue>";

/// Keyboard overview shown on top of the menu.
#[derive(Debug, Default)]
pub struct HelpScreen;

impl View for HelpScreen {
    fn render(&mut self, f: &mut Frame, area: Rect, _theme: &ThemeTokens) {
        let width = HELP_TEXT.lines().map(str::len).max().unwrap_or(0) + 4;
        let height = HELP_TEXT.lines().count() + 2;
        let rect = frame::centered_rect_fixed(
            u16::try_from(width).unwrap_or(u16::MAX),
            u16::try_from(height).unwrap_or(u16::MAX),
            area,
        );
        frame::render_modal(" Keyboard mapping ", HELP_TEXT, rect, f);
    }

    fn handle_event(&mut self, key: KeyEvent) -> Result<Action> {
        Ok(match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Action::CloseHelp,
            _ => Action::None,
        })
    }
}
