use anyhow::Result;
use ascm::exec::Command;
use ascm::theme::ThemeTokens;
use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};

/// What the event loop has to do after a screen consumed a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    ShowHelp,
    CloseHelp,
    Run { label: String, command: Command },
    Redraw,
    Reload,
    EditMenu,
}

/// Unified view interface for screens.
pub trait View {
    fn render(&mut self, f: &mut Frame, area: Rect, theme: &ThemeTokens);

    fn handle_event(&mut self, key: KeyEvent) -> Result<Action>;
}
