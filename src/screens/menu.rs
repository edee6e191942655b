use anyhow::Result;
use ascm::nav::{Activation, LineUpdate, Navigator};
use ascm::theme::ThemeTokens;
use ascm::{MenuError, MenuTree};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::frame;
use crate::view::{Action, View};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ScreenLine {
    is_cursor: bool,
    text: String,
}

/// Draws the navigator's viewport. Rows are only rewritten when the engine
/// reports them as changed.
#[derive(Debug)]
pub struct MenuScreen {
    nav: Navigator,
    lines: Vec<ScreenLine>,
    area: Option<Rect>,
    wrap: bool,
}

impl MenuScreen {
    pub fn new(nav: Navigator, wrap: bool) -> Self {
        Self {
            nav,
            lines: Vec::new(),
            area: None,
            wrap,
        }
    }

    pub fn title(&self) -> &str {
        self.nav.tree().name()
    }

    /// Full repaint at the current size, after the terminal was given away.
    pub fn redraw(&mut self) {
        let updates = self.nav.repaint();
        self.apply(updates);
    }

    /// Swaps in a freshly loaded menu; folds, cursor and viewport start over.
    pub fn reload(&mut self, tree: MenuTree) -> Result<(), MenuError> {
        let updates = self.nav.reload(tree)?;
        self.lines.clear();
        self.apply(updates);
        Ok(())
    }

    fn fit_to(&mut self, inner: Rect) {
        if self.area == Some(inner) {
            return;
        }
        self.area = Some(inner);
        let updates = self
            .nav
            .resize(usize::from(inner.height), usize::from(inner.width));
        self.lines.clear();
        self.apply(updates);
    }

    fn apply(&mut self, updates: Vec<LineUpdate>) {
        for u in updates {
            if u.row >= self.lines.len() {
                self.lines.resize(u.row + 1, ScreenLine::default());
            }
            self.lines[u.row] = ScreenLine {
                is_cursor: u.is_cursor,
                text: u.text,
            };
        }
    }
}

impl View for MenuScreen {
    fn render(&mut self, f: &mut Frame, area: Rect, theme: &ThemeTokens) {
        let title = Span::styled(
            format!(" {} ", self.title()),
            Style::default().fg(theme.title),
        );
        let inner =
            frame::render_border_block(title, Style::default().fg(theme.border), area, f);
        self.fit_to(inner);

        let normal = Style::default().fg(theme.text_primary);
        let cursor = Style::default().fg(theme.selection_fg).bg(theme.selection_bg);
        let lines: Vec<Line> = self
            .lines
            .iter()
            .map(|l| {
                Line::from(Span::styled(
                    l.text.clone(),
                    if l.is_cursor { cursor } else { normal },
                ))
            })
            .collect();
        f.render_widget(Paragraph::new(lines), inner);
    }

    fn handle_event(&mut self, key: KeyEvent) -> Result<Action> {
        let is_submenu = self.nav.current_item().is_submenu();
        let action = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
            (KeyCode::Char('q'), _) => Action::Quit,

            (KeyCode::Enter, _) | (KeyCode::Char(' '), _) => match self.nav.activate() {
                Activation::Redraw(updates) => {
                    self.apply(updates);
                    Action::None
                }
                Activation::Run { label, command } => Action::Run { label, command },
                Activation::Idle => Action::None,
            },
            (KeyCode::Right, _) | (KeyCode::Char('l'), _) if is_submenu => {
                let updates = self.nav.unfold(false)?;
                self.apply(updates);
                Action::None
            }
            (KeyCode::Tab, _) | (KeyCode::Char('L'), _) if is_submenu => {
                let updates = self.nav.unfold(true)?;
                self.apply(updates);
                Action::None
            }
            (KeyCode::Left, _) | (KeyCode::Char('h'), _) => {
                let updates = self.nav.fold_or_move_to_parent();
                self.apply(updates);
                Action::None
            }

            (KeyCode::Home, _) | (KeyCode::Char('g'), _) => {
                let updates = self.nav.home();
                self.apply(updates);
                Action::None
            }
            (KeyCode::End, _) | (KeyCode::Char('G'), _) => {
                let updates = self.nav.end();
                self.apply(updates);
                Action::None
            }
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => {
                let updates = self.nav.move_relative(-1, self.wrap);
                self.apply(updates);
                Action::None
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => {
                let updates = self.nav.move_relative(1, self.wrap);
                self.apply(updates);
                Action::None
            }
            (KeyCode::PageUp, _) | (KeyCode::Char('u'), _) => {
                let updates = self.nav.half_page_up();
                self.apply(updates);
                Action::None
            }
            (KeyCode::PageDown, _) | (KeyCode::Char('d'), _) => {
                let updates = self.nav.half_page_down();
                self.apply(updates);
                Action::None
            }

            (KeyCode::F(1), _) | (KeyCode::Char('?'), _) => Action::ShowHelp,
            (KeyCode::Char('r'), _) => Action::Redraw,
            (KeyCode::Char('R'), _) => Action::Reload,
            (KeyCode::Char('e'), _) => Action::EditMenu,
            _ => Action::None,
        };
        Ok(action)
    }
}
