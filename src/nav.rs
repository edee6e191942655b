//! Cursor and viewport over the visible part of a [`MenuTree`].
//!
//! Every operation reports the screen rows that must be repainted:
//! the whole viewport when the viewport moved or the visible list changed,
//! only the old and new cursor rows when just the cursor moved, nothing
//! otherwise.

use tracing::{debug, trace};
use unicode_width::UnicodeWidthChar;

use crate::error::{MenuError, NavError};
use crate::exec::Command;
use crate::menu::{MenuNode, MenuTree, NodeId};

/// One screen row to repaint. `text` is exactly `width` columns wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineUpdate {
    pub row: usize,
    pub is_cursor: bool,
    pub text: String,
}

/// Outcome of activating the item under the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// A submenu was toggled
    Redraw(Vec<LineUpdate>),
    /// A command entry with a non-empty command string
    Run { label: String, command: Command },
    /// Separator or empty command
    Idle,
}

#[derive(Debug)]
pub struct Navigator {
    tree: MenuTree,
    visible: Vec<NodeId>,
    cursor: usize,
    offset: usize,
    height: usize,
    width: usize,
    surface_width: usize,
}

impl Navigator {
    /// # Errors
    /// Returns [`MenuError::Empty`] if nothing of the tree is visible.
    pub fn new(tree: MenuTree) -> Result<Self, MenuError> {
        let visible: Vec<NodeId> = tree.flatten(true).collect();
        if visible.is_empty() {
            return Err(MenuError::Empty(tree.name().to_string()));
        }
        let width = tree.max_label_width();
        Ok(Self {
            tree,
            visible,
            cursor: 0,
            offset: 0,
            height: 1,
            width,
            surface_width: width,
        })
    }

    #[must_use]
    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    #[must_use]
    pub fn visible_items(&self) -> &[NodeId] {
        &self.visible
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn current_id(&self) -> NodeId {
        self.visible[self.cursor]
    }

    #[must_use]
    pub fn current_item(&self) -> &MenuNode {
        self.tree.node(self.current_id())
    }

    /// Adopts new surface dimensions. The width never exceeds the widest label
    /// of the tree. Always a full repaint.
    pub fn resize(&mut self, height: usize, width: usize) -> Vec<LineUpdate> {
        self.height = height.max(1);
        self.surface_width = width;
        self.width = width.min(self.tree.max_label_width());
        debug!(height = self.height, width = self.width, "viewport resized");
        self.place(self.cursor_target(), false, true)
    }

    /// Full repaint without moving, e.g. after the surface was handed to a
    /// child process.
    pub fn repaint(&mut self) -> Vec<LineUpdate> {
        self.place(self.cursor_target(), false, true)
    }

    /// Replaces the tree. Fold state, cursor and viewport start over.
    ///
    /// # Errors
    /// Returns [`MenuError::Empty`] if nothing of the new tree is visible; the
    /// current tree is kept in that case.
    pub fn reload(&mut self, tree: MenuTree) -> Result<Vec<LineUpdate>, MenuError> {
        let visible: Vec<NodeId> = tree.flatten(true).collect();
        if visible.is_empty() {
            return Err(MenuError::Empty(tree.name().to_string()));
        }
        self.width = self.surface_width.min(tree.max_label_width());
        self.tree = tree;
        self.visible = visible;
        self.cursor = 0;
        self.offset = 0;
        debug!(items = self.visible.len(), "menu reloaded");
        Ok(self.place(0, false, true))
    }

    pub fn move_relative(&mut self, delta: isize, wrap: bool) -> Vec<LineUpdate> {
        self.place(self.cursor_target().saturating_add(delta), wrap, false)
    }

    pub fn move_absolute(&mut self, index: usize) -> Vec<LineUpdate> {
        self.place(isize::try_from(index).unwrap_or(isize::MAX), false, false)
    }

    pub fn home(&mut self) -> Vec<LineUpdate> {
        self.move_absolute(0)
    }

    pub fn end(&mut self) -> Vec<LineUpdate> {
        self.move_absolute(self.visible.len() - 1)
    }

    pub fn half_page_down(&mut self) -> Vec<LineUpdate> {
        self.move_relative(self.half_page(), false)
    }

    pub fn half_page_up(&mut self) -> Vec<LineUpdate> {
        self.move_relative(-self.half_page(), false)
    }

    /// Moves to the closest preceding row that is shallower than the current
    /// one, or to the first row if there is none.
    pub fn move_to_parent(&mut self) -> Vec<LineUpdate> {
        let depth = self.current_item().depth();
        let mut index = self.cursor;
        while index > 0 && self.tree.node(self.visible[index]).depth() >= depth {
            index -= 1;
        }
        self.move_absolute(index)
    }

    pub fn fold_or_move_to_parent(&mut self) -> Vec<LineUpdate> {
        let id = self.current_id();
        match self.tree.submenu_mut(id) {
            Some(m) if m.is_unfolded() => {
                m.set_unfolded(false);
                self.refresh_visible()
            }
            _ => self.move_to_parent(),
        }
    }

    /// # Errors
    /// Returns [`NavError::NotFoldable`] if the current item is not a submenu.
    pub fn unfold(&mut self, recursive: bool) -> Result<Vec<LineUpdate>, NavError> {
        self.set_current_unfolded(true, recursive)
    }

    /// # Errors
    /// Returns [`NavError::NotFoldable`] if the current item is not a submenu.
    pub fn fold(&mut self, recursive: bool) -> Result<Vec<LineUpdate>, NavError> {
        self.set_current_unfolded(false, recursive)
    }

    /// # Errors
    /// Returns [`NavError::NotFoldable`] if the current item is not a submenu.
    pub fn toggle_fold(&mut self) -> Result<Vec<LineUpdate>, NavError> {
        let unfolded = !self.current_item().is_unfolded();
        self.set_current_unfolded(unfolded, false)
    }

    /// Enter on the current item: toggle a submenu, hand out a command.
    pub fn activate(&mut self) -> Activation {
        let id = self.current_id();
        if let Some(m) = self.tree.submenu_mut(id) {
            let unfolded = !m.is_unfolded();
            m.set_unfolded(unfolded);
            return Activation::Redraw(self.refresh_visible());
        }
        match self.tree.node(id) {
            MenuNode::Command(entry) if !entry.command().is_empty() => Activation::Run {
                label: entry.label().to_string(),
                command: entry.command().clone(),
            },
            _ => Activation::Idle,
        }
    }

    fn set_current_unfolded(
        &mut self,
        unfolded: bool,
        recursive: bool,
    ) -> Result<Vec<LineUpdate>, NavError> {
        let id = self.current_id();
        self.tree.set_unfolded(id, unfolded, recursive)?;
        debug!(unfolded, recursive, "fold state changed");
        Ok(self.refresh_visible())
    }

    /// Recomputes the visible list after a fold change. Always a full repaint.
    fn refresh_visible(&mut self) -> Vec<LineUpdate> {
        self.visible = self.tree.flatten(true).collect();
        debug!(items = self.visible.len(), "visible items recomputed");
        self.place(self.cursor_target(), false, true)
    }

    fn half_page(&self) -> isize {
        isize::try_from((self.height.saturating_sub(1) / 2).max(1)).unwrap_or(1)
    }

    fn cursor_target(&self) -> isize {
        isize::try_from(self.cursor).unwrap_or(isize::MAX)
    }

    /// Puts the cursor on `target` (wrapped or clamped into range), drags the
    /// viewport along and reports the rows to repaint.
    fn place(&mut self, target: isize, wrap: bool, full: bool) -> Vec<LineUpdate> {
        let (old_cursor, old_offset) = (self.cursor, self.offset);
        let last = self.visible.len() - 1;

        self.cursor = if target < 0 {
            if wrap { last } else { 0 }
        } else if target.unsigned_abs() > last {
            if wrap { 0 } else { last }
        } else {
            target.unsigned_abs()
        };

        if self.offset > self.cursor {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.height {
            self.offset = self.cursor + 1 - self.height;
        }
        trace!(cursor = self.cursor, offset = self.offset, "cursor placed");

        if full || self.offset != old_offset {
            self.viewport_lines()
        } else if self.cursor != old_cursor {
            vec![self.line(old_cursor), self.line(self.cursor)]
        } else {
            Vec::new()
        }
    }

    fn line(&self, index: usize) -> LineUpdate {
        let node = self.tree.node(self.visible[index]);
        LineUpdate {
            row: index - self.offset,
            is_cursor: index == self.cursor,
            text: fit(node.display_label(), self.width),
        }
    }

    fn viewport_lines(&self) -> Vec<LineUpdate> {
        (0..self.height)
            .map(|row| {
                let index = self.offset + row;
                if index < self.visible.len() {
                    self.line(index)
                } else {
                    LineUpdate {
                        row,
                        is_cursor: false,
                        text: " ".repeat(self.width),
                    }
                }
            })
            .collect()
    }
}

/// Pads or truncates `text` to exactly `width` terminal columns.
#[must_use]
pub fn fit(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.extend(std::iter::repeat_n(' ', width - used));
    out
}
