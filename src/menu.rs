//! Foldable menu tree.
//!
//! Nodes live in an arena indexed by [`NodeId`] in depth-first pre-order. The
//! root is implicit: it is always unfolded, has depth 0 and is never part of
//! a flattened listing. The only state that changes after construction is the
//! `unfolded` flag of submenus.

use std::slice;

use unicode_width::UnicodeWidthStr;

use crate::error::{MenuError, NavError};
use crate::exec::Command;

/// Index of a node inside its [`MenuTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A menu entry as delivered by a menu source, before it is placed in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Separator,
    Command { label: String, command: Command },
    Submenu { label: String, children: Vec<MenuEntry> },
}

impl MenuEntry {
    pub fn command(label: impl Into<String>, command: Command) -> Self {
        Self::Command {
            label: label.into(),
            command,
        }
    }

    pub fn submenu(label: impl Into<String>, children: Vec<MenuEntry>) -> Self {
        Self::Submenu {
            label: label.into(),
            children,
        }
    }
}

/// How display labels are derived from raw labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelStyle {
    /// Columns of indentation per nesting level below the top level
    pub indent_width: usize,
    pub submenu_suffix: String,
    pub separator_char: char,
    pub separator_width: usize,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            indent_width: 4,
            submenu_suffix: "...".to_string(),
            separator_char: '-',
            separator_width: 16,
        }
    }
}

impl LabelStyle {
    fn indent(&self, depth: usize) -> String {
        " ".repeat(self.indent_width * depth.saturating_sub(1))
    }

    fn separator(&self, depth: usize) -> String {
        let mut s = self.indent(depth);
        s.extend(std::iter::repeat_n(self.separator_char, self.separator_width));
        s
    }

    fn command(&self, label: &str, depth: usize) -> String {
        format!("{}{label}", self.indent(depth))
    }

    fn submenu(&self, label: &str, depth: usize) -> String {
        format!("{}{label}{}", self.indent(depth), self.submenu_suffix)
    }
}

#[derive(Debug, Clone)]
pub struct Separator {
    depth: usize,
    display: String,
}

#[derive(Debug, Clone)]
pub struct CommandEntry {
    label: String,
    depth: usize,
    display: String,
    command: Command,
}

impl CommandEntry {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Debug, Clone)]
pub struct Submenu {
    label: String,
    depth: usize,
    display: String,
    children: Vec<NodeId>,
    unfolded: bool,
}

impl Submenu {
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn is_unfolded(&self) -> bool {
        self.unfolded
    }

    pub fn set_unfolded(&mut self, unfolded: bool) {
        self.unfolded = unfolded;
    }
}

#[derive(Debug, Clone)]
pub enum MenuNode {
    Separator(Separator),
    Command(CommandEntry),
    Submenu(Submenu),
}

impl MenuNode {
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            MenuNode::Separator(s) => s.depth,
            MenuNode::Command(c) => c.depth,
            MenuNode::Submenu(m) => m.depth,
        }
    }

    /// Raw label; empty for separators.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            MenuNode::Separator(_) => "",
            MenuNode::Command(c) => &c.label,
            MenuNode::Submenu(m) => &m.label,
        }
    }

    /// Label with indentation and kind suffix, as drawn on screen.
    #[must_use]
    pub fn display_label(&self) -> &str {
        match self {
            MenuNode::Separator(s) => &s.display,
            MenuNode::Command(c) => &c.display,
            MenuNode::Submenu(m) => &m.display,
        }
    }

    #[must_use]
    pub fn is_submenu(&self) -> bool {
        matches!(self, MenuNode::Submenu(_))
    }

    /// True only for a submenu whose children are currently shown.
    #[must_use]
    pub fn is_unfolded(&self) -> bool {
        matches!(self, MenuNode::Submenu(m) if m.unfolded)
    }

    #[must_use]
    pub fn as_submenu(&self) -> Option<&Submenu> {
        match self {
            MenuNode::Submenu(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_command(&self) -> Option<&CommandEntry> {
        match self {
            MenuNode::Command(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MenuTree {
    name: String,
    nodes: Vec<MenuNode>,
    top: Vec<NodeId>,
    max_label_width: usize,
}

impl MenuTree {
    /// Builds a tree with every submenu folded.
    ///
    /// # Errors
    /// Returns [`MenuError::Empty`] for a menu without entries and
    /// [`MenuError::EmptySubmenu`] for a submenu without children.
    pub fn new(
        name: impl Into<String>,
        entries: Vec<MenuEntry>,
        style: &LabelStyle,
    ) -> Result<Self, MenuError> {
        let name = name.into();
        if entries.is_empty() {
            return Err(MenuError::Empty(name));
        }
        let mut nodes = Vec::new();
        let mut top = Vec::with_capacity(entries.len());
        for entry in entries {
            top.push(push_entry(&mut nodes, entry, 1, style)?);
        }
        let max_label_width = nodes
            .iter()
            .map(|n| n.display_label().width())
            .max()
            .unwrap_or(0);
        Ok(Self {
            name,
            nodes,
            top,
            max_label_width,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &MenuNode {
        &self.nodes[id.0]
    }

    /// Children of the implicit root.
    #[must_use]
    pub fn top_level(&self) -> &[NodeId] {
        &self.top
    }

    /// Number of nodes, root excluded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Widest display label across the whole tree, folded parts included.
    #[must_use]
    pub fn max_label_width(&self) -> usize {
        self.max_label_width
    }

    /// Depth-first pre-order walk. With `only_unfolded`, children of folded
    /// submenus are skipped. Every call starts a fresh walk.
    #[must_use]
    pub fn flatten(&self, only_unfolded: bool) -> Flatten<'_> {
        Flatten {
            tree: self,
            only_unfolded,
            stack: vec![self.top.iter()],
        }
    }

    /// The submenu at `id`, or `None` for separators and commands.
    pub fn submenu_mut(&mut self, id: NodeId) -> Option<&mut Submenu> {
        match &mut self.nodes[id.0] {
            MenuNode::Submenu(m) => Some(m),
            _ => None,
        }
    }

    /// Sets the fold flag of a submenu, and of all submenus below it when
    /// `recursive` is set.
    ///
    /// # Errors
    /// Returns [`NavError::NotFoldable`] if `id` is not a submenu.
    pub fn set_unfolded(
        &mut self,
        id: NodeId,
        unfolded: bool,
        recursive: bool,
    ) -> Result<(), NavError> {
        let children = match &mut self.nodes[id.0] {
            MenuNode::Submenu(m) => {
                m.unfolded = unfolded;
                if !recursive {
                    return Ok(());
                }
                m.children.clone()
            }
            other => {
                return Err(NavError::NotFoldable {
                    label: other.display_label().trim().to_string(),
                });
            }
        };
        let mut pending = children;
        while let Some(child) = pending.pop() {
            if let MenuNode::Submenu(m) = &mut self.nodes[child.0] {
                m.unfolded = unfolded;
                pending.extend_from_slice(&m.children);
            }
        }
        Ok(())
    }
}

fn push_entry(
    nodes: &mut Vec<MenuNode>,
    entry: MenuEntry,
    depth: usize,
    style: &LabelStyle,
) -> Result<NodeId, MenuError> {
    let id = NodeId(nodes.len());
    match entry {
        MenuEntry::Separator => nodes.push(MenuNode::Separator(Separator {
            depth,
            display: style.separator(depth),
        })),
        MenuEntry::Command { label, command } => nodes.push(MenuNode::Command(CommandEntry {
            display: style.command(&label, depth),
            label,
            depth,
            command,
        })),
        MenuEntry::Submenu { label, children } => {
            if children.is_empty() {
                return Err(MenuError::EmptySubmenu(label));
            }
            nodes.push(MenuNode::Submenu(Submenu {
                display: style.submenu(&label, depth),
                label,
                depth,
                children: Vec::new(),
                unfolded: false,
            }));
            let mut ids = Vec::with_capacity(children.len());
            for child in children {
                ids.push(push_entry(nodes, child, depth + 1, style)?);
            }
            if let MenuNode::Submenu(m) = &mut nodes[id.0] {
                m.children = ids;
            }
        }
    }
    Ok(id)
}

/// Iterator returned by [`MenuTree::flatten`].
#[derive(Debug, Clone)]
pub struct Flatten<'a> {
    tree: &'a MenuTree,
    only_unfolded: bool,
    stack: Vec<slice::Iter<'a, NodeId>>,
}

impl Iterator for Flatten<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let tree = self.tree;
        loop {
            let next = self.stack.last_mut()?.next().copied();
            match next {
                Some(id) => {
                    if let MenuNode::Submenu(m) = tree.node(id) {
                        if !self.only_unfolded || m.unfolded {
                            self.stack.push(m.children.iter());
                        }
                    }
                    return Some(id);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
