//! Loading menus from disk.
//!
//! Two formats are understood. The text format is indentation based:
//!
//! ```text
//! # comment
//! My Menu
//! System
//!     Update      ||W sudo apt update
//!     ---
//!     Top         ||N htop
//! Browser         ||B firefox
//! ```
//!
//! `.toml`, `.yaml`/`.yml` and `.json` files hold the same tree as structured
//! data: a `name` and a `menu` list of entries with `label`, `cmd`,
//! `attribs`, `items` or `separator = true`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::MenuError;
use crate::exec::{Attribs, Command};
use crate::menu::{LabelStyle, MenuEntry, MenuTree};

const INDENT: usize = 4;
/// Opening marker of a `§{NAME}` variable reference.
pub const VAR_OPEN: &str = "§{";

/// Settings that shape a loaded menu.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub style: LabelStyle,
    /// Values for `§{NAME}` references in command strings
    pub variables: BTreeMap<String, String>,
}

/// A parsed menu file, not yet turned into a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSource {
    pub name: String,
    pub entries: Vec<MenuEntry>,
}

/// Reads, parses and builds the menu at `path`.
///
/// # Errors
/// Returns error if the file cannot be read, does not parse, or describes an
/// empty menu.
pub fn load_menu(path: &Path, opts: &LoadOptions) -> Result<MenuTree, MenuError> {
    let source = read_menu_source(path, opts)?;
    debug!(path = %path.display(), name = %source.name, "menu file parsed");
    MenuTree::new(source.name, source.entries, &opts.style)
}

/// # Errors
/// Returns error if the file cannot be read or does not parse.
pub fn read_menu_source(path: &Path, opts: &LoadOptions) -> Result<MenuSource, MenuError> {
    let contents = fs::read_to_string(path).map_err(|source| MenuError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let doc = match ext.as_deref() {
        Some("yaml" | "yml") => {
            serde_yaml::from_str::<MenuDoc>(&contents).map_err(|e| format_err(path, e))?
        }
        Some("toml") => toml::from_str::<MenuDoc>(&contents).map_err(|e| format_err(path, e))?,
        Some("json") => {
            serde_json::from_str::<MenuDoc>(&contents).map_err(|e| format_err(path, e))?
        }
        _ => return parse_text(path, &contents, &opts.variables),
    };
    doc.into_source(path, &opts.variables)
}

fn format_err(path: &Path, e: impl std::fmt::Display) -> MenuError {
    MenuError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Expands every `§{NAME}` in `text`.
///
/// # Errors
/// Returns [`MenuError::NestedVariable`] if a value itself contains a
/// variable marker.
pub fn expand_vars(text: &str, variables: &BTreeMap<String, String>) -> Result<String, MenuError> {
    let mut out = text.to_string();
    for (name, value) in variables {
        if value.contains(VAR_OPEN) {
            return Err(MenuError::NestedVariable(name.clone()));
        }
        out = out.replace(&format!("{VAR_OPEN}{name}}}"), value);
    }
    Ok(out)
}

#[derive(Debug)]
enum LineKind {
    Separator,
    Entry {
        label: String,
        command: Option<Command>,
    },
}

#[derive(Debug)]
struct FlatLine {
    line: usize,
    level: usize,
    kind: LineKind,
}

/// Parses the indentation based text format. `path` is only used in errors.
///
/// # Errors
/// Returns [`MenuError::Parse`] naming the offending line.
pub fn parse_text(
    path: &Path,
    contents: &str,
    variables: &BTreeMap<String, String>,
) -> Result<MenuSource, MenuError> {
    let err = |line: usize, message: &str| MenuError::Parse {
        path: path.to_path_buf(),
        line,
        message: message.to_string(),
    };

    let mut name: Option<String> = None;
    let mut flat: Vec<FlatLine> = Vec::new();
    let mut prev_level: Option<usize> = None;

    for (idx, raw) in contents.lines().enumerate() {
        let line_num = idx + 1;
        let trimmed = raw.trim();
        // only column-0 '#' starts a comment; indented '#' is part of a label
        if trimmed.is_empty() || raw.starts_with('#') {
            continue;
        }
        if name.is_none() {
            name = Some(trimmed.to_string());
            continue;
        }

        let body = raw.trim_start_matches(' ');
        if body.starts_with('\t') {
            return Err(err(line_num, "Tabs are not allowed in indentation"));
        }
        let spaces = raw.len() - body.len();
        if spaces % INDENT != 0 {
            return Err(err(line_num, "Indentation mismatch"));
        }
        let level = spaces / INDENT;
        if level > prev_level.map_or(0, |p| p + 1) {
            return Err(err(line_num, "Indentation error"));
        }

        let kind = if body.trim_end().len() >= 3 && body.trim_end().chars().all(|c| c == '-') {
            LineKind::Separator
        } else if let Some(pos) = body.find("||") {
            let label = body[..pos].trim().to_string();
            let rest = &body[pos + 2..];
            let Some(kind_char) = rest.chars().next() else {
                return Err(err(line_num, "No command kind given"));
            };
            let Some(attribs) = Attribs::from_kind(kind_char) else {
                return Err(err(line_num, "Invalid command kind given"));
            };
            let cmd_str = rest[kind_char.len_utf8()..].trim();
            if cmd_str.is_empty() {
                return Err(err(line_num, "Empty command"));
            }
            LineKind::Entry {
                label,
                command: Some(Command::new(expand_vars(cmd_str, variables)?, attribs)),
            }
        } else {
            LineKind::Entry {
                label: body.trim_end().to_string(),
                command: None,
            }
        };

        flat.push(FlatLine {
            line: line_num,
            level,
            kind,
        });
        prev_level = Some(level);
    }

    let name = name.unwrap_or_else(|| file_stem(path));
    if flat.is_empty() {
        return Err(MenuError::Empty(name));
    }
    let mut pos = 0;
    let entries = nest(path, &mut flat, &mut pos, 0)?;
    Ok(MenuSource { name, entries })
}

fn nest(
    path: &Path,
    flat: &mut [FlatLine],
    pos: &mut usize,
    level: usize,
) -> Result<Vec<MenuEntry>, MenuError> {
    let mut out = Vec::new();
    while *pos < flat.len() && flat[*pos].level == level {
        let index = *pos;
        *pos += 1;
        let has_children = *pos < flat.len() && flat[*pos].level > level;
        let line = flat[index].line;
        let kind = std::mem::replace(&mut flat[index].kind, LineKind::Separator);
        let entry = match (kind, has_children) {
            (LineKind::Separator, true) => {
                return Err(MenuError::Parse {
                    path: path.to_path_buf(),
                    line,
                    message: "Separator cannot have entries".to_string(),
                });
            }
            (LineKind::Separator, false) => MenuEntry::Separator,
            (LineKind::Entry { command: Some(_), .. }, true) => {
                return Err(MenuError::Parse {
                    path: path.to_path_buf(),
                    line,
                    message: "Simultaneous submenu and command".to_string(),
                });
            }
            (LineKind::Entry { label, command: None }, true) => {
                MenuEntry::submenu(label, nest(path, flat, pos, level + 1)?)
            }
            (LineKind::Entry { label, command }, false) => {
                MenuEntry::command(label, command.unwrap_or_default())
            }
        };
        out.push(entry);
    }
    Ok(out)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Menu".to_string())
}

#[derive(Debug, Deserialize)]
struct MenuDoc {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "items")]
    menu: Vec<EntryDoc>,
}

#[derive(Debug, Deserialize)]
struct EntryDoc {
    #[serde(default)]
    separator: bool,
    #[serde(default, alias = "name")]
    label: Option<String>,
    #[serde(default)]
    cmd: Option<String>,
    #[serde(default)]
    attribs: Option<String>,
    #[serde(default, alias = "children")]
    items: Vec<EntryDoc>,
}

impl MenuDoc {
    fn into_source(
        self,
        path: &Path,
        variables: &BTreeMap<String, String>,
    ) -> Result<MenuSource, MenuError> {
        let name = self.name.unwrap_or_else(|| file_stem(path));
        let entries = self
            .menu
            .into_iter()
            .map(|e| e.into_entry(path, variables))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MenuSource { name, entries })
    }
}

impl EntryDoc {
    fn into_entry(
        self,
        path: &Path,
        variables: &BTreeMap<String, String>,
    ) -> Result<MenuEntry, MenuError> {
        let fail = |label: &str, message: &str| MenuError::Format {
            path: PathBuf::from(path),
            message: format!("entry '{label}': {message}"),
        };

        if self.separator {
            if self.label.is_some() || self.cmd.is_some() || !self.items.is_empty() {
                return Err(fail("separator", "a separator takes no label, command or items"));
            }
            return Ok(MenuEntry::Separator);
        }
        let Some(label) = self.label else {
            return Err(fail("?", "missing label"));
        };
        let cmd = self.cmd.filter(|c| !c.trim().is_empty());

        if !self.items.is_empty() {
            if cmd.is_some() {
                return Err(fail(&label, "Simultaneous submenu and command"));
            }
            let children = self
                .items
                .into_iter()
                .map(|e| e.into_entry(path, variables))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(MenuEntry::submenu(label, children));
        }

        let command = match cmd {
            Some(cmd_str) => {
                let attribs = Attribs::parse(self.attribs.as_deref().unwrap_or("t"))
                    .map_err(|m| MenuError::Command {
                        label: label.clone(),
                        message: m,
                    })?;
                Command::new(expand_vars(&cmd_str, variables)?, attribs)
            }
            None => Command::default(),
        };
        Ok(MenuEntry::command(label, command))
    }
}
