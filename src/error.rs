//! Error types for menu loading and menu navigation

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a menu. All of them are fatal to one load
/// attempt; the caller may retry with a fixed source.
#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Menu file {path}: cannot read file: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Menu file {path}, line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Menu file {path}: {message}")]
    Format { path: PathBuf, message: String },

    #[error("Menu '{0}' has no menu entries")]
    Empty(String),

    #[error("Submenu '{0}' has no entries")]
    EmptySubmenu(String),

    #[error("Command '{label}': {message}")]
    Command { label: String, message: String },

    #[error("Variable '{0}' itself contains a variable marker")]
    NestedVariable(String),
}

/// Caller bugs: operations issued against a node that cannot take them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    #[error("'{label}' is not a submenu and cannot be folded or unfolded")]
    NotFoldable { label: String },
}
