use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::exec::{CommandExecutor, RootMethod};
use crate::menu::LabelStyle;
use crate::menu_file::{LoadOptions, VAR_OPEN};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub root_method: RootMethod,
    #[serde(default = "default_submenu_suffix")]
    pub submenu_suffix: String,
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,
    #[serde(default = "default_separator_width")]
    pub separator_width: usize,
    /// Up/Down wrap around at either end of the menu
    #[serde(default = "default_true")]
    pub wrap: bool,
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default = "default_pager")]
    pub pager: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>, // "dark" or "light"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_overrides: Option<HashMap<String, String>>, // token->color overrides
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

fn default_submenu_suffix() -> String {
    "...".to_string()
}
fn default_indent_width() -> usize {
    4
}
fn default_separator_width() -> usize {
    16
}
fn default_true() -> bool {
    true
}
fn default_shell() -> String {
    "sh".to_string()
}
fn default_pager() -> String {
    "less".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_method: RootMethod::default(),
            submenu_suffix: default_submenu_suffix(),
            indent_width: default_indent_width(),
            separator_width: default_separator_width(),
            wrap: true,
            shell: default_shell(),
            pager: default_pager(),
            editor: None,
            theme: None,
            theme_overrides: None,
            variables: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    #[must_use]
    pub fn label_style(&self) -> LabelStyle {
        LabelStyle {
            indent_width: self.indent_width,
            submenu_suffix: self.submenu_suffix.clone(),
            separator_width: self.separator_width,
            ..LabelStyle::default()
        }
    }

    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            style: self.label_style(),
            variables: self.variables.clone(),
        }
    }

    #[must_use]
    pub fn executor(&self) -> CommandExecutor {
        let mut ex = CommandExecutor {
            root_method: self.root_method,
            shell: self.shell.clone(),
            pager: self.pager.clone(),
            ..CommandExecutor::default()
        };
        if let Some(editor) = self.editor.as_ref().filter(|e| !e.trim().is_empty()) {
            ex.editor = editor.clone();
        }
        ex
    }
}

/// `$HOME/.ascm/config.toml`
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".ascm").join("config.toml"))
}

/// Parses a config file; the format follows the extension, TOML otherwise.
///
/// # Errors
/// Returns error if the file cannot be read or parsed.
pub fn load_app_config_file(path: &Path) -> Result<AppConfig> {
    let s = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    let cfg = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
    {
        Some(ext) if ext == "yml" || ext == "yaml" => serde_yaml::from_str::<AppConfig>(&s)?,
        Some(ext) if ext == "json" => serde_json::from_str::<AppConfig>(&s)?,
        _ => toml::from_str::<AppConfig>(&s)?,
    };
    Ok(cfg)
}

/// An explicit path must load; the default location is optional.
///
/// # Errors
/// Returns error if a config file exists but cannot be parsed.
pub fn load_app_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_app_config_file(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => load_app_config_file(&path),
        _ => Ok(AppConfig::default()),
    }
}

pub fn validate_app_config(cfg: &AppConfig) -> (Vec<String>, Vec<String>) {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    for (name, value) in &cfg.variables {
        if name.is_empty() {
            errors.push("variables: names must not be empty".to_string());
        }
        if value.contains(VAR_OPEN) {
            errors.push(format!("variable '{name}' itself contains a variable marker"));
        }
    }

    if cfg.shell.trim().is_empty() {
        errors.push("shell must not be empty".to_string());
    }
    if cfg.pager.trim().is_empty() {
        warnings.push("pager is empty; commands of kind P will fail".to_string());
    }
    if cfg.indent_width == 0 {
        warnings.push("indent_width=0 hides the menu hierarchy".to_string());
    }
    if let Some(theme) = &cfg.theme {
        let t = theme.to_ascii_lowercase();
        if t != "dark" && t != "light" {
            warnings.push(format!("theme '{theme}' not in ['dark','light']"));
        }
    }

    (errors, warnings)
}

/// Writes `cfg` as TOML, creating parent directories.
///
/// # Errors
/// Returns error if serialization or writing fails.
pub fn save_app_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let s = toml::to_string_pretty(cfg)?;
    fs::write(path, s)?;
    Ok(())
}
